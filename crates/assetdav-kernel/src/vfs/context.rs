//! Per-request context.

use std::sync::Arc;

use assetdav_types::Principal;

use super::gate::PermissionGate;
use super::repository::AssetRepository;
use super::resolver::PathResolver;
use super::staging::StagingArea;
use super::tree::AssetTree;

/// Everything a request needs: the repository, who is asking, and where
/// uploads are staged.
///
/// Nodes borrow the context, so they cannot outlive the request that built
/// them.
#[derive(Clone)]
pub struct DavContext {
    repo: Arc<dyn AssetRepository>,
    principal: Principal,
    staging: StagingArea,
}

impl DavContext {
    /// Stage uploads in the system temp directory.
    pub fn new(repo: Arc<dyn AssetRepository>, principal: Principal) -> Self {
        Self::with_staging(repo, principal, StagingArea::default())
    }

    pub fn with_staging(
        repo: Arc<dyn AssetRepository>,
        principal: Principal,
        staging: StagingArea,
    ) -> Self {
        Self {
            repo,
            principal,
            staging,
        }
    }

    pub fn repo(&self) -> &dyn AssetRepository {
        self.repo.as_ref()
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn gate(&self) -> PermissionGate<'_> {
        PermissionGate::new(self.repo.as_ref(), &self.principal)
    }

    pub fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(self)
    }

    /// Path-addressed entry point for the protocol layer.
    pub fn tree(&self) -> AssetTree<'_> {
        AssetTree::new(self)
    }
}

impl std::fmt::Debug for DavContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DavContext")
            .field("principal", &self.principal.username)
            .field("staging", &self.staging.dir())
            .finish()
    }
}
