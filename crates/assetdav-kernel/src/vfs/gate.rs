//! Permission gate.

use assetdav_types::{Asset, Capability, Principal};

use super::error::{DavError, DavResult};
use super::repository::AssetRepository;

/// Checks capabilities for one principal against the repository's policy.
///
/// Mutations call [`require`](Self::require) before touching the repository;
/// read paths use [`is_allowed`](Self::is_allowed) to filter.
#[derive(Clone, Copy)]
pub struct PermissionGate<'c> {
    repo: &'c dyn AssetRepository,
    principal: &'c Principal,
}

impl<'c> PermissionGate<'c> {
    pub fn new(repo: &'c dyn AssetRepository, principal: &'c Principal) -> Self {
        Self { repo, principal }
    }

    pub fn principal(&self) -> &'c Principal {
        self.principal
    }

    pub fn is_allowed(&self, asset: &Asset, capability: Capability) -> bool {
        self.repo.is_allowed(asset, capability, self.principal)
    }

    /// Fail with `Forbidden` unless the capability is held.
    pub fn require(&self, asset: &Asset, capability: Capability) -> DavResult<()> {
        if self.is_allowed(asset, capability) {
            return Ok(());
        }
        tracing::debug!(
            principal = %self.principal.username,
            path = %asset.path,
            %capability,
            "capability denied"
        );
        Err(DavError::forbidden(capability, asset.path.clone()))
    }
}

impl std::fmt::Debug for PermissionGate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("principal", &self.principal.username)
            .finish()
    }
}
