//! Asset repository trait.
//!
//! The repository owns every durable fact about assets: lookup, persistence,
//! naming rules and permissions. The facade never caches what it reads from
//! here; each call goes back to the repository.

use std::path::{Path, PathBuf};

use assetdav_types::{Asset, AssetId, AssetKindTag, Capability, Principal, PrincipalId};

use super::error::DavResult;
use super::key::valid_key;

/// What a new asset is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Folder,
    /// A file whose bytes are read from `path` during `create`.
    File { path: PathBuf },
}

impl AssetSource {
    pub fn tag(&self) -> AssetKindTag {
        match self {
            AssetSource::Folder => AssetKindTag::Folder,
            AssetSource::File { .. } => AssetKindTag::File,
        }
    }
}

/// Attributes for [`AssetRepository::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    /// Already-sanitized key.
    pub filename: String,
    pub source: AssetSource,
    pub owner: PrincipalId,
    pub modified_by: PrincipalId,
}

impl NewAsset {
    /// A folder owned and last modified by `principal`.
    pub fn folder(filename: impl Into<String>, principal: &Principal) -> Self {
        Self {
            filename: filename.into(),
            source: AssetSource::Folder,
            owner: principal.id,
            modified_by: principal.id,
        }
    }

    /// A file owned and last modified by `principal`, content read from `path`.
    pub fn file(filename: impl Into<String>, path: impl Into<PathBuf>, principal: &Principal) -> Self {
        Self {
            filename: filename.into(),
            source: AssetSource::File { path: path.into() },
            owner: principal.id,
            modified_by: principal.id,
        }
    }
}

/// Storage and policy backend for assets.
///
/// Implementations must be safe to share between requests; the facade holds
/// them behind `Arc<dyn AssetRepository>`.
pub trait AssetRepository: Send + Sync {
    // ========================================================================
    // Lookup
    // ========================================================================

    /// Fetch an asset by id.
    fn find_by_id(&self, id: AssetId) -> DavResult<Option<Asset>>;

    /// Fetch an asset by absolute path (`/` is the root).
    fn find_by_path(&self, path: &str) -> DavResult<Option<Asset>>;

    /// Children of `parent_id` that `principal` may see.
    fn find_by_parent_and_filter(
        &self,
        parent_id: AssetId,
        principal: &Principal,
    ) -> DavResult<Vec<Asset>>;

    /// Full content of a file asset.
    fn read_content(&self, id: AssetId) -> DavResult<Vec<u8>>;

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Create a child of `parent_id`.
    fn create(&self, parent_id: AssetId, attrs: NewAsset) -> DavResult<Asset>;

    /// Remove an asset; folders take their whole subtree with them.
    fn delete(&self, id: AssetId) -> DavResult<()>;

    /// Persist filename, parent and modifier changes of an existing asset.
    fn save(&self, asset: &Asset) -> DavResult<()>;

    /// Replace file content with the bytes at `source`.
    fn replace_content(
        &self,
        id: AssetId,
        source: &Path,
        modified_by: PrincipalId,
    ) -> DavResult<Asset>;

    // ========================================================================
    // Policy
    // ========================================================================

    /// Map a raw name to a repository-valid key.
    fn sanitize_key(&self, raw: &str, kind: AssetKindTag) -> DavResult<String> {
        valid_key(raw, kind)
    }

    /// Whether `principal` holds `capability` on `asset`.
    fn is_allowed(&self, asset: &Asset, capability: Capability, principal: &Principal) -> bool;
}
