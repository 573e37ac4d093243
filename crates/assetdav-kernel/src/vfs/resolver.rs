//! Path resolution from a folder asset to its children.

use assetdav_types::{join_path, Asset, AssetKind, AssetKindTag};

use super::context::DavContext;
use super::error::{DavError, DavResult};
use super::node::{FileNode, FolderNode, VirtualNode};

/// A child reference: a raw path segment from the client, or an asset the
/// repository already returned.
#[derive(Debug, Clone)]
pub enum ChildRef<'a> {
    Name(&'a str),
    Asset(Asset),
}

impl<'a> From<&'a str> for ChildRef<'a> {
    fn from(name: &'a str) -> Self {
        ChildRef::Name(name)
    }
}

impl<'a> From<&'a String> for ChildRef<'a> {
    fn from(name: &'a String) -> Self {
        ChildRef::Name(name.as_str())
    }
}

impl From<Asset> for ChildRef<'_> {
    fn from(asset: Asset) -> Self {
        ChildRef::Asset(asset)
    }
}

/// Last segment of a slash-separated name, ignoring trailing slashes.
pub fn basename(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Resolves children of a folder and projects assets into nodes.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'c> {
    ctx: &'c DavContext,
}

impl<'c> PathResolver<'c> {
    pub fn new(ctx: &'c DavContext) -> Self {
        Self { ctx }
    }

    /// Resolve `child` under `parent`.
    ///
    /// Names are reduced to their basename and sanitized with the
    /// repository's key rule before lookup.
    pub fn resolve(&self, parent: &Asset, child: ChildRef<'_>) -> DavResult<Asset> {
        let name = match child {
            ChildRef::Asset(asset) => return Ok(asset),
            ChildRef::Name(name) => name,
        };

        let repo = self.ctx.repo();
        let raw = basename(name);

        // File and folder keys differ only for over-long names; try both.
        let mut tried = Vec::with_capacity(2);
        for kind in [AssetKindTag::File, AssetKindTag::Folder] {
            let key = repo.sanitize_key(raw, kind)?;
            if tried.contains(&key) {
                continue;
            }
            let path = join_path(&parent.path, &key);
            if let Some(asset) = repo.find_by_path(&path)? {
                return Ok(asset);
            }
            tried.push(key);
        }

        Err(DavError::not_found(join_path(&parent.path, raw)))
    }

    /// Type dispatch: folders become folder nodes, everything else file nodes.
    pub fn into_node(&self, asset: Asset) -> VirtualNode<'c> {
        match asset.kind {
            AssetKind::Folder => VirtualNode::Folder(FolderNode::new(self.ctx, asset)),
            AssetKind::File(_) => VirtualNode::File(FileNode::new(self.ctx, asset)),
        }
    }

    /// Dispatch a listed child after checking it really belongs to `parent`.
    pub fn wrap_child(&self, parent: &Asset, asset: Asset) -> DavResult<VirtualNode<'c>> {
        if asset.parent_id != Some(parent.id) {
            return Err(DavError::invalid_asset(
                asset.id,
                format!("listed under {} but parent is {:?}", parent.id, asset.parent_id),
            ));
        }
        if asset.filename.is_empty() {
            return Err(DavError::invalid_asset(asset.id, "empty filename"));
        }
        let expected = join_path(&parent.path, &asset.filename);
        if asset.path != expected {
            return Err(DavError::invalid_asset(
                asset.id,
                format!("path {} does not match {}", asset.path, expected),
            ));
        }
        Ok(self.into_node(asset))
    }
}
