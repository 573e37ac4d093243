//! Path-addressed entry point over the node façade.
//!
//! The protocol layer hands over absolute paths; the tree walks them from the
//! root folder one segment at a time, so every hop goes through the same
//! resolver and permission checks as a direct `child` call.

use assetdav_types::Capability;

use super::context::DavContext;
use super::error::{DavError, DavResult};
use super::node::{FolderNode, VirtualNode};

/// Split an absolute path into its segments, skipping empty and `.` parts.
fn segments(path: &str) -> DavResult<Vec<&str>> {
    let mut out = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(DavError::validation(format!("{path}: '..' is not allowed"))),
            s => out.push(s),
        }
    }
    Ok(out)
}

/// Resolves absolute paths into nodes for one request.
#[derive(Debug, Clone, Copy)]
pub struct AssetTree<'c> {
    ctx: &'c DavContext,
}

impl<'c> AssetTree<'c> {
    pub fn new(ctx: &'c DavContext) -> Self {
        Self { ctx }
    }

    /// The root folder.
    pub fn root(&self) -> DavResult<FolderNode<'c>> {
        let root = self
            .ctx
            .repo()
            .find_by_path("/")?
            .ok_or_else(|| DavError::not_found("/"))?;
        self.ctx.resolver().into_node(root).into_folder()
    }

    /// Walk `path` from the root.
    pub fn node_for_path(&self, path: &str) -> DavResult<VirtualNode<'c>> {
        let mut node = VirtualNode::Folder(self.root()?);
        for segment in segments(path)? {
            node = node.into_folder()?.child(segment)?;
        }
        Ok(node)
    }

    /// Folder at `path`; `NotAFolder` if it is a file.
    pub fn folder_for_path(&self, path: &str) -> DavResult<FolderNode<'c>> {
        self.node_for_path(path)?.into_folder()
    }

    /// Move or rename the node at `src` to `dest`.
    ///
    /// Within one folder this is a rename and needs `rename` only. Across
    /// folders it also needs `create` on the destination folder.
    pub fn move_node(&self, src: &str, dest: &str) -> DavResult<VirtualNode<'c>> {
        let src_segments = segments(src)?;
        let dest_segments = segments(dest)?;
        let (Some(_), Some((dest_name, dest_parent))) =
            (src_segments.last(), dest_segments.split_last())
        else {
            return Err(DavError::validation("the root folder cannot be moved"));
        };

        let mut node = self.node_for_path(src)?;
        let target_folder = self.folder_for_path(&dest_parent.join("/"))?;

        if node.asset().parent_id == Some(target_folder.asset().id) {
            node.set_name(dest_name)?;
            return Ok(node);
        }

        let gate = self.ctx.gate();
        let asset = node.asset();
        gate.require(asset, Capability::Rename)?;
        gate.require(target_folder.asset(), Capability::Create)?;

        let target_path = &target_folder.asset().path;
        if target_folder.asset().id == asset.id || target_path.starts_with(&format!("{}/", asset.path)) {
            return Err(DavError::validation(format!(
                "cannot move {} into its own subtree",
                asset.path
            )));
        }

        let repo = self.ctx.repo();
        let mut moved = asset.clone();
        moved.parent_id = Some(target_folder.asset().id);
        moved.filename = repo.sanitize_key(dest_name, asset.kind.tag())?;
        moved.modified_by = self.ctx.principal().id;
        repo.save(&moved)?;

        let refreshed = repo
            .find_by_id(moved.id)?
            .ok_or_else(|| DavError::not_found(format!("asset {}", moved.id)))?;
        tracing::info!(
            principal = %self.ctx.principal().username,
            from = %asset.path,
            to = %refreshed.path,
            "moved asset"
        );
        Ok(self.ctx.resolver().into_node(refreshed))
    }
}
