//! Folder and file nodes: assets projected into filesystem-node shape.
//!
//! Nodes are built per request from whatever the repository returns and
//! carry no state of their own beyond that asset snapshot. Children are
//! re-read from the repository on every listing.

use std::io::Read;
use std::time::SystemTime;

use assetdav_types::{Asset, AssetId, AssetKindTag, Capability};

use super::context::DavContext;
use super::error::{DavError, DavResult};
use super::repository::NewAsset;
use super::resolver::ChildRef;

/// Operations shared by folders and files.
#[derive(Debug, Clone)]
struct NodeCore<'c> {
    ctx: &'c DavContext,
    asset: Asset,
}

impl<'c> NodeCore<'c> {
    fn delete(&self) -> DavResult<()> {
        self.ctx.gate().require(&self.asset, Capability::Delete)?;
        self.ctx.repo().delete(self.asset.id)?;
        tracing::info!(
            principal = %self.ctx.principal().username,
            path = %self.asset.path,
            kind = %self.asset.kind.tag(),
            "deleted asset"
        );
        Ok(())
    }

    fn set_name(&mut self, name: &str) -> DavResult<()> {
        self.ctx.gate().require(&self.asset, Capability::Rename)?;
        if self.asset.is_root() {
            return Err(DavError::validation("the root folder cannot be renamed"));
        }

        let key = self.ctx.repo().sanitize_key(name, self.asset.kind.tag())?;
        let mut renamed = self.asset.clone();
        renamed.filename = key;
        renamed.modified_by = self.ctx.principal().id;
        self.ctx.repo().save(&renamed)?;

        let refreshed = self.refetch(self.asset.id)?;
        let previous = std::mem::replace(&mut self.asset, refreshed);
        tracing::info!(
            principal = %self.ctx.principal().username,
            from = %previous.path,
            to = %self.asset.path,
            "renamed asset"
        );
        Ok(())
    }

    fn refetch(&self, id: AssetId) -> DavResult<Asset> {
        self.ctx
            .repo()
            .find_by_id(id)?
            .ok_or_else(|| DavError::not_found(format!("asset {id}")))
    }
}

// ============================================================================
// Folder
// ============================================================================

/// A folder asset.
#[derive(Debug, Clone)]
pub struct FolderNode<'c> {
    core: NodeCore<'c>,
}

/// A listed child that could not be turned into a node.
#[derive(Debug)]
pub struct SkippedChild {
    pub id: AssetId,
    pub error: DavError,
}

/// Result of a folder listing, including the children that were skipped.
#[derive(Debug, Default)]
pub struct ChildListing<'c> {
    pub nodes: Vec<VirtualNode<'c>>,
    pub skipped: Vec<SkippedChild>,
}

impl ChildListing<'_> {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

impl<'c> FolderNode<'c> {
    pub(crate) fn new(ctx: &'c DavContext, asset: Asset) -> Self {
        debug_assert!(asset.is_folder());
        Self {
            core: NodeCore { ctx, asset },
        }
    }

    pub fn asset(&self) -> &Asset {
        &self.core.asset
    }

    pub fn name(&self) -> &str {
        &self.core.asset.filename
    }

    pub fn last_modified(&self) -> SystemTime {
        self.core.asset.modification_date
    }

    /// Children visible to the principal.
    ///
    /// A child that fails to project into a node is logged and left out;
    /// one broken child never fails the whole listing.
    pub fn list_children(&self) -> DavResult<Vec<VirtualNode<'c>>> {
        Ok(self.list_children_report()?.nodes)
    }

    /// Like [`list_children`](Self::list_children), but also reports which
    /// children were skipped and why.
    pub fn list_children_report(&self) -> DavResult<ChildListing<'c>> {
        let ctx = self.core.ctx;
        let children = ctx
            .repo()
            .find_by_parent_and_filter(self.core.asset.id, ctx.principal())?;

        let resolver = ctx.resolver();
        let mut listing = ChildListing::default();
        for child in children {
            let id = child.id;
            match resolver.wrap_child(&self.core.asset, child) {
                Ok(node) => listing.nodes.push(node),
                Err(error) => {
                    tracing::warn!(
                        folder = %self.core.asset.path,
                        child = %id,
                        %error,
                        "skipping child in listing"
                    );
                    listing.skipped.push(SkippedChild { id, error });
                }
            }
        }
        Ok(listing)
    }

    /// Resolve a child by name or by asset.
    pub fn child<'a>(&self, child: impl Into<ChildRef<'a>>) -> DavResult<VirtualNode<'c>> {
        let resolver = self.core.ctx.resolver();
        let asset = resolver.resolve(&self.core.asset, child.into())?;
        Ok(resolver.into_node(asset))
    }

    /// Create a file from `content`.
    ///
    /// The content is staged to a temp file that the repository ingests by
    /// path; the temp file is gone when this returns, whatever the outcome.
    pub fn create_file(&self, name: &str, content: &mut dyn Read) -> DavResult<()> {
        let ctx = self.core.ctx;
        ctx.gate().require(&self.core.asset, Capability::Create)?;
        let key = ctx.repo().sanitize_key(name, AssetKindTag::File)?;

        let staged = ctx.staging().stage(content)?;
        let created = ctx.repo().create(
            self.core.asset.id,
            NewAsset::file(key, staged.path(), ctx.principal()),
        );
        staged.discard();

        let created = created?;
        tracing::info!(
            principal = %ctx.principal().username,
            path = %created.path,
            size = created.kind.file_meta().map(|m| m.size).unwrap_or(0),
            "created file"
        );
        Ok(())
    }

    /// Create a subfolder.
    pub fn create_directory(&self, name: &str) -> DavResult<()> {
        let ctx = self.core.ctx;
        ctx.gate().require(&self.core.asset, Capability::Create)?;
        let key = ctx.repo().sanitize_key(name, AssetKindTag::Folder)?;

        let created = ctx
            .repo()
            .create(self.core.asset.id, NewAsset::folder(key, ctx.principal()))?;
        tracing::info!(
            principal = %ctx.principal().username,
            path = %created.path,
            "created folder"
        );
        Ok(())
    }

    /// Delete this folder and, through the repository, everything below it.
    pub fn delete(&self) -> DavResult<()> {
        self.core.delete()
    }

    /// Rename in place; returns the renamed node for chaining.
    pub fn set_name(&mut self, name: &str) -> DavResult<&mut Self> {
        self.core.set_name(name)?;
        Ok(self)
    }
}

// ============================================================================
// File
// ============================================================================

/// A file asset.
#[derive(Debug, Clone)]
pub struct FileNode<'c> {
    core: NodeCore<'c>,
}

impl<'c> FileNode<'c> {
    pub(crate) fn new(ctx: &'c DavContext, asset: Asset) -> Self {
        debug_assert!(asset.is_file());
        Self {
            core: NodeCore { ctx, asset },
        }
    }

    pub fn asset(&self) -> &Asset {
        &self.core.asset
    }

    pub fn name(&self) -> &str {
        &self.core.asset.filename
    }

    pub fn last_modified(&self) -> SystemTime {
        self.core.asset.modification_date
    }

    pub fn size(&self) -> u64 {
        self.core.asset.kind.file_meta().map(|m| m.size).unwrap_or(0)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.core.asset.kind.file_meta().map(|m| m.mime_type.as_str())
    }

    /// Quoted entity tag: `"<id>-<revision>-<mtime secs>-<size>"`.
    ///
    /// The revision moves on every content write, so two same-length writes
    /// within one second still get distinct tags.
    pub fn etag(&self) -> String {
        let asset = &self.core.asset;
        let revision = asset.kind.file_meta().map(|m| m.revision).unwrap_or(0);
        format!(
            "\"{}-{}-{}-{}\"",
            asset.id,
            revision,
            asset.modification_secs(),
            self.size()
        )
    }

    /// Read the whole content. Requires `view`.
    pub fn get(&self) -> DavResult<Vec<u8>> {
        let ctx = self.core.ctx;
        ctx.gate().require(&self.core.asset, Capability::View)?;
        ctx.repo().read_content(self.core.asset.id)
    }

    /// Replace the content. Requires `publish`.
    pub fn put(&mut self, content: &mut dyn Read) -> DavResult<()> {
        let ctx = self.core.ctx;
        ctx.gate().require(&self.core.asset, Capability::Publish)?;

        let staged = ctx.staging().stage(content)?;
        let updated = ctx
            .repo()
            .replace_content(self.core.asset.id, staged.path(), ctx.principal().id);
        staged.discard();

        self.core.asset = updated?;
        tracing::info!(
            principal = %ctx.principal().username,
            path = %self.core.asset.path,
            size = self.size(),
            "replaced file content"
        );
        Ok(())
    }

    pub fn delete(&self) -> DavResult<()> {
        self.core.delete()
    }

    /// Rename in place; returns the renamed node for chaining.
    pub fn set_name(&mut self, name: &str) -> DavResult<&mut Self> {
        self.core.set_name(name)?;
        Ok(self)
    }
}

// ============================================================================
// Either
// ============================================================================

/// A node of either kind.
#[derive(Debug, Clone)]
pub enum VirtualNode<'c> {
    Folder(FolderNode<'c>),
    File(FileNode<'c>),
}

impl<'c> VirtualNode<'c> {
    pub fn asset(&self) -> &Asset {
        match self {
            VirtualNode::Folder(n) => n.asset(),
            VirtualNode::File(n) => n.asset(),
        }
    }

    pub fn name(&self) -> &str {
        &self.asset().filename
    }

    pub fn last_modified(&self) -> SystemTime {
        self.asset().modification_date
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, VirtualNode::Folder(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, VirtualNode::File(_))
    }

    pub fn delete(&self) -> DavResult<()> {
        match self {
            VirtualNode::Folder(n) => n.delete(),
            VirtualNode::File(n) => n.delete(),
        }
    }

    pub fn set_name(&mut self, name: &str) -> DavResult<&mut Self> {
        match self {
            VirtualNode::Folder(n) => {
                n.set_name(name)?;
            }
            VirtualNode::File(n) => {
                n.set_name(name)?;
            }
        }
        Ok(self)
    }

    pub fn as_folder(&self) -> Option<&FolderNode<'c>> {
        match self {
            VirtualNode::Folder(n) => Some(n),
            VirtualNode::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode<'c>> {
        match self {
            VirtualNode::File(n) => Some(n),
            VirtualNode::Folder(_) => None,
        }
    }

    pub fn into_folder(self) -> DavResult<FolderNode<'c>> {
        match self {
            VirtualNode::Folder(n) => Ok(n),
            VirtualNode::File(n) => Err(DavError::not_a_folder(n.asset().path.clone())),
        }
    }

    pub fn into_file(self) -> DavResult<FileNode<'c>> {
        match self {
            VirtualNode::File(n) => Ok(n),
            VirtualNode::Folder(n) => Err(DavError::validation(format!(
                "{} is a folder",
                n.asset().path
            ))),
        }
    }
}
