//! # assetdav-kernel
//!
//! Virtual filesystem facade over a repository of managed assets.
//!
//! A protocol layer (WebDAV or similar) resolves a path through
//! [`AssetTree`], gets back a [`VirtualNode`], and calls node operations on
//! it. Every mutation is checked against the request's [`Principal`] first,
//! and every durable change is delegated to the [`AssetRepository`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use assetdav_kernel::{DavContext, MemoryRepository};
//! use assetdav_types::{Capability, Principal};
//!
//! let repo = Arc::new(MemoryRepository::new());
//! let amy = Principal::named("amy", "Amy");
//! repo.grant(amy.id, "/", [Capability::View, Capability::Create]);
//!
//! let ctx = DavContext::new(repo, amy);
//! let root = ctx.tree().root()?;
//! root.create_directory("photos")?;
//! for child in root.list_children()? {
//!     println!("{}", child.name());
//! }
//! # Ok::<(), assetdav_kernel::DavError>(())
//! ```
//!
//! [`Principal`]: assetdav_types::Principal

pub mod vfs;

pub use vfs::{
    backends::{MemoryRepository, RepositorySnapshot},
    AssetRepository, AssetSource, AssetTree, ChildListing, ChildRef, DavContext, DavError,
    DavResult, FileNode, FolderNode, NewAsset, PathResolver, PermissionGate, SkippedChild,
    StagingArea, VirtualNode,
};
