//! Asset filesystem facade.
//!
//! Exposes a repository of assets (folders and files) through the node
//! operations a hierarchical-filesystem protocol expects. Key components:
//!
//! - [`AssetRepository`] - Storage and policy backend, consumed as a trait
//! - [`PathResolver`] - Maps a path segment to an asset and a node variant
//! - [`FolderNode`] / [`FileNode`] - Node operations over one asset
//! - [`PermissionGate`] - Capability checks for an explicit principal
//! - [`StagingArea`] - Scoped temp files for uploads
//! - [`AssetTree`] - Absolute-path entry point, including moves
//!
//! ## Design Decisions
//!
//! - **No caching**: nodes are rebuilt per request; listings always go back
//!   to the repository, so permission changes take effect immediately.
//! - **Explicit principal**: the acting principal travels in
//!   [`DavContext`]; there is no ambient "current user".
//! - **Partial listings**: a child that cannot be projected into a node is
//!   logged and skipped. [`FolderNode::list_children_report`] exposes what was
//!   skipped.

pub mod backends;
mod context;
mod error;
mod gate;
mod key;
mod node;
mod repository;
mod resolver;
mod staging;
mod tree;

pub use backends::MemoryRepository;
pub use context::DavContext;
pub use error::{DavError, DavResult};
pub use gate::PermissionGate;
pub use key::{valid_key, MAX_KEY_LEN};
pub use node::{ChildListing, FileNode, FolderNode, SkippedChild, VirtualNode};
pub use repository::{AssetRepository, AssetSource, NewAsset};
pub use resolver::{basename, ChildRef, PathResolver};
pub use staging::{StagedFile, StagingArea, STAGING_PREFIX};
pub use tree::AssetTree;
