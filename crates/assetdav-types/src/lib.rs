//! Shared identity and asset types for assetdav.
//!
//! A pure leaf crate: typed ids, principals and capabilities, and the asset
//! entity with its persisted projection. No filesystem or repository logic
//! lives here.
//!
//! # Key Types
//!
//! |------------------|----------------------------------------------|
//! | Type             | Purpose                                      |
//! |------------------|----------------------------------------------|
//! | [`Asset`]        | File or folder as handed out by a repository |
//! | [`AssetKind`]    | Folder, or file with its metadata            |
//! | [`AssetRecord`]  | Persisted field whitelist of an asset        |
//! | [`Principal`]    | The actor a request runs as                  |
//! | [`Capability`]   | Permission checked before a mutation         |
//! | [`AssetId`]      | Repository-assigned asset id                 |
//! | [`PrincipalId`]  | Who (user or system)                         |
//! |------------------|----------------------------------------------|

pub mod asset;
pub mod ids;
pub mod principal;

pub use asset::{join_path, Asset, AssetKind, AssetKindTag, AssetRecord, FileMeta};
pub use ids::{AssetId, PrincipalId};
pub use principal::{Capability, Principal};
