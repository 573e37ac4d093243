//! Asset entity and its persisted projection.
//!
//! An [`Asset`] is what the repository hands out: it carries the derived
//! absolute `path` alongside the stored fields. [`AssetRecord`] is the
//! whitelist of fields a repository persists; `path` is never stored because
//! it is a function of the parent chain and would go stale on rename.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants, EnumString};

use crate::ids::{AssetId, PrincipalId};

/// File-specific metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Content length in bytes.
    pub size: u64,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Content revision, starting at 1 and bumped on every content write.
    #[serde(default = "FileMeta::first_revision")]
    pub revision: u64,
}

impl FileMeta {
    pub fn new(size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            size,
            mime_type: mime_type.into(),
            revision: Self::first_revision(),
        }
    }

    fn first_revision() -> u64 {
        1
    }

    /// Record a content write of `size` bytes.
    pub fn bump(&mut self, size: u64) {
        self.size = size;
        self.revision += 1;
    }
}

/// Folder or file, with the payload that only files carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum_discriminants(name(AssetKindTag))]
#[strum_discriminants(derive(Hash, Display, EnumString))]
#[strum_discriminants(strum(serialize_all = "snake_case"))]
pub enum AssetKind {
    Folder,
    File(FileMeta),
}

impl AssetKind {
    pub fn tag(&self) -> AssetKindTag {
        AssetKindTag::from(self)
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, AssetKind::Folder)
    }

    pub fn is_file(&self) -> bool {
        matches!(self, AssetKind::File(_))
    }

    pub fn file_meta(&self) -> Option<&FileMeta> {
        match self {
            AssetKind::File(meta) => Some(meta),
            AssetKind::Folder => None,
        }
    }
}

/// A managed file or folder as seen through a repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub id: AssetId,
    /// `None` only for the root folder.
    pub parent_id: Option<AssetId>,
    /// Absolute slash-separated path; the root is `/`.
    pub path: String,
    /// Last path segment; empty for the root.
    pub filename: String,
    pub kind: AssetKind,
    pub creation_date: SystemTime,
    pub modification_date: SystemTime,
    pub owner: PrincipalId,
    pub modified_by: PrincipalId,
}

impl Asset {
    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Modification date as whole seconds since the Unix epoch.
    pub fn modification_secs(&self) -> u64 {
        self.modification_date
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Project onto the persisted field set.
    pub fn to_record(&self) -> AssetRecord {
        AssetRecord {
            id: self.id,
            parent_id: self.parent_id,
            filename: self.filename.clone(),
            kind: self.kind.clone(),
            creation_date: self.creation_date,
            modification_date: self.modification_date,
            owner: self.owner,
            modified_by: self.modified_by,
        }
    }

    /// Rebuild an asset from its record and the path derived by the repository.
    pub fn from_record(record: AssetRecord, path: impl Into<String>) -> Self {
        Self {
            id: record.id,
            parent_id: record.parent_id,
            path: path.into(),
            filename: record.filename,
            kind: record.kind,
            creation_date: record.creation_date,
            modification_date: record.modification_date,
            owner: record.owner,
            modified_by: record.modified_by,
        }
    }
}

/// Persisted fields of an asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AssetId>,
    pub filename: String,
    pub kind: AssetKind,
    pub creation_date: SystemTime,
    pub modification_date: SystemTime,
    pub owner: PrincipalId,
    pub modified_by: PrincipalId,
}

/// Join a parent path and a child key, collapsing the root to the empty string.
pub fn join_path(parent: &str, key: &str) -> String {
    let parent = parent.trim_end_matches('/');
    format!("{parent}/{key}")
}
