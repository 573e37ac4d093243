//! Principal and capability types.
//!
//! A `Principal` is the authenticated actor behind a request. It is passed
//! explicitly into every permission check; nothing in assetdav looks up a
//! "current user" from ambient state.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::ids::PrincipalId;

/// An entity that can act on assets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    /// Short handle used for config and logs: "amy", "system".
    pub username: String,
    pub display_name: String,
}

impl Principal {
    /// Create a principal whose id is derived from the username.
    pub fn named(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id: PrincipalId::from_username(&username),
            username,
            display_name: display_name.into(),
        }
    }

    /// Create the well-known system principal.
    pub fn system() -> Self {
        Self {
            id: PrincipalId::system(),
            username: "system".into(),
            display_name: "System".into(),
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.username, self.display_name)
    }
}

/// A named permission checked against a principal and an asset.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// See the asset in listings and read its content.
    View,
    /// Create children inside a folder.
    Create,
    /// Remove the asset (and, for folders, its subtree).
    Delete,
    /// Change the filename or parent of the asset.
    Rename,
    /// Replace the content of a file.
    Publish,
}
