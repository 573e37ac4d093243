//! Typed identifiers for assets and principals.
//!
//! `AssetId` is a repository-assigned integer: the root folder is always `1`
//! and ids are never reused within a repository. `PrincipalId` wraps a UUID;
//! fresh principals get a UUIDv7, while principals named in configuration
//! derive a stable UUIDv5 from their username so ownership survives restarts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An asset identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    /// The root folder of every repository.
    pub const ROOT: AssetId = AssetId(1);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }

    /// The id following this one, for sequential allocation.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.0)
    }
}

impl FromStr for AssetId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A principal identifier (UUIDv7, or UUIDv5 for named principals).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(uuid::Uuid);

/// Fixed namespace for deriving deterministic PrincipalIds via UUIDv5.
const ASSETDAV_PRINCIPAL_NS: uuid::Uuid = uuid::uuid!("3f0c9a52-8d41-4b7e-9e26-5a7d1c04b8f3");

impl PrincipalId {
    /// Create a new time-ordered ID (UUIDv7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Deterministic id for a named principal.
    ///
    /// The same username always yields the same id, so owners recorded in a
    /// persisted repository still match after the process restarts.
    pub fn from_username(username: &str) -> Self {
        Self(uuid::Uuid::new_v5(&ASSETDAV_PRINCIPAL_NS, username.as_bytes()))
    }

    /// The well-known "system" principal.
    pub fn system() -> Self {
        Self::from_username("system")
    }

    /// First 8 hex characters, for display only.
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }

    /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        uuid::Uuid::parse_str(s).map(Self)
    }

    /// The nil id, used as a sentinel.
    pub fn nil() -> Self {
        Self(uuid::Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for PrincipalId {
    fn from(u: uuid::Uuid) -> Self {
        Self(u)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrincipalId({})", self.short())
    }
}
