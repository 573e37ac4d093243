//! RON configuration for the `assetdav` binary.
//!
//! ```ron
//! (
//!     store: Some("/var/lib/assetdav/store.json"),
//!     log_filter: "assetdav_kernel=info",
//!     principals: [
//!         (username: "amy", display_name: Some("Amy"), admin: true),
//!         (
//!             username: "bob",
//!             grants: [
//!                 (path: "/", capabilities: [view]),
//!                 (path: "/shared", capabilities: [view, create, rename, publish]),
//!             ],
//!         ),
//!     ],
//! )
//! ```
//!
//! Grants are not part of the store snapshot; they are applied from here on
//! every start.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use assetdav_kernel::MemoryRepository;
use assetdav_types::{Capability, Principal, PrincipalId};
use serde::{Deserialize, Serialize};

/// Config file path (~/.config/assetdav/config.ron).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("assetdav").join("config.ron"))
}

/// Store path when neither the flag nor the config names one.
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("assetdav")
        .join("store.json")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON snapshot file backing the repository.
    pub store: Option<PathBuf>,
    /// Where uploads are staged; the system temp dir if unset.
    pub staging_dir: Option<PathBuf>,
    /// Fallback tracing filter when `RUST_LOG` is not set.
    pub log_filter: String,
    pub principals: Vec<PrincipalConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: None,
            staging_dir: None,
            log_filter: assetdav_telemetry::DEFAULT_FILTER.to_string(),
            principals: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalConfig {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub grants: Vec<GrantConfig>,
}

impl PrincipalConfig {
    pub fn principal(&self) -> Principal {
        let display = self.display_name.as_deref().unwrap_or(&self.username);
        Principal::named(&self.username, display)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantConfig {
    pub path: String,
    pub capabilities: Vec<Capability>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load `path`. A missing file at the default location is not an error;
    /// an explicitly requested one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(default_store_path)
    }

    /// The principal for `username`, or one with no grants if unconfigured.
    pub fn principal(&self, username: &str) -> Principal {
        match self.principals.iter().find(|p| p.username == username) {
            Some(p) => p.principal(),
            None => {
                tracing::warn!(username, "principal not in config; it has no grants");
                Principal::named(username, username)
            }
        }
    }

    /// Install admins and grants on `repo`.
    pub fn apply(&self, repo: &MemoryRepository) {
        // The local operator, used when no --user is given.
        repo.add_admin(PrincipalId::system());
        for p in &self.principals {
            let id = PrincipalId::from_username(&p.username);
            if p.admin {
                repo.add_admin(id);
            }
            for grant in &p.grants {
                repo.grant(id, &grant.path, grant.capabilities.iter().copied());
            }
        }
    }
}
