//! Facade error types.

use std::io;

use assetdav_types::Capability;
use thiserror::Error;

/// Errors surfaced by the asset filesystem facade.
///
/// `NotFound` and `Forbidden` map one-to-one onto protocol status codes and
/// are passed through to the protocol layer unchanged.
#[derive(Debug, Error)]
pub enum DavError {
    /// No asset at the resolved path or id.
    #[error("not found: {0}")]
    NotFound(String),

    /// Capability check failed.
    #[error("missing \"{capability}\" permission on {target}")]
    Forbidden {
        capability: Capability,
        target: String,
    },

    /// A name sanitized to nothing, or a structurally invalid request.
    #[error("invalid name: {0}")]
    Validation(String),

    /// An asset with the same parent and filename already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Expected a folder.
    #[error("not a folder: {0}")]
    NotAFolder(String),

    /// The repository returned an asset that cannot be projected into a node.
    #[error("invalid asset {id}: {reason}")]
    InvalidAsset { id: String, reason: String },

    /// I/O error (staging, content reads).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Repository failure not covered above.
    #[error("repository error: {0}")]
    Repository(String),
}

impl DavError {
    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a forbidden error for a missing capability.
    pub fn forbidden(capability: Capability, target: impl Into<String>) -> Self {
        Self::Forbidden {
            capability,
            target: target.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an already-exists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a not-a-folder error.
    pub fn not_a_folder(path: impl Into<String>) -> Self {
        Self::NotAFolder(path.into())
    }

    /// Create an invalid-asset error.
    pub fn invalid_asset(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidAsset {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a repository error.
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// The WebDAV/HTTP status a protocol layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DavError::NotFound(_) => 404,
            DavError::Forbidden { .. } => 403,
            DavError::Validation(_) => 400,
            DavError::AlreadyExists(_) => 409,
            DavError::NotAFolder(_) => 409,
            DavError::InvalidAsset { .. } | DavError::Io(_) | DavError::Repository(_) => 500,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DavError::NotFound(_))
    }

    /// Check if this is a permission error.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, DavError::Forbidden { .. })
    }
}

/// Convert DavError to std::io::Error for compatibility.
impl From<DavError> for io::Error {
    fn from(e: DavError) -> Self {
        match e {
            DavError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            e @ DavError::Forbidden { .. } => {
                io::Error::new(io::ErrorKind::PermissionDenied, e.to_string())
            }
            DavError::Validation(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            DavError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            DavError::NotAFolder(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            e @ DavError::InvalidAsset { .. } => io::Error::new(io::ErrorKind::InvalidData, e.to_string()),
            DavError::Io(e) => e,
            DavError::Repository(msg) => io::Error::other(msg),
        }
    }
}

/// Facade result type.
pub type DavResult<T> = Result<T, DavError>;
