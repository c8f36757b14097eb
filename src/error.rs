// src/error.rs
//! Error types for the building tile loader

use std::{fmt, path::PathBuf, sync::Arc};

pub type Result<T> = std::result::Result<T, BuildingsError>;

#[derive(Debug)]
pub enum BuildingsError {
    Io(std::io::Error),
    CacheIo(PathBuf, std::io::Error),
    Transport(String),
    Malformed(String),
    Json(serde_json::Error),
    Config(String),
    /// Outcome of a load shared between concurrent callers of the same URL
    Shared(Arc<BuildingsError>),
    Other(String),
}

impl BuildingsError {
    /// The underlying error, looking through shared in-flight outcomes
    pub fn root(&self) -> &BuildingsError {
        match self {
            BuildingsError::Shared(inner) => inner.root(),
            other => other,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.root(), BuildingsError::Transport(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.root(), BuildingsError::Malformed(_))
    }

    pub fn is_cache_io(&self) -> bool {
        matches!(self.root(), BuildingsError::CacheIo(..))
    }
}

impl fmt::Display for BuildingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildingsError::Io(e) => write!(f, "IO error: {}", e),
            BuildingsError::CacheIo(path, e) => {
                write!(f, "Cache IO error on {}: {}", path.display(), e)
            }
            BuildingsError::Transport(msg) => write!(f, "Transport error: {}", msg),
            BuildingsError::Malformed(msg) => write!(f, "Malformed response: {}", msg),
            BuildingsError::Json(e) => write!(f, "JSON error: {}", e),
            BuildingsError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BuildingsError::Shared(inner) => write!(f, "{}", inner),
            BuildingsError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BuildingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildingsError::Io(e) | BuildingsError::CacheIo(_, e) => Some(e),
            BuildingsError::Json(e) => Some(e),
            BuildingsError::Shared(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BuildingsError {
    fn from(error: std::io::Error) -> Self {
        BuildingsError::Io(error)
    }
}

impl From<serde_json::Error> for BuildingsError {
    fn from(error: serde_json::Error) -> Self {
        BuildingsError::Json(error)
    }
}

impl From<reqwest::Error> for BuildingsError {
    fn from(error: reqwest::Error) -> Self {
        BuildingsError::Transport(error.to_string())
    }
}

impl From<anyhow::Error> for BuildingsError {
    fn from(error: anyhow::Error) -> Self {
        BuildingsError::Other(error.to_string())
    }
}
