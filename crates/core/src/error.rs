//! Error type shared by the library crates.

use serde::{Deserialize, Serialize};

use crate::KubeResourceType;

/// Errors suitable for surfacing as inline notices.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PanelError {
    #[error("fetch {kind}: {message}")]
    Fetch { kind: KubeResourceType, message: String },
    #[error("timeout: {kind} did not answer within {secs}s")]
    Timeout { kind: KubeResourceType, secs: u64 },
    #[error("registry: cannot construct {key}: {message}")]
    Registry { key: String, message: String },
    #[error("image: {0}")]
    Image(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type PanelResult<T> = Result<T, PanelError>;

impl PanelError {
    /// Resource kind this error relates to, if any.
    pub fn kind(&self) -> Option<KubeResourceType> {
        match self {
            Self::Fetch { kind, .. } | Self::Timeout { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
