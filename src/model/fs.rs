use std::{fmt, time::SystemTime};

#[derive(Debug, thiserror::Error)]
pub enum FSError {
    #[error("no supported object store engine is configured")]
    ConfigurationMissing,

    #[error("failed to connect to object store: {0}")]
    ConnectionFailed(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("backend failure at: {key}, {message}")]
    Backend { key: String, message: String },

    #[error("local staging failure: {0}")]
    LocalStaging(#[from] std::io::Error),
}

impl FSError {
    pub fn backend(key: &str, message: impl fmt::Display) -> Self {
        FSError::Backend {
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    /// Short label used as `error_group` in log events.
    pub fn group(&self) -> &'static str {
        match self {
            FSError::ConfigurationMissing => "configuration_missing",
            FSError::ConnectionFailed(_) => "connection_failed",
            FSError::ObjectNotFound(_) => "not_found",
            FSError::Backend { .. } => "backend",
            FSError::LocalStaging(_) => "local_staging",
        }
    }
}

/// Object-store-native permission tier. Coarser than a POSIX mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessLevel {
    Private,
    #[default]
    PublicRead,
    PublicReadWrite,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Private => "private",
            AccessLevel::PublicRead => "public-read",
            AccessLevel::PublicReadWrite => "public-read-write",
        }
    }

    pub fn is_public_readable(&self) -> bool {
        !matches!(self, AccessLevel::Private)
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata reported by the backend for a single object. Fetched per call, never cached.
#[derive(Clone, Debug)]
pub struct FSObject {
    pub key: String,
    pub size: i64,
    pub modified_time: SystemTime,
    pub access_level: AccessLevel,
}
