//! Error types for reading and writing OpenAPI documents.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading or reading a document into the model.
///
/// Compatibility violations are not errors; see [`crate::compare`].
#[derive(Debug, Error)]
pub enum ReadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    // Document shape errors (exit code 2)
    #[error("invalid node at {path}: expected {expected}, got {actual}")]
    InvalidType {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("missing field \"{field}\" at {path}")]
    MissingField { path: String, field: &'static str },

    #[error("invalid value \"{value}\" at {path}: expected {expected}")]
    InvalidValue {
        path: String,
        value: String,
        expected: &'static str,
    },

    #[error("cannot parse reference: {reference}")]
    InvalidReference { reference: String },

    #[error("cannot resolve reference: {reference}")]
    UnknownReference { reference: String },

    #[error(
        "cannot resolve some components {component} (probably cyclic references): [{}]{}",
        names.join(", "),
        last_reference_suffix(reference)
    )]
    UnresolvedReferences {
        component: &'static str,
        names: Vec<String>,
        reference: Option<String>,
    },
}

impl ReadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReadError::FileNotFound { .. } | ReadError::Io { .. } => 3,
            #[cfg(feature = "remote")]
            ReadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }

    /// Returns true when component references never reached a fixed point.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ReadError::UnresolvedReferences { .. })
    }
}

fn last_reference_suffix(reference: &Option<String>) -> String {
    match reference {
        Some(r) => format!(", last failed reference: {}", r),
        None => String::new(),
    }
}

/// Errors while serializing a model back to YAML.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot serialize document: {source}")]
    Serialize {
        #[source]
        source: serde_yaml::Error,
    },
}

impl WriteError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}
