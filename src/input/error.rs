use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a locale resource into a tree.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Error when failing to set the language for the parser
    #[error("Failed to set language for parser: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),
    /// Error when the parser produced no tree at all
    #[error("Failed to parse resource source")]
    ParseFailed,
    /// Syntax error reported by the JSON/JSONC or module parser
    #[error("Syntax error: {0}")]
    Syntax(String),
    /// The module does not export an object literal
    #[error("No exported object literal found; expected `export default {{ ... }}`")]
    NoExport,
    /// The document root is not an object
    #[error("Resource root must be an object, found {kind}")]
    RootNotObject { kind: &'static str },
    /// A leaf value is not a plain string
    #[error("Value at '{key}' must be a string or an object, found {kind}")]
    NonStringLeaf { key: String, kind: String },
    /// A property that cannot be read statically (spread, computed key, method)
    #[error("Unsupported property at '{key}': {kind}")]
    UnsupportedProperty { key: String, kind: String },
    /// A namespace node declares the same key twice
    #[error("Duplicate key '{key}'")]
    DuplicateKey { key: String },
    /// A string literal could not be decoded
    #[error("Invalid string literal at '{key}': {reason}")]
    InvalidString { key: String, reason: String },
    /// The file extension is not a known resource format
    #[error("Unsupported resource file: {0}")]
    UnsupportedFormat(PathBuf),
    /// Error when failing to serialize the tree
    #[error("Failed to serialize resource: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The blocking parse task panicked or was cancelled
    #[error("Resource load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// Error when failing to read a file
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
