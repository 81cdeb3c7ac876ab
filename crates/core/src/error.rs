//! Error types for Tabula
//!
//! This module provides unified error handling across the toolkit. Load
//! failures get their own [`SchemaLoadError`] type because they are reported
//! per file and halt a run; everything else (IO, serialization, configuration,
//! output) is folded into [`TabulaError`].
//!
//! Validation problems are deliberately *not* errors: the validator returns
//! them as a list of values so that all of them can be shown at once.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// SchemaLoadError
// ============================================================================

/// The structural rule a definition file broke while being loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRule {
    /// The file could not be read from disk
    Unreadable(String),
    /// The document is malformed for its format
    Parse(String),
    /// The document did not parse to a top-level key/value mapping
    NotAMapping,
    /// `_format_version` is absent (or null)
    MissingFormatVersion,
    /// The `table` / `view` root key is absent
    MissingRoot(&'static str),
    /// The `table` / `view` root key is present but not a valid definition
    InvalidRoot { root: &'static str, message: String },
    /// `<root>.name` differs from the filename stem
    NameMismatch { name: String, stem: String },
    /// Another file in the same directory already defined this name
    DuplicateName(String),
}

impl std::fmt::Display for LoadRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadRule::Unreadable(msg) => write!(f, "file could not be read: {}", msg),
            LoadRule::Parse(msg) => write!(f, "malformed document: {}", msg),
            LoadRule::NotAMapping => write!(f, "document is not a top-level key/value mapping"),
            LoadRule::MissingFormatVersion => {
                write!(f, "missing required top-level key '_format_version'")
            }
            LoadRule::MissingRoot(root) => write!(f, "missing required top-level key '{}'", root),
            LoadRule::InvalidRoot { root, message } => {
                write!(f, "invalid '{}' definition: {}", root, message)
            }
            LoadRule::NameMismatch { name, stem } => write!(
                f,
                "name '{}' does not match filename stem '{}'",
                name, stem
            ),
            LoadRule::DuplicateName(name) => {
                write!(f, "'{}' is defined by more than one file", name)
            }
        }
    }
}

/// A definition file failed the structural contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to load '{path}': {rule}")]
pub struct SchemaLoadError {
    /// The offending file
    pub path: PathBuf,
    /// Which rule it broke
    pub rule: LoadRule,
}

impl SchemaLoadError {
    /// Create a new load error for a file
    pub fn new(path: impl Into<PathBuf>, rule: LoadRule) -> Self {
        Self {
            path: path.into(),
            rule,
        }
    }
}

// ============================================================================
// TabulaError
// ============================================================================

/// The main error type for Tabula
#[derive(Debug, Error)]
pub enum TabulaError {
    // ========================================================================
    // Load Errors
    // ========================================================================
    /// A definition file failed to load
    #[error(transparent)]
    SchemaLoad(#[from] SchemaLoadError),

    /// A definitions directory exists but could not be scanned
    #[error("Failed to scan directory '{path}': {message}")]
    DirectoryScan { path: PathBuf, message: String },

    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// A schema failed validation (the messages are joined)
    #[error("Validation failed: {0}")]
    Validation(String),

    // ========================================================================
    // Generation Errors
    // ========================================================================
    /// Unknown target platform name
    #[error("Unknown platform '{0}' (expected 'mssql' or 'postgres')")]
    UnknownPlatform(String),

    /// A version could not be determined or is malformed
    #[error("Invalid schema version: {0}")]
    InvalidVersion(String),

    /// Output file already exists and overwriting is disabled
    #[error("Output file already exists: {0}")]
    OutputExists(PathBuf),

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// File write error
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },

    /// Directory creation failed
    #[error("Failed to create directory '{path}': {message}")]
    DirectoryCreate { path: PathBuf, message: String },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML serialization error: {0}")]
    YamlSerialization(#[from] serde_yaml::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl TabulaError {
    /// Create a validation error from a list of messages
    pub fn validation(messages: &[String]) -> Self {
        TabulaError::Validation(messages.join("; "))
    }

    /// Create an invalid-configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        TabulaError::InvalidConfig(msg.into())
    }

    /// Create an error with context
    pub fn with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        TabulaError::WithContext {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Check if this error came from loading definition files
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            TabulaError::SchemaLoad(_) | TabulaError::DirectoryScan { .. }
        )
    }

    /// Check if this error is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, TabulaError::Validation(_))
    }

    /// Check if this error is an IO error
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            TabulaError::Io(_)
                | TabulaError::FileRead { .. }
                | TabulaError::FileWrite { .. }
                | TabulaError::DirectoryCreate { .. }
        )
    }
}

/// Result type alias using TabulaError
pub type TabulaResult<T> = Result<T, TabulaError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> TabulaResult<T>;
}

impl<T, E: Into<TabulaError>> ResultExt<T> for Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> TabulaResult<T> {
        self.map_err(|e| {
            let err: TabulaError = e.into();
            TabulaError::WithContext {
                context: context.into(),
                message: err.to_string(),
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_error_names_file_and_rule() {
        let err = SchemaLoadError::new("tables/Unit.yaml", LoadRule::MissingFormatVersion);
        assert_eq!(
            err.to_string(),
            "Failed to load 'tables/Unit.yaml': missing required top-level key '_format_version'"
        );
    }

    #[test]
    fn test_name_mismatch_message() {
        let err = SchemaLoadError::new(
            "tables/unit.yaml",
            LoadRule::NameMismatch {
                name: "Unit".to_string(),
                stem: "unit".to_string(),
            },
        );
        assert!(err.to_string().contains("name 'Unit' does not match filename stem 'unit'"));
    }

    #[test]
    fn test_load_error_converts_and_classifies() {
        let err: TabulaError =
            SchemaLoadError::new("views/v.yaml", LoadRule::MissingRoot("view")).into();
        assert!(err.is_load());
        assert!(!err.is_io());
        assert!(err.to_string().contains("missing required top-level key 'view'"));
    }

    #[test]
    fn test_validation_error_joins_messages() {
        let err = TabulaError::validation(&["a".to_string(), "b".to_string()]);
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation failed: a; b");
    }

    #[test]
    fn test_error_with_context() {
        let err = TabulaError::with_context("Writing script", "Permission denied");
        assert_eq!(err.to_string(), "Writing script: Permission denied");
    }

    #[test]
    fn test_result_ext_wraps_io_error() {
        let res: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = res.with_context("Reading config").unwrap_err();
        assert_eq!(err.to_string(), "Reading config: IO error: gone");
    }

    #[test]
    fn test_io_error_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TabulaError = io_err.into();
        assert!(err.is_io());
        assert!(!err.is_load());
    }
}
