//! # Tabula Codegen
//!
//! Everything after a schema has been loaded and validated: the differ,
//! the SQL renderers and the Markdown reference generator.
//!
//! ## Features
//!
//! - **Differ**: [`diff_schemas`] computes a structured [`SchemaDiff`]
//! - **Migration scripts**: forward and rollback SQL for MSSQL and PostgreSQL
//! - **Baseline scripts**: a full `CREATE` script for one schema version
//! - **Reference docs**: a Markdown document with an ER diagram
//! - **Pairing check**: every forward script has its `_rollback.sql`
//!
//! The render functions are pure and return strings; only the
//! [`Generator`] touches the file system.

// ============================================================================
// Modules
// ============================================================================

pub mod dialect;
pub mod diff;
pub mod docs;
pub mod generator;
pub mod migrations;
pub mod pairing;

// ============================================================================
// Re-exports
// ============================================================================

pub use dialect::Dialect;
pub use diff::{
    AlteredColumn, DroppedTable, ForeignKeyDescriptor, PrimaryKeyChange, SchemaDiff,
    diff_schemas, diff_views,
};
pub use docs::render_markdown;
pub use generator::{GenerationSummary, Generator, summarize};
pub use migrations::{
    MigrationPlan, MigrationRenderer, MigrationStep, create_script_name, forward_script_name,
    normalize_version, render_create_script, render_migration, rollback_script_name,
};
pub use pairing::{PairingReport, find_unpaired_migrations};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tabula_core::{Platform, TabulaError, TabulaResult};

/// Default file name of the Markdown reference
pub const DEFAULT_DOCS_FILE_NAME: &str = "SCHEMA.md";

// ============================================================================
// GeneratorConfig
// ============================================================================

/// Configuration for writing generated files
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Output directory for generated files
    pub output_dir: PathBuf,

    /// Whether existing files may be replaced
    pub overwrite: bool,

    /// Platform used when none is given on the command line
    pub default_platform: Platform,

    /// File name of the Markdown reference
    pub docs_file_name: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            overwrite: true,
            default_platform: Platform::Mssql,
            docs_file_name: DEFAULT_DOCS_FILE_NAME.to_string(),
        }
    }
}

/// On-disk form: every field of the `[generator]` table is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    generator: GeneratorSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GeneratorSection {
    output_dir: Option<PathBuf>,
    overwrite: Option<bool>,
    default_platform: Option<String>,
    docs_file_name: Option<String>,
}

impl GeneratorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Refuse to replace existing files
    pub fn without_overwrite(mut self) -> Self {
        self.overwrite = false;
        self
    }

    /// Set the default platform
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.default_platform = platform;
        self
    }

    /// Set the Markdown reference file name
    pub fn with_docs_file_name(mut self, name: impl Into<String>) -> Self {
        self.docs_file_name = name.into();
        self
    }

    /// Parse a TOML document with an optional `[generator]` table
    pub fn from_toml_str(text: &str) -> TabulaResult<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        let section = file.generator;
        let defaults = Self::default();

        let default_platform = match section.default_platform {
            Some(name) => name.parse()?,
            None => defaults.default_platform,
        };
        let docs_file_name = section.docs_file_name.unwrap_or(defaults.docs_file_name);
        if docs_file_name.trim().is_empty() {
            return Err(TabulaError::config("docs_file_name cannot be empty"));
        }

        Ok(Self {
            output_dir: section.output_dir.unwrap_or(defaults.output_dir),
            overwrite: section.overwrite.unwrap_or(defaults.overwrite),
            default_platform,
            docs_file_name,
        })
    }

    /// Load from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> TabulaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TabulaError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }
}

// ============================================================================
// GeneratedFile
// ============================================================================

/// A single generated file, not yet written
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    /// Path relative to the output directory
    pub path: PathBuf,

    /// File content
    pub content: String,

    /// File type for categorization
    pub file_type: FileType,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            file_type,
        }
    }

    /// Create a SQL script
    pub fn sql(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileType::Sql)
    }

    /// Create a Markdown document
    pub fn markdown(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileType::Markdown)
    }

    pub fn extension(&self) -> &str {
        self.file_type.extension()
    }
}

/// Type of generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Sql,
    Markdown,
}

impl FileType {
    pub fn extension(&self) -> &str {
        match self {
            FileType::Sql => "sql",
            FileType::Markdown => "md",
        }
    }
}

// ============================================================================
// GeneratedProject
// ============================================================================

/// The files one generator run produced
#[derive(Debug, Clone, Default)]
pub struct GeneratedProject {
    /// Short label of the run, e.g. `v1.0_to_v1.1_mssql`
    pub name: String,

    /// All generated files
    pub files: Vec<GeneratedFile>,

    /// Warnings raised while generating
    pub warnings: Vec<String>,
}

impl GeneratedProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_file(&mut self, file: GeneratedFile) {
        self.files.push(file);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get files by type
    pub fn files_by_type(&self, file_type: FileType) -> Vec<&GeneratedFile> {
        self.files
            .iter()
            .filter(|f| f.file_type == file_type)
            .collect()
    }

    /// The file with the given relative path
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path.as_ref())
    }

    /// Write every file below `base_dir` and return the full paths.
    ///
    /// With `overwrite` unset, an existing target fails the write before any
    /// file is touched.
    pub fn write_to_disk(
        &self,
        base_dir: impl AsRef<Path>,
        overwrite: bool,
    ) -> TabulaResult<Vec<PathBuf>> {
        let base_dir = base_dir.as_ref();
        let targets: Vec<PathBuf> = self.files.iter().map(|f| base_dir.join(&f.path)).collect();

        if !overwrite {
            if let Some(existing) = targets.iter().find(|p| p.exists()) {
                return Err(TabulaError::OutputExists(existing.clone()));
            }
        }

        for (file, full_path) in self.files.iter().zip(&targets) {
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| TabulaError::DirectoryCreate {
                    path: parent.to_path_buf(),
                    message: e.to_string(),
                })?;
            }

            std::fs::write(full_path, &file.content).map_err(|e| TabulaError::FileWrite {
                path: full_path.clone(),
                message: e.to_string(),
            })?;
        }

        Ok(targets)
    }
}

// ============================================================================
// Tests
// ============================================================================
