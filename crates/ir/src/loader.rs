//! Loading definition files into a [`SchemaModel`]
//!
//! Each file in a definitions directory holds exactly one table (or view).
//! YAML, JSON and TOML documents are accepted; any other file is ignored.
//! Files are read one at a time in filename order and every structural
//! problem fails the whole load with a [`SchemaLoadError`] naming the file.
//!
//! A missing directory is not an error: it loads as an empty map, which is
//! how a baseline is diffed against "nothing".

use crate::schema::{SchemaModel, TableMap, ViewMap};
use crate::table::TableDefinition;
use crate::view::ViewDefinition;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tabula_core::{LoadRule, SchemaLoadError, TabulaError, TabulaResult};
use walkdir::WalkDir;

// ============================================================================
// Constants
// ============================================================================

/// Top-level key that marks a file as a managed definition
pub const FORMAT_VERSION_KEY: &str = "_format_version";

/// Root key of a table document
pub const TABLE_ROOT_KEY: &str = "table";

/// Root key of a view document
pub const VIEW_ROOT_KEY: &str = "view";

// ============================================================================
// Document formats
// ============================================================================

/// Structured-data formats a definition file may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            "toml" => Some(DocumentFormat::Toml),
            _ => None,
        }
    }

    /// Parse text into a generic document tree
    pub fn parse(&self, text: &str) -> Result<serde_json::Value, String> {
        match self {
            DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            DocumentFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

// ============================================================================
// Definition trait
// ============================================================================

/// A definition type that lives under a named root key of its document
pub trait Definition: DeserializeOwned {
    /// Root key (`table` or `view`)
    const ROOT_KEY: &'static str;

    /// The declared name, which must equal the filename stem
    fn declared_name(&self) -> &str;
}

impl Definition for TableDefinition {
    const ROOT_KEY: &'static str = TABLE_ROOT_KEY;

    fn declared_name(&self) -> &str {
        &self.name
    }
}

impl Definition for ViewDefinition {
    const ROOT_KEY: &'static str = VIEW_ROOT_KEY;

    fn declared_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Load Functions
// ============================================================================

/// Load every table file in `tables_dir`
///
/// # Example
///
/// ```rust,ignore
/// use tabula_ir::load_schema;
///
/// let schema = load_schema("schema/v1.0/tables")?;
/// println!("{} tables", schema.table_count());
/// ```
pub fn load_schema(tables_dir: impl AsRef<Path>) -> TabulaResult<SchemaModel> {
    let tables: TableMap = load_directory(tables_dir.as_ref())?;
    Ok(SchemaModel {
        tables,
        views: ViewMap::new(),
    })
}

/// Load every view file in `views_dir`
pub fn load_views(views_dir: impl AsRef<Path>) -> TabulaResult<ViewMap> {
    load_directory(views_dir.as_ref())
}

/// Load tables and, when given, views into one model
pub fn load_model(tables_dir: impl AsRef<Path>, views_dir: Option<&Path>) -> TabulaResult<SchemaModel> {
    let schema = load_schema(tables_dir)?;
    match views_dir {
        Some(dir) => Ok(schema.with_views(load_views(dir)?)),
        None => Ok(schema),
    }
}

/// Load a single table file
pub fn load_table_file(path: impl AsRef<Path>) -> Result<TableDefinition, SchemaLoadError> {
    load_file(path.as_ref())
}

/// Load a single view file
pub fn load_view_file(path: impl AsRef<Path>) -> Result<ViewDefinition, SchemaLoadError> {
    load_file(path.as_ref())
}

/// Definition files of a directory in lexicographic filename order
///
/// Subdirectories and files with unrecognised extensions are skipped.
pub fn definition_files(dir: &Path) -> TabulaResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| TabulaError::DirectoryScan {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_file() && DocumentFormat::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn load_directory<T: Definition>(dir: &Path) -> TabulaResult<BTreeMap<String, T>> {
    let mut definitions = BTreeMap::new();
    for path in definition_files(dir)? {
        let definition: T = load_file(&path)?;
        let name = definition.declared_name().to_string();
        if definitions.contains_key(&name) {
            return Err(SchemaLoadError::new(path, LoadRule::DuplicateName(name)).into());
        }
        definitions.insert(name, definition);
    }
    Ok(definitions)
}

fn load_file<T: Definition>(path: &Path) -> Result<T, SchemaLoadError> {
    let fail = |rule: LoadRule| SchemaLoadError::new(path, rule);

    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| fail(LoadRule::Parse("unrecognised file extension".to_string())))?;
    let text =
        std::fs::read_to_string(path).map_err(|e| fail(LoadRule::Unreadable(e.to_string())))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| fail(LoadRule::Unreadable("file name is not valid UTF-8".to_string())))?;

    parse_definition(&text, format, stem).map_err(fail)
}

/// Parse one document and check it against its filename stem
pub fn parse_definition<T: Definition>(
    text: &str,
    format: DocumentFormat,
    stem: &str,
) -> Result<T, LoadRule> {
    let serde_json::Value::Object(mut document) = format.parse(text).map_err(LoadRule::Parse)?
    else {
        return Err(LoadRule::NotAMapping);
    };

    match document.get(FORMAT_VERSION_KEY) {
        None | Some(serde_json::Value::Null) => return Err(LoadRule::MissingFormatVersion),
        Some(_) => {}
    }

    let root = document
        .remove(T::ROOT_KEY)
        .ok_or(LoadRule::MissingRoot(T::ROOT_KEY))?;
    if !root.is_object() {
        return Err(LoadRule::InvalidRoot {
            root: T::ROOT_KEY,
            message: "expected a key/value mapping".to_string(),
        });
    }

    let definition: T = serde_json::from_value(root).map_err(|e| LoadRule::InvalidRoot {
        root: T::ROOT_KEY,
        message: e.to_string(),
    })?;

    if definition.declared_name() != stem {
        return Err(LoadRule::NameMismatch {
            name: definition.declared_name().to_string(),
            stem: stem.to_string(),
        });
    }

    Ok(definition)
}

// ============================================================================
// Tests
// ============================================================================
