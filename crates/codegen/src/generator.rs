//! # Generator
//!
//! The `Generator` is the file-producing layer on top of the pure renderers.
//! It turns a diff or a schema into a [`GeneratedProject`] with correctly
//! named files and writes projects into the configured output directory.
//!
//! ## Pipeline
//!
//! ```text
//! SchemaDiff + SchemaModel          SchemaModel
//!         │                              │
//!         ▼                              ▼
//!   render_migration()        render_create_script() / render_markdown()
//!         │                              │
//!         ▼                              ▼
//!   GeneratedProject { files, warnings } ──► write() ──► output_dir
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tabula_codegen::{Generator, GeneratorConfig, diff_schemas};
//!
//! let generator = Generator::new(GeneratorConfig::new().with_output_dir("migrations"));
//! let output = generator.migration(&diff_schemas(&old, &new), &new, "1.0", "1.1", platform);
//! generator.write(&output)?;
//! ```

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tabula_core::{Platform, TabulaError, TabulaResult};
use tabula_ir::SchemaModel;

use crate::diff::SchemaDiff;
use crate::docs::render_markdown;
use crate::migrations::{
    MigrationRenderer, create_script_name, forward_script_name, normalize_version,
    rollback_script_name,
};
use crate::{FileType, GeneratedFile, GeneratedProject, GeneratorConfig};

// ============================================================================
// Generator
// ============================================================================

/// Produces script and document files and writes them to disk.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,

    /// Fixed `Generated:` timestamp; `None` stamps the current time
    generated_at: Option<DateTime<Utc>>,
}

impl Generator {
    // ====================================================================
    // Construction
    // ====================================================================

    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            generated_at: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(GeneratorConfig::default())
    }

    /// Stamp every script with a fixed time
    pub fn at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GeneratorConfig) {
        self.config = config;
    }

    fn renderer(&self, platform: Platform) -> MigrationRenderer {
        let renderer = MigrationRenderer::new(platform);
        match self.generated_at {
            Some(at) => renderer.at(at),
            None => renderer,
        }
    }

    // ====================================================================
    // Generation
    // ====================================================================

    /// Forward and rollback scripts for `diff`.
    ///
    /// An empty diff produces no files and one warning.
    pub fn migration(
        &self,
        diff: &SchemaDiff,
        new_schema: &SchemaModel,
        from_version: &str,
        to_version: &str,
        platform: Platform,
    ) -> GeneratedProject {
        let forward_name = forward_script_name(from_version, to_version, platform);
        let mut output = GeneratedProject::new(forward_name.trim_end_matches(".sql"));

        if diff.is_empty() {
            tracing::warn!(
                from = normalize_version(from_version),
                to = normalize_version(to_version),
                "schemas are identical, no migration generated",
            );
            output.add_warning(format!(
                "v{} and v{} are identical; no migration generated",
                normalize_version(from_version),
                normalize_version(to_version)
            ));
            return output;
        }

        for line in diff.summary() {
            tracing::debug!(change = %line, "diff");
        }

        let renderer = self.renderer(platform);
        let (forward, rollback) =
            renderer.render_migration(diff, new_schema, from_version, to_version);
        if rollback.contains("-- TODO:") {
            output.add_warning(format!(
                "{} contains steps that must be restored manually",
                rollback_script_name(from_version, to_version, platform)
            ));
        }

        output.add_file(GeneratedFile::sql(forward_name, forward));
        output.add_file(GeneratedFile::sql(
            rollback_script_name(from_version, to_version, platform),
            rollback,
        ));
        output
    }

    /// Baseline `CREATE` script for one schema version
    pub fn create_script(
        &self,
        schema: &SchemaModel,
        version: &str,
        platform: Platform,
    ) -> GeneratedProject {
        let name = create_script_name(version, platform);
        let mut output = GeneratedProject::new(name.trim_end_matches(".sql"));
        if schema.is_empty() {
            output.add_warning("schema has no tables or views; the script is header-only");
        }
        let sql = self.renderer(platform).render_create_script(schema, version);
        output.add_file(GeneratedFile::sql(name, sql));
        output
    }

    /// Markdown reference for one schema version
    pub fn docs(&self, schema: &SchemaModel, version: &str) -> GeneratedProject {
        let mut output = GeneratedProject::new(self.config.docs_file_name.clone());
        let content = render_markdown(schema, normalize_version(version));
        output.add_file(GeneratedFile::markdown(
            self.config.docs_file_name.clone(),
            content,
        ));
        output
    }

    // ====================================================================
    // Writing
    // ====================================================================

    /// Write every file of `output` into the configured output directory
    pub fn write(&self, output: &GeneratedProject) -> TabulaResult<Vec<PathBuf>> {
        let dir = &self.config.output_dir;
        match output.write_to_disk(dir, self.config.overwrite) {
            Ok(paths) => {
                for path in &paths {
                    tracing::info!(path = %path.display(), "file written");
                }
                tracing::info!(
                    output_dir = %dir.display(),
                    files = paths.len(),
                    warnings = output.warnings.len(),
                    "generation complete",
                );
                Ok(paths)
            }
            Err(TabulaError::OutputExists(path)) => {
                tracing::warn!(path = %path.display(), "refusing to overwrite existing file");
                Err(TabulaError::OutputExists(path))
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// GenerationSummary
// ============================================================================

/// A human-readable summary of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub name: String,
    pub total_files: usize,
    pub sql_files: usize,
    pub markdown_files: usize,
    pub warning_count: usize,
    /// Total bytes of generated content
    pub total_bytes: usize,
}

impl GenerationSummary {
    pub fn from_project(project: &GeneratedProject) -> Self {
        Self {
            name: project.name.clone(),
            total_files: project.file_count(),
            sql_files: project.files_by_type(FileType::Sql).len(),
            markdown_files: project.files_by_type(FileType::Markdown).len(),
            warning_count: project.warnings.len(),
            total_bytes: project.files.iter().map(|f| f.content.len()).sum(),
        }
    }

    /// Format the summary as a short block of text
    pub fn display(&self) -> String {
        let size = if self.total_bytes < 1024 {
            format!("{} B", self.total_bytes)
        } else {
            format!("{:.1} KB", self.total_bytes as f64 / 1024.0)
        };

        let mut out = String::with_capacity(256);
        out.push_str(&format!("Output:    {}\n", self.name));
        out.push_str(&format!(
            "Files:     {} ({} SQL, {} Markdown)\n",
            self.total_files, self.sql_files, self.markdown_files
        ));
        out.push_str(&format!("Warnings:  {}\n", self.warning_count));
        out.push_str(&format!("Size:      {}\n", size));
        out
    }
}

impl std::fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Produce a [`GenerationSummary`] from a [`GeneratedProject`].
pub fn summarize(project: &GeneratedProject) -> GenerationSummary {
    GenerationSummary::from_project(project)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_schemas;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tabula_core::LogicalType;
    use tabula_ir::{ColumnDefinition, TableDefinition};

    fn schema(with_note: bool) -> SchemaModel {
        let mut table = TableDefinition::new("T")
            .with_column(ColumnDefinition::new("ID", LogicalType::Integer).not_null())
            .with_primary_key(["ID"]);
        if with_note {
            table = table.with_column(ColumnDefinition::new("Note", LogicalType::Text));
        }
        SchemaModel::from_tables([table])
    }

    fn fixed() -> Generator {
        Generator::with_defaults().at(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
    }

    // ── Construction ─────────────────────────────────────────────────────

    #[test]
    fn test_generator_set_config() {
        let mut generator = Generator::default();
        assert!(generator.config().overwrite);
        generator.set_config(GeneratorConfig::new().without_overwrite());
        assert!(!generator.config().overwrite);
    }

    // ── Generation ───────────────────────────────────────────────────────

    #[test]
    fn test_migration_files() {
        let (old, new) = (schema(false), schema(true));
        let output = fixed().migration(&diff_schemas(&old, &new), &new, "v1.0", "1.1", Platform::Mssql);

        let names: Vec<String> = output
            .files
            .iter()
            .map(|f| f.path.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["v1.0_to_v1.1_mssql.sql", "v1.0_to_v1.1_mssql_rollback.sql"]
        );
        assert_eq!(output.name, "v1.0_to_v1.1_mssql");
        assert!(!output.has_warnings());
        assert!(output.files[0].content.contains("-- Generated: 2024-01-02T03:04:05Z"));
    }

    #[test]
    fn test_empty_diff_writes_nothing() {
        let s = schema(false);
        let output = fixed().migration(&diff_schemas(&s, &s), &s, "1", "2", Platform::Postgres);
        assert!(output.is_empty());
        assert_eq!(output.warnings, vec!["v1 and v2 are identical; no migration generated"]);
    }

    #[test]
    fn test_manual_steps_raise_warning() {
        let (old, new) = (schema(true), schema(false));
        let output = fixed().migration(&diff_schemas(&old, &new), &new, "2", "3", Platform::Mssql);
        assert_eq!(output.file_count(), 2);
        assert!(output.warnings[0].contains("v2_to_v3_mssql_rollback.sql"));
    }

    #[test]
    fn test_create_and_docs() {
        let generator = fixed();
        let create = generator.create_script(&schema(true), "3", Platform::Postgres);
        assert_eq!(create.files[0].path, PathBuf::from("v3_create_postgres.sql"));
        assert!(create.files[0].content.contains("CREATE TABLE \"dbo\".\"T\""));

        let docs = generator.docs(&schema(true), "v3");
        assert_eq!(docs.files[0].path, PathBuf::from("SCHEMA.md"));
        assert!(docs.files[0].content.starts_with("# Schema reference (v3)"));
    }

    // ── Writing ──────────────────────────────────────────────────────────

    #[test]
    fn test_write_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(GeneratorConfig::new().with_output_dir(dir.path()));
        let output = generator.create_script(&schema(false), "1", Platform::Mssql);

        let paths = generator.write(&output).unwrap();
        assert_eq!(paths, vec![dir.path().join("v1_create_mssql.sql")]);
        assert!(generator.write(&output).is_ok());
    }

    #[test]
    fn test_write_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(
            GeneratorConfig::new()
                .with_output_dir(dir.path())
                .without_overwrite(),
        );
        let output = generator.create_script(&schema(false), "1", Platform::Mssql);
        generator.write(&output).unwrap();

        let err = generator.write(&output).unwrap_err();
        assert!(matches!(err, TabulaError::OutputExists(_)));
    }

    // ── Summary ──────────────────────────────────────────────────────────

    #[test]
    fn test_generation_summary() {
        let (old, new) = (schema(false), schema(true));
        let output = fixed().migration(&diff_schemas(&old, &new), &new, "1", "2", Platform::Mssql);
        let summary = summarize(&output);

        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.sql_files, 2);
        assert_eq!(summary.markdown_files, 0);
        assert!(summary.total_bytes > 0);
        assert!(summary.to_string().contains("Files:     2 (2 SQL, 0 Markdown)"));
    }
}
