//! Command handlers
//!
//! Each handler returns the process [`ExitStatus`]; failures to load
//! definitions or write files come back as `Err` and map to exit code 2.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tabula_codegen::{
    GeneratedProject, Generator, GeneratorConfig, diff_schemas, find_unpaired_migrations,
    normalize_version,
};
use tabula_core::{Platform, TabulaError};
use tabula_ir::{SchemaModel, load_model, validate_model};

use crate::args::{Cli, Mode};

/// Process outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Everything passed
    Success,
    /// Validation errors, or unpaired migration scripts
    Failed,
    /// A definition failed to load, or IO failed
    Error,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failed => 1,
            ExitStatus::Error => 2,
        }
    }
}

/// Run the selected mode and report errors on stderr
pub fn run(cli: &Cli) -> ExitStatus {
    if cli.no_color {
        colored::control::set_override(false);
    }

    match dispatch(cli) {
        Ok(status) => status,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitStatus::Error
        }
    }
}

fn dispatch(cli: &Cli) -> Result<ExitStatus> {
    let Some(mode) = cli.mode() else {
        bail!("no mode selected; use --validate, --create, --from-dir, --docs or --check-pairs");
    };
    tracing::debug!(?mode, "dispatch");

    match mode {
        Mode::Validate(dir) => validate(cli, dir),
        Mode::Create(dir) => create(cli, dir),
        Mode::Migrate { from, to } => migrate(cli, from, to),
        Mode::Docs(dir) => docs(cli, dir),
        Mode::CheckPairs(dir) => check_pairs(dir),
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn validate(cli: &Cli, tables_dir: &Path) -> Result<ExitStatus> {
    let schema = load(tables_dir, cli.views.as_deref())?;
    if !report_validation(&schema, tables_dir) {
        return Ok(ExitStatus::Failed);
    }
    println!(
        "{} {} tables, {} views valid",
        "✓".green().bold(),
        schema.table_count(),
        schema.view_count()
    );
    Ok(ExitStatus::Success)
}

fn create(cli: &Cli, tables_dir: &Path) -> Result<ExitStatus> {
    let config = config(cli)?;
    let platform = platform(cli, &config)?;
    let version = version(cli.schema_version.as_deref(), tables_dir)?;

    let schema = load(tables_dir, cli.views.as_deref())?;
    if !report_validation(&schema, tables_dir) {
        return Ok(ExitStatus::Failed);
    }

    let generator = Generator::new(config);
    let output = generator.create_script(&schema, &version, platform);
    write(&generator, &output)
}

fn migrate(cli: &Cli, from_dir: &Path, to_dir: &Path) -> Result<ExitStatus> {
    let config = config(cli)?;
    let platform = platform(cli, &config)?;
    let from_version = version(cli.from_version.as_deref(), from_dir)?;
    let to_version = version(cli.to_version.as_deref(), to_dir)?;

    let old = load(from_dir, cli.from_views.as_deref())?;
    let new = load(to_dir, cli.to_views.as_deref())?;
    let old_ok = report_validation(&old, from_dir);
    let new_ok = report_validation(&new, to_dir);
    if !(old_ok && new_ok) {
        return Ok(ExitStatus::Failed);
    }

    let diff = diff_schemas(&old, &new);
    if diff.is_empty() {
        println!(
            "{} v{} and v{} are identical; nothing written",
            "•".cyan(),
            from_version,
            to_version
        );
        return Ok(ExitStatus::Success);
    }
    for line in diff.summary() {
        println!("  {}", line);
    }

    let generator = Generator::new(config);
    let output = generator.migration(&diff, &new, &from_version, &to_version, platform);
    write(&generator, &output)
}

fn docs(cli: &Cli, tables_dir: &Path) -> Result<ExitStatus> {
    let config = config(cli)?;
    let version = version(cli.schema_version.as_deref(), tables_dir)?;

    let schema = load(tables_dir, cli.views.as_deref())?;
    if !report_validation(&schema, tables_dir) {
        return Ok(ExitStatus::Failed);
    }

    let generator = Generator::new(config);
    let output = generator.docs(&schema, &version);
    write(&generator, &output)
}

fn check_pairs(dir: &Path) -> Result<ExitStatus> {
    let report = find_unpaired_migrations(dir)?;
    if report.is_ok() {
        println!(
            "{} {} migration scripts, all paired",
            "✓".green().bold(),
            report.checked
        );
        return Ok(ExitStatus::Success);
    }
    for problem in report.problems() {
        println!("{} {}", "✗".red().bold(), problem);
    }
    Ok(ExitStatus::Failed)
}

// ============================================================================
// Helpers
// ============================================================================

/// Load tables plus views; views default to a sibling `views/` directory
fn load(tables_dir: &Path, views_dir: Option<&Path>) -> Result<SchemaModel> {
    if !tables_dir.is_dir() {
        bail!("tables directory '{}' does not exist", tables_dir.display());
    }
    let views_dir = views_dir.map(Path::to_path_buf).or_else(|| sibling_views(tables_dir));
    tracing::debug!(tables = %tables_dir.display(), views = ?views_dir, "loading schema");

    let schema = load_model(tables_dir, views_dir.as_deref())?;
    tracing::info!(
        tables = schema.table_count(),
        views = schema.view_count(),
        "schema loaded",
    );
    Ok(schema)
}

/// `<parent>/views` next to the tables directory, when it exists
pub fn sibling_views(tables_dir: &Path) -> Option<PathBuf> {
    let dir = tables_dir.parent()?.join("views");
    (dir.is_dir() && dir != tables_dir).then_some(dir)
}

/// Print validation output; false when there are errors
fn report_validation(schema: &SchemaModel, dir: &Path) -> bool {
    let result = validate_model(schema);
    for warning in &result.warnings {
        tracing::info!(%warning, "validation warning");
    }
    if !result.has_errors() {
        return true;
    }

    eprintln!(
        "{} {} validation error(s) in {}",
        "✗".red().bold(),
        result.errors.len(),
        dir.display()
    );
    for message in result.messages() {
        eprintln!("  {}", message);
    }
    false
}

fn config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_toml_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn platform(cli: &Cli, config: &GeneratorConfig) -> Result<Platform> {
    match &cli.platform {
        Some(name) => Ok(name.parse::<Platform>()?),
        None => Ok(config.default_platform),
    }
}

/// Explicit version, or the first `v<digit>…` component of the path
/// searching from the end
fn version(explicit: Option<&str>, dir: &Path) -> Result<String> {
    if let Some(version) = explicit {
        let version = normalize_version(version);
        if version.is_empty() {
            return Err(TabulaError::InvalidVersion("empty version".into()).into());
        }
        return Ok(version.to_string());
    }
    infer_version(dir).ok_or_else(|| {
        TabulaError::InvalidVersion(format!(
            "cannot infer a version from '{}'; pass it explicitly",
            dir.display()
        ))
        .into()
    })
}

/// Version named by a `v<digit>…` path component, e.g. `1.2` for
/// `schema/v1.2/tables`
pub fn infer_version(dir: &Path) -> Option<String> {
    dir.components().rev().find_map(|component| {
        let name = component.as_os_str().to_str()?;
        let rest = name.strip_prefix(['v', 'V'])?;
        rest.starts_with(|c: char| c.is_ascii_digit())
            .then(|| rest.to_string())
    })
}

fn write(generator: &Generator, output: &GeneratedProject) -> Result<ExitStatus> {
    for warning in &output.warnings {
        println!("{} {}", "!".yellow().bold(), warning);
    }
    let paths = generator.write(output)?;
    for path in paths {
        println!("{} {}", "✓".green().bold(), path.display());
    }
    Ok(ExitStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_infer_version() {
        assert_eq!(infer_version(Path::new("schema/v1.2/tables")), Some("1.2".into()));
        assert_eq!(infer_version(Path::new("v1/x/V3/tables")), Some("3".into()));
        assert_eq!(infer_version(Path::new("schema/views/tables")), None);
        assert_eq!(infer_version(Path::new("tables")), None);
    }

    #[test]
    fn test_explicit_version_is_normalized() {
        assert_eq!(version(Some("v2.0"), Path::new("x")).unwrap(), "2.0");
        assert!(version(Some("v"), Path::new("x")).is_err());
        assert!(version(None, Path::new("tables")).is_err());
    }

    #[test]
    fn test_sibling_views() {
        let root = tempfile::tempdir().unwrap();
        let tables = root.path().join("tables");
        std::fs::create_dir(&tables).unwrap();
        assert_eq!(sibling_views(&tables), None);

        std::fs::create_dir(root.path().join("views")).unwrap();
        assert_eq!(sibling_views(&tables), Some(root.path().join("views")));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failed.code(), 1);
        assert_eq!(ExitStatus::Error.code(), 2);
    }
}
