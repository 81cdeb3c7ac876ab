//! CLI argument definitions using clap
//!
//! Modes (exactly one):
//! - tabula --validate <tables_dir>
//! - tabula --create <tables_dir> --platform <p> --output-dir <dir>
//! - tabula --from-dir <old> --from-version <v> --to-dir <new> --to-version <v> ...
//! - tabula --docs <tables_dir> --output-dir <dir>
//! - tabula --check-pairs <migrations_dir>

use clap::{ArgAction, ArgGroup, Parser};
use std::path::{Path, PathBuf};

/// Tabula - schema-as-data migration toolkit for MSSQL and PostgreSQL
#[derive(Parser, Debug, Clone)]
#[command(name = "tabula")]
#[command(version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["validate", "create", "from_dir", "docs", "check_pairs"])
))]
pub struct Cli {
    /// Validate the table definitions in a directory
    #[arg(long, value_name = "TABLES_DIR")]
    pub validate: Option<PathBuf>,

    /// Write the baseline CREATE script for a directory of table definitions
    #[arg(long, value_name = "TABLES_DIR")]
    pub create: Option<PathBuf>,

    /// Old table definitions (migrate mode)
    #[arg(long, value_name = "TABLES_DIR", requires = "to_dir")]
    pub from_dir: Option<PathBuf>,

    /// Version of the old definitions (default: inferred from --from-dir)
    #[arg(long, value_name = "VERSION", requires = "from_dir")]
    pub from_version: Option<String>,

    /// New table definitions (migrate mode)
    #[arg(long, value_name = "TABLES_DIR", requires = "from_dir")]
    pub to_dir: Option<PathBuf>,

    /// Version of the new definitions (default: inferred from --to-dir)
    #[arg(long, value_name = "VERSION", requires = "from_dir")]
    pub to_version: Option<String>,

    /// Write the Markdown schema reference for a directory of table definitions
    #[arg(long, value_name = "TABLES_DIR")]
    pub docs: Option<PathBuf>,

    /// Check that every forward migration script has its rollback script
    #[arg(long, value_name = "MIGRATIONS_DIR")]
    pub check_pairs: Option<PathBuf>,

    /// Target platform: mssql or postgres
    #[arg(long, env = "TABULA_PLATFORM")]
    pub platform: Option<String>,

    /// Directory generated files are written to
    #[arg(long, short = 'o', value_name = "DIR", env = "TABULA_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML configuration file with a [generator] table
    #[arg(long, value_name = "FILE", env = "TABULA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Schema version for --create and --docs (default: inferred from the path)
    #[arg(long, value_name = "VERSION")]
    pub schema_version: Option<String>,

    /// View definitions for --validate, --create and --docs
    #[arg(long, value_name = "VIEWS_DIR")]
    pub views: Option<PathBuf>,

    /// View definitions of the old schema
    #[arg(long, value_name = "VIEWS_DIR", requires = "from_dir")]
    pub from_views: Option<PathBuf>,

    /// View definitions of the new schema
    #[arg(long, value_name = "VIEWS_DIR", requires = "from_dir")]
    pub to_views: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// The selected mode with its inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode<'a> {
    Validate(&'a Path),
    Create(&'a Path),
    Migrate { from: &'a Path, to: &'a Path },
    Docs(&'a Path),
    CheckPairs(&'a Path),
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// The selected mode; `None` only when clap's group check was bypassed
    pub fn mode(&self) -> Option<Mode<'_>> {
        if let Some(dir) = &self.validate {
            return Some(Mode::Validate(dir));
        }
        if let Some(dir) = &self.create {
            return Some(Mode::Create(dir));
        }
        if let (Some(from), Some(to)) = (&self.from_dir, &self.to_dir) {
            return Some(Mode::Migrate { from, to });
        }
        if let Some(dir) = &self.docs {
            return Some(Mode::Docs(dir));
        }
        self.check_pairs.as_deref().map(Mode::CheckPairs)
    }

    /// Default `tracing` filter directive for the verbosity level
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
