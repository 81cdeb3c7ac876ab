//! # Tabula CLI
//!
//! Command-line interface for Tabula.
//!
//! ## Modes
//!
//! - `--validate` - Validate a directory of table (and view) definitions
//! - `--create` - Write the baseline `CREATE` script of one schema version
//! - `--from-dir` / `--to-dir` - Write a forward and rollback migration pair
//! - `--docs` - Write the Markdown schema reference
//! - `--check-pairs` - Check that every migration has its rollback script
//!
//! Exit codes: 0 success, 1 validation errors or unpaired scripts,
//! 2 load or IO failure.

pub mod args;
pub mod commands;

pub use args::{Cli, Mode};
pub use commands::{ExitStatus, infer_version, run, sibling_views};

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "tabula_cli");
    }
}
