//! Tabula
//!
//! Schema-as-data migration toolkit for MSSQL and PostgreSQL.
//!
//! This is the command-line entry point.

use tabula_cli::{Cli, run};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse_args();

    // RUST_LOG wins over -v
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let status = run(&cli);
    std::process::exit(status.code());
}
