//! # Migration Scripts
//!
//! Renders a [`SchemaDiff`] as a pair of SQL scripts (forward and rollback)
//! and a schema as a baseline `CREATE` script.
//!
//! ## Generated Files
//!
//! ```text
//! v{version}_create_{platform}.sql
//! v{from}_to_v{to}_{platform}.sql
//! v{from}_to_v{to}_{platform}_rollback.sql
//! ```
//!
//! Every script starts with a four-line comment header; statements are
//! separated by one blank line. Output is byte-stable for identical inputs
//! apart from the `Generated:` line.

pub mod plan;
pub mod sql;

pub use plan::{MigrationPlan, MigrationStep, TableRef};
pub use sql::render_step;

use crate::diff::SchemaDiff;
use crate::dialect::Dialect;
use chrono::{DateTime, Utc};
use tabula_core::Platform;
use tabula_ir::SchemaModel;

/// Suffix that marks a rollback script
pub const ROLLBACK_SUFFIX: &str = "_rollback.sql";

// ============================================================================
// File naming
// ============================================================================

/// Strip a leading `v`/`V` so `v1.2` and `1.2` name the same files
pub fn normalize_version(version: &str) -> &str {
    let trimmed = version.trim();
    trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed)
}

/// `v{version}_create_{platform}.sql`
pub fn create_script_name(version: &str, platform: Platform) -> String {
    format!("v{}_create_{}.sql", normalize_version(version), platform.as_str())
}

/// `v{from}_to_v{to}_{platform}.sql`
pub fn forward_script_name(from: &str, to: &str, platform: Platform) -> String {
    format!(
        "v{}_to_v{}_{}.sql",
        normalize_version(from),
        normalize_version(to),
        platform.as_str()
    )
}

/// `v{from}_to_v{to}_{platform}_rollback.sql`
pub fn rollback_script_name(from: &str, to: &str, platform: Platform) -> String {
    format!(
        "v{}_to_v{}_{}{}",
        normalize_version(from),
        normalize_version(to),
        platform.as_str(),
        ROLLBACK_SUFFIX
    )
}

// ============================================================================
// MigrationRenderer
// ============================================================================

/// Direction named in a script header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Rollback,
    Create,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Rollback => "rollback",
            Direction::Create => "create",
        }
    }
}

/// Renders plans to complete scripts for one platform
#[derive(Debug, Clone)]
pub struct MigrationRenderer {
    platform: Platform,
    generated_at: DateTime<Utc>,
}

impl MigrationRenderer {
    /// Renderer stamping scripts with the current time
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            generated_at: Utc::now(),
        }
    }

    /// Use a fixed `Generated:` timestamp
    pub fn at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// `(forward_sql, rollback_sql)` for a diff leading to `new_schema`
    pub fn render_migration(
        &self,
        diff: &SchemaDiff,
        new_schema: &SchemaModel,
        from_version: &str,
        to_version: &str,
    ) -> (String, String) {
        let forward = MigrationPlan::forward(diff, new_schema);
        let rollback = forward.rollback();

        let forward_name = forward_script_name(from_version, to_version, self.platform);
        let rollback_name = rollback_script_name(from_version, to_version, self.platform);
        let from = format!("v{}", normalize_version(from_version));
        let to = format!("v{}", normalize_version(to_version));
        let versions = (from.as_str(), to.as_str());

        (
            self.render_plan(&forward, versions, Direction::Forward, &rollback_name),
            self.render_plan(&rollback, versions, Direction::Rollback, &forward_name),
        )
    }

    /// Baseline script creating `schema` from nothing
    pub fn render_create_script(&self, schema: &SchemaModel, version: &str) -> String {
        let plan = MigrationPlan::create(schema);
        self.render_plan(
            &plan,
            ("baseline", &format!("v{}", normalize_version(version))),
            Direction::Create,
            "none (baseline script)",
        )
    }

    /// Header followed by every step's statements. `from` and `to` are the
    /// labels printed in the `Migration:` line.
    pub fn render_plan(
        &self,
        plan: &MigrationPlan,
        (from, to): (&str, &str),
        direction: Direction,
        counterpart: &str,
    ) -> String {
        let mut script = format!(
            "-- Migration: {} -> {} ({})\n\
             -- Platform: {}\n\
             -- Generated: {}\n\
             -- Counterpart: {}\n",
            from,
            to,
            direction.as_str(),
            self.platform.as_str(),
            self.generated_at.format("%Y-%m-%dT%H:%M:%SZ"),
            counterpart
        );

        let dialect = Dialect::new(self.platform);
        let statements: Vec<String> = plan
            .iter()
            .flat_map(|step| render_step(dialect, step))
            .collect();
        if !statements.is_empty() {
            script.push('\n');
            script.push_str(&statements.join("\n\n"));
            script.push('\n');
        }
        script
    }
}

// ============================================================================
// Convenience functions
// ============================================================================

/// `(forward_sql, rollback_sql)` stamped with the current time
pub fn render_migration(
    diff: &SchemaDiff,
    new_schema: &SchemaModel,
    from_version: &str,
    to_version: &str,
    platform: Platform,
) -> (String, String) {
    MigrationRenderer::new(platform).render_migration(diff, new_schema, from_version, to_version)
}

/// Baseline `CREATE` script stamped with the current time
pub fn render_create_script(schema: &SchemaModel, version: &str, platform: Platform) -> String {
    MigrationRenderer::new(platform).render_create_script(schema, version)
}
