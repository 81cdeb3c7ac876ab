//! # SQL Dialects
//!
//! Every difference between the MSSQL and PostgreSQL output lives here:
//! identifier quoting, the logical-to-SQL type table, identity columns,
//! default-value rewrites and the derived constraint names.
//!
//! Nothing in this module parses SQL. Default expressions, check expressions
//! and view bodies are opaque text; at most a few well-known literals are
//! rewritten.

use tabula_core::{LogicalType, MaxLength, Platform};
use tabula_ir::ColumnDefinition;

/// Dialect helpers for one target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    platform: Platform,
}

impl Dialect {
    pub const fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_mssql(&self) -> bool {
        self.platform == Platform::Mssql
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    /// Quote an identifier: `[x]` on MSSQL, `"x"` on Postgres
    pub fn quote(&self, name: &str) -> String {
        match self.platform {
            Platform::Mssql => format!("[{}]", name.replace(']', "]]")),
            Platform::Postgres => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Schema-qualified, quoted object name
    pub fn qualified(&self, schema: &str, name: &str) -> String {
        format!("{}.{}", self.quote(schema), self.quote(name))
    }

    /// Comma-separated quoted column list
    pub fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// SQL type of a column, without any identity decoration
    pub fn column_type(&self, column: &ColumnDefinition) -> String {
        let mssql = self.is_mssql();
        let with_precision = |base: &str| match column.precision {
            Some(p) => format!("{}({})", base, p),
            None => base.to_string(),
        };

        match column.logical_type {
            LogicalType::Integer => (if mssql { "INT" } else { "INTEGER" }).into(),
            LogicalType::BigInteger => "BIGINT".into(),
            LogicalType::SmallInteger => "SMALLINT".into(),
            LogicalType::Float32 => "REAL".into(),
            LogicalType::Float64 => (if mssql { "FLOAT" } else { "DOUBLE PRECISION" }).into(),
            LogicalType::Boolean => (if mssql { "BIT" } else { "BOOLEAN" }).into(),
            LogicalType::Date => "DATE".into(),
            LogicalType::Timestamp => with_precision(if mssql { "DATETIME2" } else { "TIMESTAMP" }),
            LogicalType::TimestampTz => {
                with_precision(if mssql { "DATETIMEOFFSET" } else { "TIMESTAMPTZ" })
            }
            LogicalType::String => match (self.platform, column.max_length) {
                (Platform::Mssql, Some(MaxLength::Length(n))) => format!("NVARCHAR({})", n),
                (Platform::Mssql, _) => "NVARCHAR(MAX)".into(),
                (Platform::Postgres, Some(MaxLength::Length(n))) => format!("VARCHAR({})", n),
                // Postgres has no VARCHAR(MAX); unbounded VARCHAR is the equivalent
                (Platform::Postgres, _) => "VARCHAR".into(),
            },
            LogicalType::Text => (if mssql { "NVARCHAR(MAX)" } else { "TEXT" }).into(),
            LogicalType::Binary => match (self.platform, column.max_length) {
                (Platform::Mssql, Some(MaxLength::Length(n))) => format!("VARBINARY({})", n),
                (Platform::Mssql, _) => "VARBINARY(MAX)".into(),
                (Platform::Postgres, _) => "BYTEA".into(),
            },
            LogicalType::BinaryLarge => (if mssql { "VARBINARY(MAX)" } else { "BYTEA" }).into(),
            LogicalType::Decimal => match (column.precision, column.scale) {
                (Some(p), Some(s)) => format!("NUMERIC({},{})", p, s),
                (Some(p), None) => format!("NUMERIC({})", p),
                _ => "NUMERIC".into(),
            },
        }
    }

    /// Type as written in `CREATE TABLE` / `ADD COLUMN`, where Postgres
    /// replaces identity integers with `SERIAL` / `BIGSERIAL`
    pub fn declared_type(&self, column: &ColumnDefinition) -> String {
        match (self.platform, column.identity, column.logical_type) {
            (Platform::Postgres, true, LogicalType::BigInteger) => "BIGSERIAL".into(),
            (Platform::Postgres, true, _) => "SERIAL".into(),
            (Platform::Mssql, true, _) => format!("{} IDENTITY(1,1)", self.column_type(column)),
            _ => self.column_type(column),
        }
    }

    /// Whether a column renders `NOT NULL`. Identity columns always do.
    pub fn is_not_null(&self, column: &ColumnDefinition) -> bool {
        !column.nullable || column.identity
    }

    // ========================================================================
    // Defaults
    // ========================================================================

    /// The column's default expression rewritten for this platform
    pub fn default_expr(&self, column: &ColumnDefinition) -> Option<String> {
        let raw = column.default.as_deref()?.trim();

        let rewritten = match column.logical_type {
            LogicalType::TimestampTz
                if self.is_mssql() && raw.eq_ignore_ascii_case("CURRENT_TIMESTAMP") =>
            {
                "SYSDATETIMEOFFSET()".to_string()
            }
            LogicalType::Boolean if raw.eq_ignore_ascii_case("true") => {
                (if self.is_mssql() { "1" } else { "TRUE" }).to_string()
            }
            LogicalType::Boolean if raw.eq_ignore_ascii_case("false") => {
                (if self.is_mssql() { "0" } else { "FALSE" }).to_string()
            }
            _ => raw.to_string(),
        };
        Some(rewritten)
    }

    /// Full column definition after the quoted name:
    /// `TYPE[ IDENTITY(1,1)][ NOT NULL][ [CONSTRAINT [DF_T_c] ]DEFAULT x]`
    pub fn column_definition(&self, table: &str, column: &ColumnDefinition) -> String {
        let mut sql = self.declared_type(column);
        if self.is_not_null(column) {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = self.default_expr(column) {
            if self.is_mssql() {
                sql.push_str(&format!(
                    " CONSTRAINT {}",
                    self.quote(&default_constraint_name(table, &column.name))
                ));
            }
            sql.push_str(&format!(" DEFAULT {}", default));
        }
        sql
    }
}

impl From<Platform> for Dialect {
    fn from(platform: Platform) -> Self {
        Self::new(platform)
    }
}

// ============================================================================
// Derived constraint names
// ============================================================================

/// `PK_<table>`
pub fn primary_key_name(table: &str) -> String {
    format!("PK_{}", table)
}

/// `FK_<child_table>_<ref_table>`
pub fn foreign_key_name(child_table: &str, ref_table: &str) -> String {
    format!("FK_{}_{}", child_table, ref_table)
}

/// `DF_<table>_<column>` (MSSQL default constraints)
pub fn default_constraint_name(table: &str, column: &str) -> String {
    format!("DF_{}_{}", table, column)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MSSQL: Dialect = Dialect {
        platform: Platform::Mssql,
    };
    const PG: Dialect = Dialect {
        platform: Platform::Postgres,
    };

    fn col(ty: LogicalType) -> ColumnDefinition {
        ColumnDefinition::new("C", ty)
    }

    #[test]
    fn test_quoting_escapes_delimiters() {
        assert_eq!(MSSQL.quote("Unit"), "[Unit]");
        assert_eq!(MSSQL.quote("odd]name"), "[odd]]name]");
        assert_eq!(PG.quote("Unit"), "\"Unit\"");
        assert_eq!(PG.quote("say\"hi"), "\"say\"\"hi\"");
        assert_eq!(MSSQL.qualified("dbo", "Unit"), "[dbo].[Unit]");
        assert_eq!(PG.qualified("dbo", "Unit"), "\"dbo\".\"Unit\"");
    }

    #[test]
    fn test_every_logical_type_maps_on_both_platforms() {
        for ty in LogicalType::all() {
            let column = col(*ty)
                .with_max_length(MaxLength::Length(10))
                .with_precision(10)
                .with_scale(2);
            assert!(!MSSQL.column_type(&column).is_empty());
            assert!(!PG.column_type(&column).is_empty());
        }
    }

    #[test]
    fn test_type_table() {
        let cases = [
            (col(LogicalType::Integer), "INT", "INTEGER"),
            (col(LogicalType::BigInteger), "BIGINT", "BIGINT"),
            (col(LogicalType::SmallInteger), "SMALLINT", "SMALLINT"),
            (col(LogicalType::Float32), "REAL", "REAL"),
            (col(LogicalType::Float64), "FLOAT", "DOUBLE PRECISION"),
            (col(LogicalType::Boolean), "BIT", "BOOLEAN"),
            (col(LogicalType::Date), "DATE", "DATE"),
            (col(LogicalType::Timestamp), "DATETIME2", "TIMESTAMP"),
            (
                col(LogicalType::Timestamp).with_precision(3),
                "DATETIME2(3)",
                "TIMESTAMP(3)",
            ),
            (col(LogicalType::TimestampTz), "DATETIMEOFFSET", "TIMESTAMPTZ"),
            (col(LogicalType::Text), "NVARCHAR(MAX)", "TEXT"),
            (col(LogicalType::BinaryLarge), "VARBINARY(MAX)", "BYTEA"),
            (
                col(LogicalType::Binary).with_max_length(MaxLength::Length(16)),
                "VARBINARY(16)",
                "BYTEA",
            ),
            (ColumnDefinition::string("C", 100), "NVARCHAR(100)", "VARCHAR(100)"),
            (
                col(LogicalType::String).with_max_length(MaxLength::Max),
                "NVARCHAR(MAX)",
                "VARCHAR",
            ),
            (
                col(LogicalType::Decimal).with_precision(10).with_scale(2),
                "NUMERIC(10,2)",
                "NUMERIC(10,2)",
            ),
        ];
        for (column, mssql, pg) in cases {
            assert_eq!(MSSQL.column_type(&column), mssql, "{:?}", column.logical_type);
            assert_eq!(PG.column_type(&column), pg, "{:?}", column.logical_type);
        }
    }

    #[test]
    fn test_identity_rendering() {
        let int_id = col(LogicalType::Integer).identity();
        let big_id = col(LogicalType::BigInteger).identity();
        assert_eq!(MSSQL.declared_type(&int_id), "INT IDENTITY(1,1)");
        assert_eq!(PG.declared_type(&int_id), "SERIAL");
        assert_eq!(PG.declared_type(&big_id), "BIGSERIAL");
        assert_eq!(MSSQL.column_type(&big_id), "BIGINT");
    }

    #[test]
    fn test_default_rewrites() {
        let stamp = col(LogicalType::TimestampTz).with_default("CURRENT_TIMESTAMP");
        assert_eq!(MSSQL.default_expr(&stamp).as_deref(), Some("SYSDATETIMEOFFSET()"));
        assert_eq!(PG.default_expr(&stamp).as_deref(), Some("CURRENT_TIMESTAMP"));

        let plain = col(LogicalType::Timestamp).with_default("CURRENT_TIMESTAMP");
        assert_eq!(MSSQL.default_expr(&plain).as_deref(), Some("CURRENT_TIMESTAMP"));

        let flag = col(LogicalType::Boolean).with_default("true");
        assert_eq!(MSSQL.default_expr(&flag).as_deref(), Some("1"));
        assert_eq!(PG.default_expr(&flag).as_deref(), Some("TRUE"));
        let off = col(LogicalType::Boolean).with_default("False");
        assert_eq!(MSSQL.default_expr(&off).as_deref(), Some("0"));

        let text = col(LogicalType::String).with_default("'n/a'");
        assert_eq!(PG.default_expr(&text).as_deref(), Some("'n/a'"));
    }

    #[test]
    fn test_column_definition() {
        let id = ColumnDefinition::new("UnitID", LogicalType::Integer).identity();
        assert_eq!(MSSQL.column_definition("Unit", &id), "INT IDENTITY(1,1) NOT NULL");
        assert_eq!(PG.column_definition("Unit", &id), "SERIAL NOT NULL");

        let qty = ColumnDefinition::new("Qty", LogicalType::Integer)
            .not_null()
            .with_default("0");
        assert_eq!(
            MSSQL.column_definition("Item", &qty),
            "INT NOT NULL CONSTRAINT [DF_Item_Qty] DEFAULT 0"
        );
        assert_eq!(PG.column_definition("Item", &qty), "INTEGER NOT NULL DEFAULT 0");
    }

    #[test]
    fn test_constraint_names() {
        assert_eq!(primary_key_name("Unit"), "PK_Unit");
        assert_eq!(foreign_key_name("Child", "Parent"), "FK_Child_Parent");
        assert_eq!(default_constraint_name("T", "c"), "DF_T_c");
    }
}
