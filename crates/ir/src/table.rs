//! Table definitions
//!
//! This module contains [`TableDefinition`] and its table-level parts:
//! indexes, unique constraints and check constraints.

use crate::column::ColumnDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Schema qualifier used when a definition file does not name one
pub const DEFAULT_SCHEMA: &str = "dbo";

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

// ============================================================================
// TableDefinition
// ============================================================================

/// A table as declared in one definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name (equals the filename stem)
    pub name: String,

    /// Schema qualifier, e.g. `dbo`
    #[serde(rename = "schema", default = "default_schema")]
    pub schema_qualifier: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Columns in author order
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,

    /// Primary-key column names, in key order
    #[serde(default)]
    pub primary_key: Vec<String>,

    /// Secondary indexes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexDefinition>,

    /// Named unique constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_constraints: Vec<UniqueConstraint>,

    /// Named check constraints with raw SQL expressions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub check_constraints: Vec<CheckConstraint>,

    /// Rows consumed by install tooling; never interpreted here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_data: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
}

impl TableDefinition {
    /// Create an empty table in the default schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_qualifier: default_schema(),
            description: String::new(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            unique_constraints: Vec::new(),
            check_constraints: Vec::new(),
            seed_data: None,
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the schema qualifier
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema_qualifier = schema.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a column
    pub fn with_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append an index
    pub fn with_index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Append a unique constraint
    pub fn with_unique(mut self, constraint: UniqueConstraint) -> Self {
        self.unique_constraints.push(constraint);
        self
    }

    /// Append a check constraint
    pub fn with_check(mut self, constraint: CheckConstraint) -> Self {
        self.check_constraints.push(constraint);
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Set of column names
    pub fn column_names(&self) -> HashSet<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Columns that carry a foreign key
    pub fn foreign_key_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.is_foreign_key())
    }

    /// Whether any column references another table
    pub fn has_outgoing_foreign_keys(&self) -> bool {
        self.columns.iter().any(|c| c.is_foreign_key())
    }

    /// Distinct tables this table references, sorted
    pub fn referenced_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self
            .foreign_key_columns()
            .filter_map(|c| c.foreign_key.as_ref())
            .map(|fk| fk.table.clone())
            .collect();
        tables.sort();
        tables.dedup();
        tables
    }

    /// Look up an index by name
    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

// ============================================================================
// Indexes and constraints
// ============================================================================

/// A secondary index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name
    pub name: String,

    /// Indexed columns, in key order
    pub columns: Vec<String>,

    /// Whether the index enforces uniqueness
    #[serde(default)]
    pub unique: bool,
}

impl IndexDefinition {
    /// Create a non-unique index
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    /// Make the index unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A named UNIQUE constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub name: String,
    pub columns: Vec<String>,
}

impl UniqueConstraint {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// A named CHECK constraint. The expression is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckConstraint {
    pub name: String,
    pub expression: String,
}

impl CheckConstraint {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::LogicalType;

    fn order_table() -> TableDefinition {
        TableDefinition::new("Order")
            .with_column(ColumnDefinition::new("OrderID", LogicalType::Integer).identity())
            .with_column(
                ColumnDefinition::new("CustomerID", LogicalType::Integer)
                    .not_null()
                    .references("Customer", "CustomerID"),
            )
            .with_column(
                ColumnDefinition::new("UnitID", LogicalType::Integer).references("Unit", "UnitID"),
            )
            .with_column(
                ColumnDefinition::new("BackupCustomerID", LogicalType::Integer)
                    .references("Customer", "CustomerID"),
            )
            .with_primary_key(["OrderID"])
    }

    #[test]
    fn test_schema_defaults_to_dbo() {
        let table: TableDefinition = serde_json::from_str(r#"{"name": "T"}"#).unwrap();
        assert_eq!(table.schema_qualifier, "dbo");
        assert!(table.columns.is_empty());
        assert!(table.seed_data.is_none());
    }

    #[test]
    fn test_schema_key_renamed() {
        let table: TableDefinition =
            serde_json::from_str(r#"{"name": "T", "schema": "sales"}"#).unwrap();
        assert_eq!(table.schema_qualifier, "sales");
    }

    #[test]
    fn test_column_lookup() {
        let table = order_table();
        assert!(table.has_column("CustomerID"));
        assert!(!table.has_column("customerid"));
        assert_eq!(table.column_names().len(), 4);
    }

    #[test]
    fn test_referenced_tables_sorted_and_distinct() {
        let table = order_table();
        assert!(table.has_outgoing_foreign_keys());
        assert_eq!(table.referenced_tables(), vec!["Customer", "Unit"]);
    }

    #[test]
    fn test_seed_data_kept_opaque() {
        let table: TableDefinition = serde_yaml::from_str(
            "name: Unit\nseed_data:\n  - UnitID: 1\n    Name: Each\n",
        )
        .unwrap();
        let rows = table.seed_data.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Name"], serde_json::json!("Each"));
    }
}
