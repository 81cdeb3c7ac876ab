//! View definitions
//!
//! A view's SQL body is dialect-specific and never parsed; only its
//! documented output columns are modelled.

use crate::table::DEFAULT_SCHEMA;
use serde::{Deserialize, Serialize};
use tabula_core::Validatable;

/// A view as declared in one definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// View name (equals the filename stem)
    pub name: String,

    /// Schema qualifier
    #[serde(rename = "schema", default = "default_schema")]
    pub schema_qualifier: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Raw SQL `SELECT` body
    #[serde(default)]
    pub view_definition: String,

    /// Documented output columns
    #[serde(default)]
    pub columns: Vec<ViewColumn>,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl ViewDefinition {
    pub fn new(name: impl Into<String>, view_definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_qualifier: default_schema(),
            description: String::new(),
            view_definition: view_definition.into(),
            columns: Vec::new(),
        }
    }

    /// Append a documented column
    pub fn with_column(mut self, column: ViewColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// The body with surrounding whitespace and trailing semicolons removed
    pub fn body(&self) -> &str {
        self.view_definition.trim().trim_end_matches(';').trim_end()
    }

    /// Whether the SQL-relevant parts differ (description is ignored)
    pub fn differs_from(&self, other: &ViewDefinition) -> bool {
        self.view_definition != other.view_definition || self.columns != other.columns
    }
}

impl Validatable for ViewDefinition {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.body().is_empty() {
            errors.push("view_definition cannot be empty".to_string());
        }
        for column in &self.columns {
            if column.sql_data_type.trim().is_empty() {
                errors.push(format!(
                    "column '{}' has an empty sql_data_type",
                    column.name
                ));
            }
        }
        errors
    }
}

/// A documented output column of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewColumn {
    pub name: String,

    /// SQL type as written by the author, e.g. `NVARCHAR(100)`
    #[serde(default)]
    pub sql_data_type: String,

    /// `Table.Column` this output is taken from, when direct
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,

    #[serde(default)]
    pub description: String,
}

impl ViewColumn {
    pub fn new(name: impl Into<String>, sql_data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_data_type: sql_data_type.into(),
            source_column: None,
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_trims_trailing_semicolon() {
        let view = ViewDefinition::new("v", "  SELECT 1 AS One;\n");
        assert_eq!(view.body(), "SELECT 1 AS One");
    }

    #[test]
    fn test_empty_definition_invalid() {
        let view = ViewDefinition::new("v", " ; ");
        assert!(!view.is_valid());
    }

    #[test]
    fn test_column_needs_sql_type() {
        let view = ViewDefinition::new("v", "SELECT 1 AS One").with_column(ViewColumn::new("One", ""));
        let errors = view.validation_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'One'"));
    }

    #[test]
    fn test_description_change_is_not_a_difference() {
        let a = ViewDefinition::new("v", "SELECT 1 AS One");
        let mut b = a.clone();
        b.description = "documented".to_string();
        assert!(!a.differs_from(&b));
        b.view_definition = "SELECT 2 AS One".to_string();
        assert!(a.differs_from(&b));
    }
}
