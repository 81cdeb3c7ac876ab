//! Column definitions
//!
//! This module contains [`ColumnDefinition`] and the types hanging off it:
//! the foreign-key reference and the [`TypeSignature`] the differ compares.

use serde::{Deserialize, Deserializer, Serialize};
use tabula_core::{LogicalType, MaxLength, ReferentialAction};

// ============================================================================
// ColumnDefinition
// ============================================================================

/// A single column of a table, in author order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Platform-independent type
    pub logical_type: LogicalType,

    /// Length for `string` / `binary`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<MaxLength>,

    /// Precision for `timestamp` / `timestamptz` / `decimal`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    /// Scale for `decimal`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// Whether NULL is allowed
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Whether the column is an auto-incrementing identity
    #[serde(default)]
    pub identity: bool,

    /// Default value, as opaque SQL text
    #[serde(
        default,
        deserialize_with = "opaque_sql",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Outgoing foreign-key reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
}

fn default_nullable() -> bool {
    true
}

/// Accept any scalar for `default` and keep it as SQL text.
fn opaque_sql<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "default must be a scalar SQL expression, found {}",
            other
        ))),
    }
}

impl ColumnDefinition {
    /// Create a nullable column with no modifiers
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            max_length: None,
            precision: None,
            scale: None,
            nullable: true,
            identity: false,
            default: None,
            description: None,
            foreign_key: None,
        }
    }

    /// Create a `string` column of the given length
    pub fn string(name: impl Into<String>, max_length: u32) -> Self {
        Self::new(name, LogicalType::String).with_max_length(MaxLength::Length(max_length))
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Mark the column NOT NULL
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the column as an identity column (implies NOT NULL)
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self.nullable = false;
        self
    }

    /// Set `max_length`
    pub fn with_max_length(mut self, max_length: MaxLength) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set `precision`
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Set `scale`
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set the default SQL expression
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reference another table's column
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef::new(table, column));
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The attributes whose equality decides whether two definitions are
    /// equivalent for diffing. `description` is not part of it.
    pub fn type_signature(&self) -> TypeSignature {
        TypeSignature {
            logical_type: self.logical_type,
            max_length: self.max_length,
            precision: self.precision,
            scale: self.scale,
            nullable: self.nullable,
            identity: self.identity,
            default: self.default.clone(),
        }
    }

    /// Whether this column carries an outgoing foreign key
    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }

    /// Short type label for documentation, e.g. `string(100)` or `decimal(10,2)`
    pub fn type_label(&self) -> String {
        let base = self.logical_type.as_str();
        match (self.max_length, self.precision, self.scale) {
            (Some(len), _, _) => format!("{}({})", base, len),
            (None, Some(p), Some(s)) => format!("{}({},{})", base, p, s),
            (None, Some(p), None) => format!("{}({})", base, p),
            _ => base.to_string(),
        }
    }
}

// ============================================================================
// TypeSignature
// ============================================================================

/// `(logical_type, max_length, precision, scale, nullable, identity, default)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeSignature {
    pub logical_type: LogicalType,
    pub max_length: Option<MaxLength>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
    pub identity: bool,
    pub default: Option<String>,
}

// ============================================================================
// ForeignKeyRef
// ============================================================================

/// Reference from a column to a column of another (or the same) table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table name
    pub table: String,

    /// Referenced column name
    pub column: String,

    /// Action when the referenced row is deleted
    #[serde(default, skip_serializing_if = "ReferentialAction::is_default")]
    pub on_delete: ReferentialAction,

    /// Action when the referenced key is updated
    #[serde(default, skip_serializing_if = "ReferentialAction::is_default")]
    pub on_update: ReferentialAction,
}

impl ForeignKeyRef {
    /// Create a reference with default referential actions
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        }
    }

    /// Set the ON DELETE action
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_when_deserializing() {
        let col: ColumnDefinition =
            serde_json::from_str(r#"{"name": "Note", "logical_type": "text"}"#).unwrap();
        assert!(col.nullable);
        assert!(!col.identity);
        assert_eq!(col.default, None);
        assert_eq!(col.foreign_key, None);
    }

    #[test]
    fn test_scalar_defaults_become_sql_text() {
        let col: ColumnDefinition = serde_yaml::from_str(
            "name: Active\nlogical_type: boolean\ndefault: true\n",
        )
        .unwrap();
        assert_eq!(col.default.as_deref(), Some("true"));

        let col: ColumnDefinition =
            serde_yaml::from_str("name: Qty\nlogical_type: integer\ndefault: 0\n").unwrap();
        assert_eq!(col.default.as_deref(), Some("0"));

        let col: ColumnDefinition = serde_yaml::from_str(
            "name: Created\nlogical_type: timestamptz\ndefault: CURRENT_TIMESTAMP\n",
        )
        .unwrap();
        assert_eq!(col.default.as_deref(), Some("CURRENT_TIMESTAMP"));
    }

    #[test]
    fn test_structured_default_rejected() {
        let res: Result<ColumnDefinition, _> = serde_json::from_str(
            r#"{"name": "X", "logical_type": "integer", "default": [1, 2]}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_signature_ignores_description() {
        let a = ColumnDefinition::string("Name", 100).with_description("old");
        let b = ColumnDefinition::string("Name", 100).with_description("new");
        assert_eq!(a.type_signature(), b.type_signature());

        let c = ColumnDefinition::string("Name", 200);
        assert_ne!(a.type_signature(), c.type_signature());
    }

    #[test]
    fn test_identity_builder_implies_not_null() {
        let col = ColumnDefinition::new("ID", LogicalType::Integer).identity();
        assert!(col.identity);
        assert!(!col.nullable);
    }

    #[test]
    fn test_type_label() {
        assert_eq!(ColumnDefinition::string("N", 100).type_label(), "string(100)");
        let dec = ColumnDefinition::new("P", LogicalType::Decimal)
            .with_precision(10)
            .with_scale(2);
        assert_eq!(dec.type_label(), "decimal(10,2)");
        assert_eq!(
            ColumnDefinition::new("I", LogicalType::Integer).type_label(),
            "integer"
        );
    }

    #[test]
    fn test_foreign_key_actions_parse() {
        let col: ColumnDefinition = serde_yaml::from_str(
            "name: ParentID\nlogical_type: integer\nforeign_key:\n  table: Parent\n  column: ParentID\n  on_delete: cascade\n",
        )
        .unwrap();
        let fk = col.foreign_key.unwrap();
        assert_eq!(fk.table, "Parent");
        assert_eq!(fk.on_delete, ReferentialAction::Cascade);
        assert_eq!(fk.on_update, ReferentialAction::NoAction);
    }
}
