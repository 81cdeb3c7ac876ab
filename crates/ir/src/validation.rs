//! Validation rules and utilities for the schema model
//!
//! This module checks a loaded [`SchemaModel`] for structural and referential
//! integrity before any SQL is produced. Problems are collected, never
//! raised: every rule runs and the caller sees the complete list.

use crate::SchemaModel;
use crate::schema::ViewMap;
use std::collections::{BTreeMap, HashSet};
use tabula_core::{LogicalType, TabulaError, TabulaResult, Validatable};

// ============================================================================
// ValidationResult
// ============================================================================

/// Result of a validation operation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// List of errors (empty if valid)
    pub errors: Vec<ValidationError>,

    /// List of warnings (non-fatal issues)
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create a failed validation result with an error
    pub fn error(error: ValidationError) -> Self {
        Self {
            valid: false,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Add a warning to the result
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Rendered error messages, one sentence each
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    /// Convert to TabulaResult (fails if any errors)
    pub fn to_result(self) -> TabulaResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(TabulaError::validation(&self.messages()))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// ValidationError
// ============================================================================

/// A validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Location of the problem: `Table` or `Table.Column`
    pub path: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Add a path to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] {} (rule: {})", path, self.message, self.code)
        } else {
            write!(f, "{} (rule: {})", self.message, self.code)
        }
    }
}

// ============================================================================
// ValidationErrorCode
// ============================================================================

/// Error codes for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    // Table errors
    NameMismatch,
    NoColumns,
    DuplicateColumnName,

    // Column errors
    EmptyColumnName,
    IdentityType,
    StringMaxLength,
    DecimalPrecisionScale,

    // Key errors
    NoPrimaryKey,
    UnknownPrimaryKeyColumn,
    EmptyIndex,
    UnknownIndexColumn,
    UnknownUniqueColumn,
    DuplicateConstraintName,
    EmptyCheckExpression,

    // Foreign key errors
    UnknownReferencedTable,
    UnknownReferencedColumn,
    ForeignKeyNameCollision,

    // View errors
    InvalidView,
    ViewNameCollision,
}

impl ValidationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorCode::NameMismatch => "name_mismatch",
            ValidationErrorCode::NoColumns => "no_columns",
            ValidationErrorCode::DuplicateColumnName => "duplicate_column",
            ValidationErrorCode::EmptyColumnName => "empty_column_name",
            ValidationErrorCode::IdentityType => "identity_type",
            ValidationErrorCode::StringMaxLength => "string_max_length",
            ValidationErrorCode::DecimalPrecisionScale => "decimal_precision_scale",
            ValidationErrorCode::NoPrimaryKey => "no_primary_key",
            ValidationErrorCode::UnknownPrimaryKeyColumn => "primary_key_column",
            ValidationErrorCode::EmptyIndex => "empty_index",
            ValidationErrorCode::UnknownIndexColumn => "index_column",
            ValidationErrorCode::UnknownUniqueColumn => "unique_column",
            ValidationErrorCode::DuplicateConstraintName => "duplicate_constraint_name",
            ValidationErrorCode::EmptyCheckExpression => "empty_check_expression",
            ValidationErrorCode::UnknownReferencedTable => "fk_table",
            ValidationErrorCode::UnknownReferencedColumn => "fk_column",
            ValidationErrorCode::ForeignKeyNameCollision => "fk_name_collision",
            ValidationErrorCode::InvalidView => "view_definition",
            ValidationErrorCode::ViewNameCollision => "view_name_collision",
        }
    }
}

impl std::fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ValidationWarning
// ============================================================================

/// A validation warning (non-fatal issue)
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Warning code
    pub code: ValidationWarningCode,

    /// Human-readable warning message
    pub message: String,

    /// Path to the element
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Create a new warning
    pub fn new(code: ValidationWarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Add a path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] Warning: {}", path, self.message)
        } else {
            write!(f, "Warning: {}", self.message)
        }
    }
}

// ============================================================================
// ValidationWarningCode
// ============================================================================

/// Warning codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationWarningCode {
    NoDescription,
    IgnoredModifier,
    NullableIdentity,
}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait for validation rules
pub trait ValidationRule {
    /// Get the rule name
    fn name(&self) -> &'static str;

    /// Get the rule description
    fn description(&self) -> &'static str;

    /// Validate a schema and return the result
    fn validate(&self, schema: &SchemaModel) -> ValidationResult;
}

// ============================================================================
// Validator
// ============================================================================

/// Schema validator that runs multiple validation rules
#[derive(Default)]
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a validator with the table rules only
    pub fn table_rules() -> Self {
        let mut validator = Self::new();
        validator.add_rule(Box::new(TableStructureRule));
        validator.add_rule(Box::new(ColumnTypesRule));
        validator.add_rule(Box::new(KeysRule));
        validator.add_rule(Box::new(ForeignKeysRule));
        validator
    }

    /// Create a validator with default rules (tables and views)
    pub fn with_default_rules() -> Self {
        let mut validator = Self::table_rules();
        validator.add_rule(Box::new(ViewsRule));
        validator
    }

    /// Add a validation rule
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Names of the configured rules, in run order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Validate a schema with all rules
    pub fn validate(&self, schema: &SchemaModel) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for rule in &self.rules {
            let rule_result = rule.validate(schema);
            result.merge(rule_result);
        }

        result
    }

    /// Validate and return Result
    pub fn validate_result(&self, schema: &SchemaModel) -> TabulaResult<()> {
        self.validate(schema).to_result()
    }
}

// ============================================================================
// Public entry points
// ============================================================================

/// Validate the tables of a schema. An empty list means valid.
pub fn validate_schema(schema: &SchemaModel) -> Vec<String> {
    Validator::table_rules().validate(schema).messages()
}

/// Validate a set of views on their own. An empty list means valid.
pub fn validate_views(views: &ViewMap) -> Vec<String> {
    let schema = SchemaModel::new().with_views(views.clone());
    let mut validator = Validator::new();
    validator.add_rule(Box::new(ViewsRule));
    validator.validate(&schema).messages()
}

/// Validate tables and views together, including the shared name space
pub fn validate_model(schema: &SchemaModel) -> ValidationResult {
    Validator::with_default_rules().validate(schema)
}

// ============================================================================
// Built-in Validation Rules
// ============================================================================

/// Rule: Validate table shape
pub struct TableStructureRule;

impl ValidationRule for TableStructureRule {
    fn name(&self) -> &'static str {
        "table_structure"
    }

    fn description(&self) -> &'static str {
        "Validates that tables have uniquely named columns"
    }

    fn validate(&self, schema: &SchemaModel) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for (key, table) in &schema.tables {
            if key != &table.name {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::NameMismatch,
                        format!("table is registered as '{}' but named '{}'", key, table.name),
                    )
                    .with_path(key),
                );
            }

            if table.columns.is_empty() {
                result.add_error(
                    ValidationError::new(ValidationErrorCode::NoColumns, "table has no columns")
                        .with_path(&table.name),
                );
            }

            let mut seen: HashSet<&str> = HashSet::new();
            for column in &table.columns {
                if !seen.insert(column.name.as_str()) {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DuplicateColumnName,
                            format!("column '{}' is declared more than once", column.name),
                        )
                        .with_path(format!("{}.{}", table.name, column.name)),
                    );
                }
            }

            if table.description.trim().is_empty() {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::NoDescription,
                        "table has no description",
                    )
                    .with_path(&table.name),
                );
            }
        }

        result
    }
}

/// Rule: Validate column types and their modifiers
pub struct ColumnTypesRule;

impl ValidationRule for ColumnTypesRule {
    fn name(&self) -> &'static str {
        "column_types"
    }

    fn description(&self) -> &'static str {
        "Validates identity, string length and decimal modifiers"
    }

    fn validate(&self, schema: &SchemaModel) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for table in schema.tables() {
            for column in &table.columns {
                let path = format!("{}.{}", table.name, column.name);
                let ty = column.logical_type;

                if column.name.trim().is_empty() {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::EmptyColumnName,
                            "column name cannot be empty",
                        )
                        .with_path(&table.name),
                    );
                }

                if column.identity && !ty.supports_identity() {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::IdentityType,
                            format!(
                                "identity is only allowed on integer or biginteger columns, not {}",
                                ty
                            ),
                        )
                        .with_path(&path),
                    );
                }

                if ty == LogicalType::String && column.max_length.is_none() {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::StringMaxLength,
                            "string column requires max_length (an integer or \"max\")",
                        )
                        .with_path(&path),
                    );
                }

                if ty == LogicalType::Decimal {
                    match (column.precision, column.scale) {
                        (Some(p), Some(s)) if s > p => result.add_error(
                            ValidationError::new(
                                ValidationErrorCode::DecimalPrecisionScale,
                                format!("decimal scale {} exceeds precision {}", s, p),
                            )
                            .with_path(&path),
                        ),
                        (Some(_), Some(_)) => {}
                        _ => result.add_error(
                            ValidationError::new(
                                ValidationErrorCode::DecimalPrecisionScale,
                                "decimal column requires both precision and scale",
                            )
                            .with_path(&path),
                        ),
                    }
                }

                let ignored: Vec<&str> = [
                    (column.max_length.is_some() && !ty.uses_max_length(), "max_length"),
                    (column.precision.is_some() && !ty.uses_precision(), "precision"),
                    (column.scale.is_some() && !ty.uses_scale(), "scale"),
                ]
                .into_iter()
                .filter_map(|(set, name)| set.then_some(name))
                .collect();
                if !ignored.is_empty() {
                    result.add_warning(
                        ValidationWarning::new(
                            ValidationWarningCode::IgnoredModifier,
                            format!("{} has no effect on {} columns", ignored.join(", "), ty),
                        )
                        .with_path(&path),
                    );
                }

                if column.identity && column.nullable {
                    result.add_warning(
                        ValidationWarning::new(
                            ValidationWarningCode::NullableIdentity,
                            "identity column is declared nullable; it is rendered NOT NULL",
                        )
                        .with_path(&path),
                    );
                }
            }
        }

        result
    }
}

/// Rule: Validate primary keys, indexes and named constraints
pub struct KeysRule;

impl ValidationRule for KeysRule {
    fn name(&self) -> &'static str {
        "keys"
    }

    fn description(&self) -> &'static str {
        "Validates that key, index and constraint columns exist"
    }

    fn validate(&self, schema: &SchemaModel) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for table in schema.tables() {
            let columns = table.column_names();

            if table.primary_key.is_empty() {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::NoPrimaryKey,
                        "primary_key must list at least one column",
                    )
                    .with_path(&table.name),
                );
            }
            for name in &table.primary_key {
                if !columns.contains(name.as_str()) {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::UnknownPrimaryKeyColumn,
                            format!("primary key column '{}' is not a column of the table", name),
                        )
                        .with_path(format!("{}.{}", table.name, name)),
                    );
                }
            }

            let mut constraint_names: HashSet<String> = HashSet::new();
            let mut check_name = |result: &mut ValidationResult, name: &str, kind: &str| {
                if !constraint_names.insert(name.to_string()) {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DuplicateConstraintName,
                            format!("{} name '{}' is used more than once", kind, name),
                        )
                        .with_path(&table.name),
                    );
                }
            };

            for index in &table.indexes {
                check_name(&mut result, &index.name, "index");
                if index.columns.is_empty() {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::EmptyIndex,
                            format!("index '{}' has no columns", index.name),
                        )
                        .with_path(&table.name),
                    );
                }
                for name in &index.columns {
                    if !columns.contains(name.as_str()) {
                        result.add_error(
                            ValidationError::new(
                                ValidationErrorCode::UnknownIndexColumn,
                                format!(
                                    "index '{}' lists '{}', which is not a column of the table",
                                    index.name, name
                                ),
                            )
                            .with_path(format!("{}.{}", table.name, name)),
                        );
                    }
                }
            }

            for unique in &table.unique_constraints {
                check_name(&mut result, &unique.name, "unique constraint");
                if unique.columns.is_empty() {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::EmptyIndex,
                            format!("unique constraint '{}' has no columns", unique.name),
                        )
                        .with_path(&table.name),
                    );
                }
                for name in &unique.columns {
                    if !columns.contains(name.as_str()) {
                        result.add_error(
                            ValidationError::new(
                                ValidationErrorCode::UnknownUniqueColumn,
                                format!(
                                    "unique constraint '{}' lists '{}', which is not a column of the table",
                                    unique.name, name
                                ),
                            )
                            .with_path(format!("{}.{}", table.name, name)),
                        );
                    }
                }
            }

            for check in &table.check_constraints {
                check_name(&mut result, &check.name, "check constraint");
                if check.expression.trim().is_empty() {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::EmptyCheckExpression,
                            format!("check constraint '{}' has an empty expression", check.name),
                        )
                        .with_path(&table.name),
                    );
                }
            }
        }

        result
    }
}

/// Rule: Validate that foreign keys resolve
pub struct ForeignKeysRule;

impl ValidationRule for ForeignKeysRule {
    fn name(&self) -> &'static str {
        "foreign_keys"
    }

    fn description(&self) -> &'static str {
        "Validates that foreign keys reference existing tables and columns"
    }

    fn validate(&self, schema: &SchemaModel) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for table in schema.tables() {
            // ref_table -> first child column referencing it
            let mut targets: BTreeMap<&str, &str> = BTreeMap::new();

            for column in table.foreign_key_columns() {
                let Some(fk) = column.foreign_key.as_ref() else {
                    continue;
                };
                let path = format!("{}.{}", table.name, column.name);

                match schema.table(&fk.table) {
                    None => result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::UnknownReferencedTable,
                            format!("foreign key references unknown table '{}'", fk.table),
                        )
                        .with_path(&path),
                    ),
                    Some(target) if !target.has_column(&fk.column) => result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::UnknownReferencedColumn,
                            format!(
                                "foreign key references unknown column '{}.{}'",
                                fk.table, fk.column
                            ),
                        )
                        .with_path(&path),
                    ),
                    Some(_) => {}
                }

                if let Some(first) = targets.get(fk.table.as_str()) {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::ForeignKeyNameCollision,
                            format!(
                                "a second foreign key to '{}' would reuse constraint name FK_{}_{} (already taken by '{}')",
                                fk.table, table.name, fk.table, first
                            ),
                        )
                        .with_path(&path),
                    );
                } else {
                    targets.insert(fk.table.as_str(), column.name.as_str());
                }
            }
        }

        result
    }
}

/// Rule: Validate views
pub struct ViewsRule;

impl ValidationRule for ViewsRule {
    fn name(&self) -> &'static str {
        "views"
    }

    fn description(&self) -> &'static str {
        "Validates view bodies, documented columns and the shared table/view name space"
    }

    fn validate(&self, schema: &SchemaModel) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for (key, view) in &schema.views {
            if key != &view.name {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::NameMismatch,
                        format!("view is registered as '{}' but named '{}'", key, view.name),
                    )
                    .with_path(key),
                );
            }

            for message in view.validation_errors() {
                result.add_error(
                    ValidationError::new(ValidationErrorCode::InvalidView, message)
                        .with_path(&view.name),
                );
            }

            if schema.tables.contains_key(&view.name) {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::ViewNameCollision,
                        "a table with the same name already exists",
                    )
                    .with_path(&view.name),
                );
            }
        }

        result
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CheckConstraint, ColumnDefinition, IndexDefinition, TableDefinition, UniqueConstraint,
        ViewColumn, ViewDefinition,
    };
    use tabula_core::MaxLength;

    fn unit() -> TableDefinition {
        TableDefinition::new("Unit")
            .with_description("Units of measure")
            .with_column(ColumnDefinition::new("UnitID", LogicalType::Integer).identity())
            .with_column(ColumnDefinition::string("Name", 100).not_null())
            .with_primary_key(["UnitID"])
    }

    fn item() -> TableDefinition {
        TableDefinition::new("Item")
            .with_description("Stock items")
            .with_column(ColumnDefinition::new("ItemID", LogicalType::Integer).identity())
            .with_column(
                ColumnDefinition::new("UnitID", LogicalType::Integer).references("Unit", "UnitID"),
            )
            .with_primary_key(["ItemID"])
            .with_index(IndexDefinition::new("IX_Item_UnitID", ["UnitID"]))
    }

    fn has_code(result: &ValidationResult, code: ValidationErrorCode) -> bool {
        result.errors.iter().any(|e| e.code == code)
    }

    #[test]
    fn test_validation_result_merge() {
        let mut result1 = ValidationResult::ok();
        let result2 = ValidationResult::error(ValidationError::new(
            ValidationErrorCode::NoColumns,
            "Error",
        ));

        result1.merge(result2);
        assert!(!result1.valid);
        assert!(result1.has_errors());
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::new(ValidationErrorCode::StringMaxLength, "needs a length")
            .with_path("Unit.Name");
        assert_eq!(
            error.to_string(),
            "[Unit.Name] needs a length (rule: string_max_length)"
        );
    }

    #[test]
    fn test_valid_schema_has_no_errors() {
        let schema = SchemaModel::from_tables([unit(), item()]);
        assert!(validate_schema(&schema).is_empty());
        let result = validate_model(&schema);
        assert!(result.valid);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_unresolved_foreign_key_table() {
        let schema = SchemaModel::from_tables([item()]);
        let errors = validate_schema(&schema);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("[Item.UnitID]"));
        assert!(errors[0].contains("unknown table 'Unit'"));
        assert!(errors[0].contains("fk_table"));
    }

    #[test]
    fn test_unresolved_foreign_key_column() {
        let mut bad = item();
        bad.columns[1] =
            ColumnDefinition::new("UnitID", LogicalType::Integer).references("Unit", "Code");
        let schema = SchemaModel::from_tables([unit(), bad]);
        let result = Validator::table_rules().validate(&schema);
        assert!(has_code(&result, ValidationErrorCode::UnknownReferencedColumn));
    }

    #[test]
    fn test_foreign_key_name_collision() {
        let order = TableDefinition::new("Order")
            .with_column(ColumnDefinition::new("OrderID", LogicalType::Integer).identity())
            .with_column(
                ColumnDefinition::new("UnitID", LogicalType::Integer).references("Unit", "UnitID"),
            )
            .with_column(
                ColumnDefinition::new("AltUnitID", LogicalType::Integer)
                    .references("Unit", "UnitID"),
            )
            .with_primary_key(["OrderID"]);
        let schema = SchemaModel::from_tables([unit(), order]);
        let errors = validate_schema(&schema);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("FK_Order_Unit"));
        assert!(errors[0].contains("[Order.AltUnitID]"));
    }

    #[test]
    fn test_self_reference_resolves() {
        let node = TableDefinition::new("Node")
            .with_description("Tree")
            .with_column(ColumnDefinition::new("NodeID", LogicalType::Integer).identity())
            .with_column(
                ColumnDefinition::new("ParentID", LogicalType::Integer)
                    .references("Node", "NodeID"),
            )
            .with_primary_key(["NodeID"]);
        assert!(validate_schema(&SchemaModel::from_tables([node])).is_empty());
    }

    #[test]
    fn test_primary_key_rules() {
        let mut table = unit();
        table.primary_key = vec!["Missing".to_string()];
        let result = Validator::table_rules().validate(&SchemaModel::from_tables([table]));
        assert!(has_code(&result, ValidationErrorCode::UnknownPrimaryKeyColumn));
        assert_eq!(
            result.errors[0].path.as_deref(),
            Some("Unit.Missing")
        );

        let mut table = unit();
        table.primary_key.clear();
        let result = Validator::table_rules().validate(&SchemaModel::from_tables([table]));
        assert!(has_code(&result, ValidationErrorCode::NoPrimaryKey));
    }

    #[test]
    fn test_index_and_unique_columns_must_exist() {
        let table = unit()
            .with_index(IndexDefinition::new("IX_Unit_Code", ["Code"]))
            .with_index(IndexDefinition::new("IX_Unit_Empty", Vec::<String>::new()))
            .with_unique(UniqueConstraint::new("UQ_Unit_Abbrev", ["Abbrev"]));
        let result = Validator::table_rules().validate(&SchemaModel::from_tables([table]));
        assert!(has_code(&result, ValidationErrorCode::UnknownIndexColumn));
        assert!(has_code(&result, ValidationErrorCode::EmptyIndex));
        assert!(has_code(&result, ValidationErrorCode::UnknownUniqueColumn));
    }

    #[test]
    fn test_duplicate_names() {
        let table = unit()
            .with_column(ColumnDefinition::string("Name", 50))
            .with_index(IndexDefinition::new("UQ_Name", ["Name"]))
            .with_unique(UniqueConstraint::new("UQ_Name", ["Name"]))
            .with_check(CheckConstraint::new("CK_Empty", "  "));
        let result = Validator::table_rules().validate(&SchemaModel::from_tables([table]));
        assert!(has_code(&result, ValidationErrorCode::DuplicateColumnName));
        assert!(has_code(&result, ValidationErrorCode::DuplicateConstraintName));
        assert!(has_code(&result, ValidationErrorCode::EmptyCheckExpression));
    }

    #[test]
    fn test_column_type_invariants() {
        let table = TableDefinition::new("Bad")
            .with_column(ColumnDefinition::string("Code", 10).identity())
            .with_column(ColumnDefinition::new("Name", LogicalType::String))
            .with_column(ColumnDefinition::new("Price", LogicalType::Decimal).with_precision(10))
            .with_column(
                ColumnDefinition::new("Ratio", LogicalType::Decimal)
                    .with_precision(2)
                    .with_scale(5),
            )
            .with_primary_key(["Code"]);
        let errors = validate_schema(&SchemaModel::from_tables([table]));
        assert_eq!(errors.len(), 4);
        assert!(errors[0].starts_with("[Bad.Code]") && errors[0].contains("identity_type"));
        assert!(errors[1].starts_with("[Bad.Name]") && errors[1].contains("string_max_length"));
        assert!(errors[2].starts_with("[Bad.Price]"));
        assert!(errors[3].contains("exceeds precision"));
    }

    #[test]
    fn test_string_max_sentinel_is_valid() {
        let table = TableDefinition::new("Doc")
            .with_column(ColumnDefinition::new("DocID", LogicalType::BigInteger).identity())
            .with_column(
                ColumnDefinition::new("Body", LogicalType::String).with_max_length(MaxLength::Max),
            )
            .with_primary_key(["DocID"]);
        assert!(validate_schema(&SchemaModel::from_tables([table])).is_empty());
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let mut id = ColumnDefinition::new("ID", LogicalType::Integer);
        id.identity = true;
        let table = TableDefinition::new("T")
            .with_column(id)
            .with_column(ColumnDefinition::new("Flag", LogicalType::Boolean).with_max_length(
                MaxLength::Length(1),
            ))
            .with_primary_key(["ID"]);
        let result = validate_model(&SchemaModel::from_tables([table]));
        assert!(result.valid);
        let codes: Vec<ValidationWarningCode> = result.warnings.iter().map(|w| w.code).collect();
        assert!(codes.contains(&ValidationWarningCode::NoDescription));
        assert!(codes.contains(&ValidationWarningCode::IgnoredModifier));
        assert!(codes.contains(&ValidationWarningCode::NullableIdentity));
    }

    #[test]
    fn test_validate_views() {
        let mut views = ViewMap::new();
        views.insert(
            "vGood".to_string(),
            ViewDefinition::new("vGood", "SELECT 1 AS One").with_column(ViewColumn::new("One", "INT")),
        );
        views.insert(
            "vBad".to_string(),
            ViewDefinition::new("vBad", "").with_column(ViewColumn::new("X", "")),
        );
        let errors = validate_views(&views);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.starts_with("[vBad]")));
    }

    #[test]
    fn test_view_name_collides_with_table() {
        let schema = SchemaModel::from_tables([unit()])
            .with_view(ViewDefinition::new("Unit", "SELECT UnitID FROM dbo.Unit"));
        let result = validate_model(&schema);
        assert!(has_code(&result, ValidationErrorCode::ViewNameCollision));
        assert!(result.to_result().unwrap_err().is_validation());
    }

    #[test]
    fn test_default_rules() {
        let validator = Validator::with_default_rules();
        assert_eq!(
            validator.rule_names(),
            vec!["table_structure", "column_types", "keys", "foreign_keys", "views"]
        );
    }
}
