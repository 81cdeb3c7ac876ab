//! # Tabula IR (Intermediate Representation)
//!
//! This crate provides the in-memory schema model that every pipeline stage
//! reads, together with the two stages that produce a trustworthy model:
//! the loader and the validator.
//!
//! ## Core Concepts
//!
//! - **TableDefinition**: one table, loaded from one definition file
//! - **ColumnDefinition**: a typed column with an optional foreign key
//! - **ViewDefinition**: a view with an opaque SQL body and documented columns
//! - **SchemaModel**: the root container holding all tables and views
//!
//! ## Example
//!
//! ```rust,ignore
//! use tabula_ir::{load_schema, validate_schema};
//!
//! let schema = load_schema("schema/v1.0/tables")?;
//! for error in validate_schema(&schema) {
//!     eprintln!("{}", error);
//! }
//! ```

// Module declarations
pub mod column;
pub mod loader;
pub mod schema;
pub mod table;
pub mod validation;
pub mod view;

// Re-export commonly used types at crate root
pub use column::{ColumnDefinition, ForeignKeyRef, TypeSignature};
pub use loader::{
    DocumentFormat, FORMAT_VERSION_KEY, load_model, load_schema, load_table_file, load_view_file,
    load_views,
};
pub use schema::{SchemaModel, TableMap, ViewMap};
pub use table::{CheckConstraint, DEFAULT_SCHEMA, IndexDefinition, TableDefinition, UniqueConstraint};
pub use validation::{
    ValidationResult, ValidationRule, Validator, validate_model, validate_schema, validate_views,
};
pub use view::{ViewColumn, ViewDefinition};

// Re-export core types that are commonly used with IR
pub use tabula_core::{
    LoadRule, LogicalType, MaxLength, Platform, ReferentialAction, SchemaLoadError, TabulaError,
    TabulaResult,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient re-exports for common usage
pub mod prelude {
    pub use crate::{
        // Model
        CheckConstraint,
        ColumnDefinition,
        ForeignKeyRef,
        IndexDefinition,
        // Re-exported from core
        LogicalType,
        MaxLength,
        Platform,
        ReferentialAction,
        SchemaModel,
        TableDefinition,
        TabulaError,
        TabulaResult,
        UniqueConstraint,
        ViewColumn,
        ViewDefinition,
        // Pipeline
        load_schema,
        load_views,
        validate_schema,
        validate_views,
    };
}
