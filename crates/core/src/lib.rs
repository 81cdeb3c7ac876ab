//! # Tabula Core
//!
//! Core types, traits, and error handling for Tabula.
//!
//! This crate provides the foundational building blocks used throughout
//! the toolkit, including:
//!
//! - **Types**: Logical column types, length modifiers, target platforms and
//!   referential actions
//! - **Traits**: `Validatable` for definitions that check themselves
//! - **Errors**: `SchemaLoadError` for per-file load failures and the unified
//!   `TabulaError` / `TabulaResult`
//!

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{LoadRule, ResultExt, SchemaLoadError, TabulaError, TabulaResult};
pub use traits::Validatable;
pub use types::{LogicalType, MaxLength, Platform, ReferentialAction};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
