//! Core traits for Tabula
//!
//! This module defines the traits shared by the schema model and the
//! validator.

// ============================================================================
// Validatable Trait
// ============================================================================

/// Trait for definitions that can check their own local consistency
///
/// "Local" means checks that need nothing but the value itself (a column's
/// type modifiers, a table's key columns). Checks that need the whole schema,
/// such as foreign-key resolution, belong to the schema validator.
///
/// # Example
///
/// ```rust,ignore
/// use tabula_core::Validatable;
///
/// struct Column {
///     name: String,
/// }
///
/// impl Validatable for Column {
///     fn validation_errors(&self) -> Vec<String> {
///         if self.name.is_empty() {
///             vec!["column name cannot be empty".to_string()]
///         } else {
///             vec![]
///         }
///     }
/// }
/// ```
pub trait Validatable {
    /// All local problems, as human-readable sentences
    fn validation_errors(&self) -> Vec<String>;

    /// Check if the object is valid without returning error details
    fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Validatable for Named {
        fn validation_errors(&self) -> Vec<String> {
            if self.0.is_empty() {
                vec!["name cannot be empty".to_string()]
            } else {
                vec![]
            }
        }
    }

    #[test]
    fn test_is_valid_follows_errors() {
        assert!(Named("Unit").is_valid());
        assert!(!Named("").is_valid());
        assert_eq!(Named("").validation_errors().len(), 1);
    }
}
