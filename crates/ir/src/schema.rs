//! The schema model
//!
//! [`SchemaModel`] is the root container every pipeline stage reads: tables
//! and views keyed by name. Keys are kept in sorted maps so that every
//! iteration over the model is deterministic.

use crate::table::TableDefinition;
use crate::view::ViewDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Views keyed by name
pub type ViewMap = BTreeMap<String, ViewDefinition>;

/// Tables keyed by name
pub type TableMap = BTreeMap<String, TableDefinition>;

// ============================================================================
// SchemaModel
// ============================================================================

/// All tables and views of one schema version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaModel {
    /// Tables keyed by name
    pub tables: TableMap,

    /// Views keyed by name (same namespace as tables)
    #[serde(default)]
    pub views: ViewMap,
}

impl SchemaModel {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from a list of tables
    pub fn from_tables(tables: impl IntoIterator<Item = TableDefinition>) -> Self {
        let mut schema = Self::new();
        for table in tables {
            schema.tables.insert(table.name.clone(), table);
        }
        schema
    }

    /// Attach views, replacing any existing ones
    pub fn with_views(mut self, views: ViewMap) -> Self {
        self.views = views;
        self
    }

    /// Add a table (builder form)
    pub fn with_table(mut self, table: TableDefinition) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Add a view (builder form)
    pub fn with_view(mut self, view: ViewDefinition) -> Self {
        self.views.insert(view.name.clone(), view);
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    /// Look up a view by name
    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.get(name)
    }

    /// Tables in name order
    pub fn tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values()
    }

    /// Views in name order
    pub fn views(&self) -> impl Iterator<Item = &ViewDefinition> {
        self.views.values()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// True when there are no tables and no views
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty()
    }

    /// `(child_table, child_column)` pairs whose foreign key targets `table`,
    /// sorted
    pub fn incoming_references(&self, table: &str) -> Vec<(String, String)> {
        let mut refs: Vec<(String, String)> = self
            .tables
            .values()
            .flat_map(|t| {
                t.foreign_key_columns()
                    .filter(|c| c.foreign_key.as_ref().is_some_and(|fk| fk.table == table))
                    .map(|c| (t.name.clone(), c.name.clone()))
            })
            .collect();
        refs.sort();
        refs
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDefinition;
    use tabula_core::LogicalType;

    fn sample() -> SchemaModel {
        let parent = TableDefinition::new("Parent")
            .with_column(ColumnDefinition::new("ParentID", LogicalType::Integer).identity())
            .with_primary_key(["ParentID"]);
        let child = TableDefinition::new("Child")
            .with_column(ColumnDefinition::new("ChildID", LogicalType::Integer).identity())
            .with_column(
                ColumnDefinition::new("ParentID", LogicalType::Integer)
                    .references("Parent", "ParentID"),
            )
            .with_primary_key(["ChildID"]);
        SchemaModel::from_tables([parent, child])
    }

    #[test]
    fn test_tables_iterate_in_name_order() {
        let schema = sample();
        let names: Vec<&str> = schema.tables().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Child", "Parent"]);
    }

    #[test]
    fn test_incoming_references() {
        let schema = sample();
        assert_eq!(
            schema.incoming_references("Parent"),
            vec![("Child".to_string(), "ParentID".to_string())]
        );
        assert!(schema.incoming_references("Child").is_empty());
    }

    #[test]
    fn test_empty_schema() {
        assert!(SchemaModel::new().is_empty());
        assert!(!sample().is_empty());
        assert_eq!(sample().table_count(), 2);
    }
}
