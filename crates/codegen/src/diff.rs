//! # Schema Differ
//!
//! Compares two schema models and produces a [`SchemaDiff`]: a structured,
//! order-independent description of every change between them. The diff is
//! the only value handed to the SQL renderer, and it carries enough of the
//! old schema (dropped indexes, dropped foreign keys, previous column and view
//! definitions) for the renderer to invert each change.
//!
//! Every list in the diff is sorted by its natural key and every per-table
//! map is a `BTreeMap`, so the serialized form of a diff is byte-stable.
//!
//! Attributes that never produce SQL are not compared: descriptions,
//! `seed_data`, column order and a table's schema qualifier.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tabula_core::{ReferentialAction, ResultExt, TabulaResult};
use tabula_ir::{
    CheckConstraint, ColumnDefinition, IndexDefinition, SchemaModel, TableDefinition,
    UniqueConstraint, ViewDefinition, ViewMap,
};

// ============================================================================
// Diff records
// ============================================================================

/// A column present on both sides whose type signature changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlteredColumn {
    pub column_name: String,
    pub old_definition: ColumnDefinition,
    pub new_definition: ColumnDefinition,
}

impl AlteredColumn {
    /// Whether the change needs the column itself rewritten (type or
    /// nullability), as opposed to only its default or identity flag
    pub fn rewrites_column(&self) -> bool {
        storage_changed(&self.old_definition, &self.new_definition)
    }
}

/// Whether the SQL type differs between two definitions of a column
pub fn type_changed(old: &ColumnDefinition, new: &ColumnDefinition) -> bool {
    old.logical_type != new.logical_type
        || old.max_length != new.max_length
        || old.precision != new.precision
        || old.scale != new.scale
}

/// Whether the type or the effective nullability differs
pub fn storage_changed(old: &ColumnDefinition, new: &ColumnDefinition) -> bool {
    let not_null = |c: &ColumnDefinition| !c.nullable || c.identity;
    type_changed(old, new) || not_null(old) != not_null(new)
}

/// A foreign key as tracked per child column
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ForeignKeyDescriptor {
    pub child_column: String,
    pub ref_table: String,
    pub ref_column: String,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

impl ForeignKeyDescriptor {
    /// Descriptor of a column's foreign key, if it has one
    pub fn from_column(column: &ColumnDefinition) -> Option<Self> {
        column.foreign_key.as_ref().map(|fk| Self {
            child_column: column.name.clone(),
            ref_table: fk.table.clone(),
            ref_column: fk.column.clone(),
            on_delete: fk.on_delete,
            on_update: fk.on_update,
        })
    }

    /// All foreign keys of a table, in child-column order
    pub fn of_table(table: &TableDefinition) -> Vec<Self> {
        let mut fks: Vec<Self> = table.columns.iter().filter_map(Self::from_column).collect();
        fks.sort();
        fks
    }
}

/// A change to a table's primary-key column list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKeyChange {
    pub old: Vec<String>,
    pub new: Vec<String>,
}

/// What the renderer needs to know about a table that is going away
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedTable {
    /// Schema qualifier of the dropped table
    pub schema: String,
    /// Tables the dropped table referenced, sorted
    pub referenced_tables: Vec<String>,
    /// Its foreign keys, in child-column order
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

// ============================================================================
// SchemaDiff
// ============================================================================

/// Every change between two schema versions
///
/// Per-table maps only hold tables that have at least one entry of that kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDiff {
    /// Tables only in the new schema, sorted
    pub new_tables: Vec<String>,
    /// Tables only in the old schema, sorted
    pub dropped_tables: Vec<String>,
    /// Qualifier and outgoing references of each dropped table
    pub dropped_table_info: BTreeMap<String, DroppedTable>,

    pub new_columns: BTreeMap<String, Vec<ColumnDefinition>>,
    pub altered_columns: BTreeMap<String, Vec<AlteredColumn>>,
    pub dropped_columns: BTreeMap<String, Vec<String>>,
    /// Previous definitions of the columns in `dropped_columns`
    pub dropped_column_definitions: BTreeMap<String, Vec<ColumnDefinition>>,

    pub new_indexes: BTreeMap<String, Vec<IndexDefinition>>,
    pub dropped_indexes: BTreeMap<String, Vec<IndexDefinition>>,

    pub new_fks: BTreeMap<String, Vec<ForeignKeyDescriptor>>,
    pub dropped_fks: BTreeMap<String, Vec<ForeignKeyDescriptor>>,

    pub new_unique_constraints: BTreeMap<String, Vec<UniqueConstraint>>,
    pub dropped_unique_constraints: BTreeMap<String, Vec<UniqueConstraint>>,
    pub new_check_constraints: BTreeMap<String, Vec<CheckConstraint>>,
    pub dropped_check_constraints: BTreeMap<String, Vec<CheckConstraint>>,

    pub primary_key_changes: BTreeMap<String, PrimaryKeyChange>,

    pub new_views: Vec<String>,
    pub dropped_views: Vec<String>,
    pub altered_views: Vec<String>,
    /// Previous definition of every dropped or altered view
    pub old_view_definitions: BTreeMap<String, ViewDefinition>,
}

impl SchemaDiff {
    /// True iff no field records a change
    pub fn is_empty(&self) -> bool {
        self.new_tables.is_empty()
            && self.dropped_tables.is_empty()
            && self.dropped_table_info.is_empty()
            && self.new_columns.is_empty()
            && self.altered_columns.is_empty()
            && self.dropped_columns.is_empty()
            && self.dropped_column_definitions.is_empty()
            && self.new_indexes.is_empty()
            && self.dropped_indexes.is_empty()
            && self.new_fks.is_empty()
            && self.dropped_fks.is_empty()
            && self.new_unique_constraints.is_empty()
            && self.dropped_unique_constraints.is_empty()
            && self.new_check_constraints.is_empty()
            && self.dropped_check_constraints.is_empty()
            && self.primary_key_changes.is_empty()
            && self.new_views.is_empty()
            && self.dropped_views.is_empty()
            && self.altered_views.is_empty()
            && self.old_view_definitions.is_empty()
    }

    /// One line per kind of change with its count, for operator output
    pub fn summary(&self) -> Vec<String> {
        fn total<T>(map: &BTreeMap<String, Vec<T>>) -> usize {
            map.values().map(Vec::len).sum()
        }

        [
            ("new tables", self.new_tables.len()),
            ("dropped tables", self.dropped_tables.len()),
            ("new columns", total(&self.new_columns)),
            ("altered columns", total(&self.altered_columns)),
            ("dropped columns", total(&self.dropped_columns)),
            ("new indexes", total(&self.new_indexes)),
            ("dropped indexes", total(&self.dropped_indexes)),
            ("new foreign keys", total(&self.new_fks)),
            ("dropped foreign keys", total(&self.dropped_fks)),
            ("new unique constraints", total(&self.new_unique_constraints)),
            ("dropped unique constraints", total(&self.dropped_unique_constraints)),
            ("new check constraints", total(&self.new_check_constraints)),
            ("dropped check constraints", total(&self.dropped_check_constraints)),
            ("primary key changes", self.primary_key_changes.len()),
            ("new views", self.new_views.len()),
            ("dropped views", self.dropped_views.len()),
            ("altered views", self.altered_views.len()),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(label, n)| format!("{}: {}", label, n))
        .collect()
    }

    /// Pretty JSON form of the diff
    pub fn to_json(&self) -> TabulaResult<String> {
        serde_json::to_string_pretty(self).with_context("Serializing schema diff")
    }
}

// ============================================================================
// Diff functions
// ============================================================================

/// Compute every change from `old` to `new`, tables and views alike
pub fn diff_schemas(old: &SchemaModel, new: &SchemaModel) -> SchemaDiff {
    let mut diff = SchemaDiff::default();

    let old_names: BTreeSet<&String> = old.tables.keys().collect();
    let new_names: BTreeSet<&String> = new.tables.keys().collect();

    diff.new_tables = new_names.difference(&old_names).map(|s| s.to_string()).collect();
    diff.dropped_tables = old_names.difference(&new_names).map(|s| s.to_string()).collect();

    for name in &diff.dropped_tables {
        if let Some(table) = old.table(name) {
            diff.dropped_table_info.insert(
                name.clone(),
                DroppedTable {
                    schema: table.schema_qualifier.clone(),
                    referenced_tables: table.referenced_tables(),
                    foreign_keys: ForeignKeyDescriptor::of_table(table),
                },
            );
        }
    }

    for name in old_names.intersection(&new_names) {
        if let (Some(old_table), Some(new_table)) = (old.table(name), new.table(name)) {
            diff_table(&mut diff, old_table, new_table);
        }
    }

    let (new_views, dropped_views, altered_views) = diff_views(&old.views, &new.views);
    for name in dropped_views.iter().chain(altered_views.iter()) {
        if let Some(view) = old.view(name) {
            diff.old_view_definitions.insert(name.clone(), view.clone());
        }
    }
    diff.new_views = new_views;
    diff.dropped_views = dropped_views;
    diff.altered_views = altered_views;

    diff
}

/// Partition views into `(new, dropped, altered)`, each sorted by name
pub fn diff_views(old: &ViewMap, new: &ViewMap) -> (Vec<String>, Vec<String>, Vec<String>) {
    let new_views = new
        .keys()
        .filter(|name| !old.contains_key(*name))
        .cloned()
        .collect();
    let dropped_views = old
        .keys()
        .filter(|name| !new.contains_key(*name))
        .cloned()
        .collect();
    let altered_views = old
        .iter()
        .filter_map(|(name, old_view)| {
            new.get(name)
                .filter(|new_view| old_view.differs_from(new_view))
                .map(|_| name.clone())
        })
        .collect();
    (new_views, dropped_views, altered_views)
}

/// Insert `items` under `table` unless there are none
fn put<T>(map: &mut BTreeMap<String, Vec<T>>, table: &str, items: Vec<T>) {
    if !items.is_empty() {
        map.insert(table.to_string(), items);
    }
}

/// Split two name-keyed lists into `(added, dropped)`. An entry present on
/// both sides with different contents lands in both lists.
fn partition_by_name<'a, T, F>(old: &'a [T], new: &'a [T], name_of: F) -> (Vec<T>, Vec<T>)
where
    T: Clone + PartialEq,
    F: Fn(&T) -> &str,
{
    let old_map: BTreeMap<&str, &T> = old.iter().map(|item| (name_of(item), item)).collect();
    let new_map: BTreeMap<&str, &T> = new.iter().map(|item| (name_of(item), item)).collect();

    let added = new_map
        .values()
        .copied()
        .filter(|item| old_map.get(name_of(*item)).copied() != Some(*item))
        .cloned()
        .collect();
    let dropped = old_map
        .values()
        .copied()
        .filter(|item| new_map.get(name_of(*item)).copied() != Some(*item))
        .cloned()
        .collect();
    (added, dropped)
}

fn diff_table(diff: &mut SchemaDiff, old: &TableDefinition, new: &TableDefinition) {
    let table = new.name.as_str();

    // Columns
    let old_columns: BTreeMap<&str, &ColumnDefinition> =
        old.columns.iter().map(|c| (c.name.as_str(), c)).collect();
    let new_columns: BTreeMap<&str, &ColumnDefinition> =
        new.columns.iter().map(|c| (c.name.as_str(), c)).collect();

    let added: Vec<ColumnDefinition> = new_columns
        .iter()
        .filter(|(name, _)| !old_columns.contains_key(*name))
        .map(|(_, c)| (*c).clone())
        .collect();
    let dropped: Vec<ColumnDefinition> = old_columns
        .iter()
        .filter(|(name, _)| !new_columns.contains_key(*name))
        .map(|(_, c)| (*c).clone())
        .collect();
    let altered: Vec<AlteredColumn> = old_columns
        .iter()
        .filter_map(|(name, old_col)| {
            let new_col = new_columns.get(name)?;
            (old_col.type_signature() != new_col.type_signature()).then(|| AlteredColumn {
                column_name: name.to_string(),
                old_definition: (*old_col).clone(),
                new_definition: (*new_col).clone(),
            })
        })
        .collect();

    put(&mut diff.new_columns, table, added);
    put(
        &mut diff.dropped_columns,
        table,
        dropped.iter().map(|c| c.name.clone()).collect(),
    );
    put(&mut diff.dropped_column_definitions, table, dropped);
    put(&mut diff.altered_columns, table, altered);

    // Indexes and named constraints
    let (added, dropped) = partition_by_name(&old.indexes, &new.indexes, |i| i.name.as_str());
    put(&mut diff.new_indexes, table, added);
    put(&mut diff.dropped_indexes, table, dropped);

    let (added, dropped) =
        partition_by_name(&old.unique_constraints, &new.unique_constraints, |u| u.name.as_str());
    put(&mut diff.new_unique_constraints, table, added);
    put(&mut diff.dropped_unique_constraints, table, dropped);

    let (added, dropped) =
        partition_by_name(&old.check_constraints, &new.check_constraints, |c| c.name.as_str());
    put(&mut diff.new_check_constraints, table, added);
    put(&mut diff.dropped_check_constraints, table, dropped);

    // Foreign keys, keyed by child column
    let old_fks = ForeignKeyDescriptor::of_table(old);
    let new_fks = ForeignKeyDescriptor::of_table(new);
    let (added, dropped) = partition_by_name(&old_fks, &new_fks, |fk| fk.child_column.as_str());
    put(&mut diff.new_fks, table, added);
    put(&mut diff.dropped_fks, table, dropped);

    // Primary key
    if old.primary_key != new.primary_key {
        diff.primary_key_changes.insert(
            table.to_string(),
            PrimaryKeyChange {
                old: old.primary_key.clone(),
                new: new.primary_key.clone(),
            },
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
