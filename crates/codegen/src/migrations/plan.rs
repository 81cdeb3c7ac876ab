//! Migration plans
//!
//! A [`MigrationPlan`] is the ordered list of schema operations a script
//! performs. The forward plan is built from a [`SchemaDiff`]; the rollback
//! plan is the forward plan reversed with every step inverted, never a second
//! diff. Steps that cannot be inverted mechanically become
//! [`MigrationStep::ManualRestore`] markers.
//!
//! Forward order:
//!
//! 1. drop views that are dropped or replaced
//! 2. create tables (without outgoing foreign keys first)
//! 3. drop foreign keys, including transient drops of keys on altered columns
//!    and keys between dropped tables that reference each other
//! 4. drop indexes, unique constraints, check constraints and primary keys
//!    (check constraints whose expression names an altered column included)
//! 5. add columns
//! 6. alter columns
//! 7. drop columns
//! 8. drop tables (no table is dropped while another dropped table still
//!    references it)
//! 9. add primary keys, create indexes, add unique and check constraints
//! 10. add foreign keys
//! 11. create views (new and altered)

use crate::diff::{ForeignKeyDescriptor, SchemaDiff, diff_schemas};
use crate::dialect::foreign_key_name;
use std::collections::BTreeSet;
use tabula_ir::{
    CheckConstraint, ColumnDefinition, DEFAULT_SCHEMA, IndexDefinition, SchemaModel,
    TableDefinition, UniqueConstraint, ViewDefinition,
};

// ============================================================================
// MigrationStep
// ============================================================================

/// A schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// One schema operation
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStep {
    /// Create a table with its columns, primary key, unique and check
    /// constraints. Indexes and foreign keys are separate steps.
    CreateTable { table: TableDefinition },
    DropTable { table: TableRef },

    AddColumn {
        table: TableRef,
        column: ColumnDefinition,
    },
    AlterColumn {
        table: TableRef,
        from: ColumnDefinition,
        to: ColumnDefinition,
    },
    /// `definition` is the column as it was, when known
    DropColumn {
        table: TableRef,
        column: String,
        definition: Option<ColumnDefinition>,
    },

    CreateIndex {
        table: TableRef,
        index: IndexDefinition,
    },
    DropIndex {
        table: TableRef,
        index: IndexDefinition,
    },
    AddUnique {
        table: TableRef,
        constraint: UniqueConstraint,
    },
    DropUnique {
        table: TableRef,
        constraint: UniqueConstraint,
    },
    AddCheck {
        table: TableRef,
        constraint: CheckConstraint,
    },
    DropCheck {
        table: TableRef,
        constraint: CheckConstraint,
    },
    AddPrimaryKey {
        table: TableRef,
        columns: Vec<String>,
    },
    DropPrimaryKey {
        table: TableRef,
        columns: Vec<String>,
    },
    AddForeignKey {
        table: TableRef,
        fk: ForeignKeyDescriptor,
        ref_schema: String,
    },
    DropForeignKey {
        table: TableRef,
        fk: ForeignKeyDescriptor,
        ref_schema: String,
    },

    CreateView { view: ViewDefinition },
    DropView { view: ViewDefinition },

    /// Something a human has to restore; rendered as a `-- TODO` comment
    ManualRestore { note: String },
}

impl MigrationStep {
    /// The step that undoes this one
    pub fn inverse(&self) -> MigrationStep {
        use MigrationStep::*;

        match self.clone() {
            CreateTable { table } => DropTable {
                table: TableRef::new(table.schema_qualifier, table.name),
            },
            DropTable { table } => ManualRestore {
                note: format!("restore dropped table {} manually.", table.name),
            },
            AddColumn { table, column } => DropColumn {
                table,
                column: column.name.clone(),
                definition: Some(column),
            },
            AlterColumn { table, from, to } => AlterColumn {
                table,
                from: to,
                to: from,
            },
            DropColumn { table, column, .. } => ManualRestore {
                note: format!("restore dropped column {} on {} manually.", column, table.name),
            },
            CreateIndex { table, index } => DropIndex { table, index },
            DropIndex { table, index } => CreateIndex { table, index },
            AddUnique { table, constraint } => DropUnique { table, constraint },
            DropUnique { table, constraint } => AddUnique { table, constraint },
            AddCheck { table, constraint } => DropCheck { table, constraint },
            DropCheck { table, constraint } => AddCheck { table, constraint },
            AddPrimaryKey { table, columns } => DropPrimaryKey { table, columns },
            DropPrimaryKey { table, columns } => AddPrimaryKey { table, columns },
            AddForeignKey {
                table,
                fk,
                ref_schema,
            } => DropForeignKey {
                table,
                fk,
                ref_schema,
            },
            DropForeignKey {
                table,
                fk,
                ref_schema,
            } => AddForeignKey {
                table,
                fk,
                ref_schema,
            },
            CreateView { view } => DropView { view },
            DropView { view } => CreateView { view },
            ManualRestore { note } => ManualRestore { note },
        }
    }

    /// A restore note when this step would need a column or table that a
    /// forward script dropped
    fn blocked_by(
        &self,
        dropped_tables: &BTreeSet<String>,
        dropped_columns: &BTreeSet<(String, String)>,
    ) -> Option<String> {
        let gone = |table: &str, column: &str| {
            dropped_columns.contains(&(table.to_string(), column.to_string()))
        };
        let any_gone = |table: &str, columns: &[String]| columns.iter().any(|c| gone(table, c));

        match self {
            MigrationStep::CreateIndex { table, index } if any_gone(&table.name, &index.columns) => {
                Some(format!("restore index {} on {} manually.", index.name, table.name))
            }
            MigrationStep::AddUnique { table, constraint }
                if any_gone(&table.name, &constraint.columns) =>
            {
                Some(format!(
                    "restore unique constraint {} on {} manually.",
                    constraint.name, table.name
                ))
            }
            MigrationStep::AddPrimaryKey { table, columns } if any_gone(&table.name, columns) => {
                Some(format!("restore primary key of {} manually.", table.name))
            }
            MigrationStep::AddForeignKey { table, fk, .. }
                if gone(&table.name, &fk.child_column)
                    || gone(&fk.ref_table, &fk.ref_column)
                    || dropped_tables.contains(&table.name)
                    || dropped_tables.contains(&fk.ref_table) =>
            {
                Some(format!(
                    "restore foreign key {} on {} manually.",
                    foreign_key_name(&table.name, &fk.ref_table),
                    table.name
                ))
            }
            _ => None,
        }
    }
}

// ============================================================================
// MigrationPlan
// ============================================================================

/// An ordered list of migration steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationPlan {
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    /// Build the forward plan for a diff against the schema it leads to
    pub fn forward(diff: &SchemaDiff, new_schema: &SchemaModel) -> Self {
        PlanBuilder::new(diff, new_schema).build()
    }

    /// Plan that creates `schema` from nothing, views included
    pub fn create(schema: &SchemaModel) -> Self {
        Self::forward(&diff_schemas(&SchemaModel::new(), schema), schema)
    }

    /// The forward plan reversed, every step inverted
    pub fn rollback(&self) -> Self {
        let mut dropped_tables = BTreeSet::new();
        let mut dropped_columns = BTreeSet::new();
        for step in &self.steps {
            match step {
                MigrationStep::DropTable { table } => {
                    dropped_tables.insert(table.name.clone());
                }
                MigrationStep::DropColumn { table, column, .. } => {
                    dropped_columns.insert((table.name.clone(), column.clone()));
                }
                _ => {}
            }
        }

        let steps = self
            .steps
            .iter()
            .rev()
            .map(|step| {
                let inverse = step.inverse();
                match inverse.blocked_by(&dropped_tables, &dropped_columns) {
                    Some(note) => MigrationStep::ManualRestore { note },
                    None => inverse,
                }
            })
            .collect();
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationStep> {
        self.steps.iter()
    }

    /// Number of steps that need a human
    pub fn manual_step_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, MigrationStep::ManualRestore { .. }))
            .count()
    }
}

// ============================================================================
// PlanBuilder
// ============================================================================

/// Objects on unchanged definitions that must be dropped around an
/// `ALTER COLUMN` and re-created afterwards
#[derive(Default)]
struct Dependents {
    foreign_keys: Vec<(TableRef, ForeignKeyDescriptor, String)>,
    indexes: Vec<(TableRef, IndexDefinition)>,
    uniques: Vec<(TableRef, UniqueConstraint)>,
    checks: Vec<(TableRef, CheckConstraint)>,
    primary_keys: Vec<(TableRef, Vec<String>)>,
}

/// Whether an opaque check expression names `column` as an identifier.
/// Quoting and bracketing are ignored, as is ASCII case.
fn mentions_column(expression: &str, column: &str) -> bool {
    expression
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|token| token.eq_ignore_ascii_case(column))
}

/// Drop order of dropped tables
#[derive(Default)]
struct DropOrder {
    tables: Vec<String>,
    /// `(child table, key)` pairs inside a reference cycle
    cycle_keys: Vec<(String, ForeignKeyDescriptor)>,
}

struct PlanBuilder<'a> {
    diff: &'a SchemaDiff,
    schema: &'a SchemaModel,
    steps: Vec<MigrationStep>,
}

impl<'a> PlanBuilder<'a> {
    fn new(diff: &'a SchemaDiff, schema: &'a SchemaModel) -> Self {
        Self {
            diff,
            schema,
            steps: Vec::new(),
        }
    }

    /// Schema qualifier of a table on either side of the diff
    fn schema_of(&self, table: &str) -> String {
        self.schema
            .table(table)
            .map(|t| t.schema_qualifier.clone())
            .or_else(|| {
                self.diff
                    .dropped_table_info
                    .get(table)
                    .map(|d| d.schema.clone())
            })
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string())
    }

    fn table_ref(&self, table: &str) -> TableRef {
        TableRef::new(self.schema_of(table), table)
    }

    fn push(&mut self, step: MigrationStep) {
        self.steps.push(step);
    }

    /// New tables in creation order: those without outgoing foreign keys
    /// first, each group by name
    fn new_tables(&self) -> Vec<&'a TableDefinition> {
        let schema = self.schema;
        let tables: Vec<&TableDefinition> = self
            .diff
            .new_tables
            .iter()
            .filter_map(|name| schema.table(name))
            .collect();
        let (plain, referencing): (Vec<_>, Vec<_>) = tables
            .into_iter()
            .partition(|t| !t.has_outgoing_foreign_keys());
        plain.into_iter().chain(referencing).collect()
    }

    /// Dropped tables in drop order, plus the foreign keys that have to go
    /// before any of them
    ///
    /// Tables no other remaining dropped table references are dropped first,
    /// each round by name. Tables left in a reference cycle lose their keys
    /// to each other in the foreign-key step and are then dropped by name.
    fn dropped_tables(&self) -> DropOrder {
        let info = &self.diff.dropped_table_info;
        let references = |from: &str, to: &str| {
            from != to
                && info
                    .get(from)
                    .is_some_and(|d| d.referenced_tables.iter().any(|r| r == to))
        };

        let mut remaining: BTreeSet<&str> =
            self.diff.dropped_tables.iter().map(String::as_str).collect();
        let mut order = DropOrder::default();
        while !remaining.is_empty() {
            let ready: Vec<&str> = remaining
                .iter()
                .copied()
                .filter(|table| !remaining.iter().any(|other| references(*other, *table)))
                .collect();

            if ready.is_empty() {
                for table in &remaining {
                    let fks = info
                        .get(*table)
                        .map(|d| d.foreign_keys.as_slice())
                        .unwrap_or_default();
                    for fk in fks {
                        if fk.ref_table != *table && remaining.contains(fk.ref_table.as_str()) {
                            order.cycle_keys.push((table.to_string(), fk.clone()));
                        }
                    }
                }
                order.tables.extend(remaining.iter().map(|t| t.to_string()));
                break;
            }

            for table in ready {
                remaining.remove(table);
                order.tables.push(table.to_string());
            }
        }
        order
    }

    fn dependents(&self) -> Dependents {
        let altered: BTreeSet<(&str, &str)> = self
            .diff
            .altered_columns
            .iter()
            .flat_map(|(table, columns)| {
                columns
                    .iter()
                    .filter(|c| c.rewrites_column())
                    .map(move |c| (table.as_str(), c.column_name.as_str()))
            })
            .collect();
        let mut dependents = Dependents::default();
        if altered.is_empty() {
            return dependents;
        }

        let is_new = |table: &str| self.diff.new_tables.iter().any(|t| t == table);
        let touches = |table: &str, columns: &[String]| {
            columns.iter().any(|c| altered.contains(&(table, c.as_str())))
        };

        for table in self.schema.tables() {
            if is_new(&table.name) {
                continue;
            }
            let name = table.name.as_str();
            let tref = self.table_ref(name);

            let added_fks = self.diff.new_fks.get(name);
            for fk in ForeignKeyDescriptor::of_table(table) {
                let unchanged = !added_fks.is_some_and(|fks| fks.contains(&fk));
                if unchanged
                    && (altered.contains(&(name, fk.child_column.as_str()))
                        || altered.contains(&(fk.ref_table.as_str(), fk.ref_column.as_str())))
                {
                    let ref_schema = self.schema_of(&fk.ref_table);
                    dependents.foreign_keys.push((tref.clone(), fk, ref_schema));
                }
            }

            let added_indexes = self.diff.new_indexes.get(name);
            for index in &table.indexes {
                let unchanged = !added_indexes.is_some_and(|i| i.contains(index));
                if unchanged && touches(name, &index.columns) {
                    dependents.indexes.push((tref.clone(), index.clone()));
                }
            }

            let added_uniques = self.diff.new_unique_constraints.get(name);
            for unique in &table.unique_constraints {
                let unchanged = !added_uniques.is_some_and(|u| u.contains(unique));
                if unchanged && touches(name, &unique.columns) {
                    dependents.uniques.push((tref.clone(), unique.clone()));
                }
            }

            let added_checks = self.diff.new_check_constraints.get(name);
            for check in &table.check_constraints {
                let unchanged = !added_checks.is_some_and(|c| c.contains(check));
                let mentions_altered = altered
                    .iter()
                    .any(|(t, c)| *t == name && mentions_column(&check.expression, c));
                if unchanged && mentions_altered {
                    dependents.checks.push((tref.clone(), check.clone()));
                }
            }

            if !self.diff.primary_key_changes.contains_key(name)
                && touches(name, &table.primary_key)
            {
                dependents
                    .primary_keys
                    .push((tref.clone(), table.primary_key.clone()));
            }
        }

        dependents
    }

    fn build(mut self) -> MigrationPlan {
        let diff = self.diff;
        let schema = self.schema;
        let dependents = self.dependents();
        let new_tables = self.new_tables();
        let drop_order = self.dropped_tables();

        // 1. Views going away or being replaced
        let replaced: BTreeSet<&String> = diff
            .dropped_views
            .iter()
            .chain(diff.altered_views.iter())
            .collect();
        for name in replaced {
            if let Some(view) = diff.old_view_definitions.get(name) {
                self.push(MigrationStep::DropView { view: view.clone() });
            }
        }

        // 2. New tables
        for table in &new_tables {
            self.push(MigrationStep::CreateTable {
                table: (*table).clone(),
            });
        }

        // 3. Foreign keys
        for (table, fks) in &diff.dropped_fks {
            for fk in fks {
                let step = MigrationStep::DropForeignKey {
                    table: self.table_ref(table),
                    fk: fk.clone(),
                    ref_schema: self.schema_of(&fk.ref_table),
                };
                self.push(step);
            }
        }
        for (table, fk, ref_schema) in &dependents.foreign_keys {
            self.push(MigrationStep::DropForeignKey {
                table: table.clone(),
                fk: fk.clone(),
                ref_schema: ref_schema.clone(),
            });
        }
        for (table, fk) in &drop_order.cycle_keys {
            let step = MigrationStep::DropForeignKey {
                table: self.table_ref(table),
                fk: fk.clone(),
                ref_schema: self.schema_of(&fk.ref_table),
            };
            self.push(step);
        }

        // 4. Indexes and table constraints
        for (table, indexes) in &diff.dropped_indexes {
            for index in indexes {
                let step = MigrationStep::DropIndex {
                    table: self.table_ref(table),
                    index: index.clone(),
                };
                self.push(step);
            }
        }
        for (table, index) in &dependents.indexes {
            self.push(MigrationStep::DropIndex {
                table: table.clone(),
                index: index.clone(),
            });
        }
        for (table, constraints) in &diff.dropped_unique_constraints {
            for constraint in constraints {
                let step = MigrationStep::DropUnique {
                    table: self.table_ref(table),
                    constraint: constraint.clone(),
                };
                self.push(step);
            }
        }
        for (table, constraint) in &dependents.uniques {
            self.push(MigrationStep::DropUnique {
                table: table.clone(),
                constraint: constraint.clone(),
            });
        }
        for (table, constraints) in &diff.dropped_check_constraints {
            for constraint in constraints {
                let step = MigrationStep::DropCheck {
                    table: self.table_ref(table),
                    constraint: constraint.clone(),
                };
                self.push(step);
            }
        }
        for (table, constraint) in &dependents.checks {
            self.push(MigrationStep::DropCheck {
                table: table.clone(),
                constraint: constraint.clone(),
            });
        }
        for (table, change) in &diff.primary_key_changes {
            if !change.old.is_empty() {
                let step = MigrationStep::DropPrimaryKey {
                    table: self.table_ref(table),
                    columns: change.old.clone(),
                };
                self.push(step);
            }
        }
        for (table, columns) in &dependents.primary_keys {
            self.push(MigrationStep::DropPrimaryKey {
                table: table.clone(),
                columns: columns.clone(),
            });
        }

        // 5-7. Columns
        for (table, columns) in &diff.new_columns {
            for column in columns {
                let step = MigrationStep::AddColumn {
                    table: self.table_ref(table),
                    column: column.clone(),
                };
                self.push(step);
            }
        }
        for (table, columns) in &diff.altered_columns {
            for altered in columns {
                let step = MigrationStep::AlterColumn {
                    table: self.table_ref(table),
                    from: altered.old_definition.clone(),
                    to: altered.new_definition.clone(),
                };
                self.push(step);
            }
        }
        for (table, columns) in &diff.dropped_columns {
            let definitions = diff.dropped_column_definitions.get(table);
            for column in columns {
                let definition = definitions
                    .and_then(|defs| defs.iter().find(|d| &d.name == column))
                    .cloned();
                let step = MigrationStep::DropColumn {
                    table: self.table_ref(table),
                    column: column.clone(),
                    definition,
                };
                self.push(step);
            }
        }

        // 8. Dropped tables
        for name in &drop_order.tables {
            let step = MigrationStep::DropTable {
                table: self.table_ref(name),
            };
            self.push(step);
        }

        // 9. Primary keys, indexes, table constraints
        for (table, change) in &diff.primary_key_changes {
            if !change.new.is_empty() {
                let step = MigrationStep::AddPrimaryKey {
                    table: self.table_ref(table),
                    columns: change.new.clone(),
                };
                self.push(step);
            }
        }
        for (table, columns) in &dependents.primary_keys {
            self.push(MigrationStep::AddPrimaryKey {
                table: table.clone(),
                columns: columns.clone(),
            });
        }
        for (table, indexes) in &diff.new_indexes {
            for index in indexes {
                let step = MigrationStep::CreateIndex {
                    table: self.table_ref(table),
                    index: index.clone(),
                };
                self.push(step);
            }
        }
        for (table, index) in &dependents.indexes {
            self.push(MigrationStep::CreateIndex {
                table: table.clone(),
                index: index.clone(),
            });
        }
        for table in &new_tables {
            for index in &table.indexes {
                self.push(MigrationStep::CreateIndex {
                    table: TableRef::new(table.schema_qualifier.clone(), table.name.clone()),
                    index: index.clone(),
                });
            }
        }
        for (table, constraints) in &diff.new_unique_constraints {
            for constraint in constraints {
                let step = MigrationStep::AddUnique {
                    table: self.table_ref(table),
                    constraint: constraint.clone(),
                };
                self.push(step);
            }
        }
        for (table, constraint) in &dependents.uniques {
            self.push(MigrationStep::AddUnique {
                table: table.clone(),
                constraint: constraint.clone(),
            });
        }
        for (table, constraints) in &diff.new_check_constraints {
            for constraint in constraints {
                let step = MigrationStep::AddCheck {
                    table: self.table_ref(table),
                    constraint: constraint.clone(),
                };
                self.push(step);
            }
        }
        for (table, constraint) in &dependents.checks {
            self.push(MigrationStep::AddCheck {
                table: table.clone(),
                constraint: constraint.clone(),
            });
        }

        // 10. Foreign keys
        for (table, fks) in &diff.new_fks {
            for fk in fks {
                let step = MigrationStep::AddForeignKey {
                    table: self.table_ref(table),
                    fk: fk.clone(),
                    ref_schema: self.schema_of(&fk.ref_table),
                };
                self.push(step);
            }
        }
        for table in &new_tables {
            for fk in ForeignKeyDescriptor::of_table(table) {
                let step = MigrationStep::AddForeignKey {
                    table: TableRef::new(table.schema_qualifier.clone(), table.name.clone()),
                    ref_schema: self.schema_of(&fk.ref_table),
                    fk,
                };
                self.push(step);
            }
        }
        for (table, fk, ref_schema) in dependents.foreign_keys {
            self.push(MigrationStep::AddForeignKey {
                table,
                fk,
                ref_schema,
            });
        }

        // 11. New and replaced views
        let created: BTreeSet<&String> = diff
            .new_views
            .iter()
            .chain(diff.altered_views.iter())
            .collect();
        for name in created {
            if let Some(view) = schema.view(name) {
                self.push(MigrationStep::CreateView { view: view.clone() });
            }
        }

        MigrationPlan { steps: self.steps }
    }
}

// ============================================================================
// Tests
// ============================================================================
