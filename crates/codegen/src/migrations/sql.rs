//! SQL emission for single migration steps
//!
//! [`render_step`] turns one [`MigrationStep`] into the statements that
//! perform it on the dialect's platform. Every statement ends with `;`;
//! restore markers are plain `-- TODO:` line comments.

use super::plan::{MigrationStep, TableRef};
use crate::diff::{ForeignKeyDescriptor, storage_changed, type_changed};
use crate::dialect::{Dialect, default_constraint_name, foreign_key_name, primary_key_name};
use tabula_ir::{ColumnDefinition, IndexDefinition, TableDefinition};

/// Statements for one step, in execution order
pub fn render_step(dialect: Dialect, step: &MigrationStep) -> Vec<String> {
    let d = &dialect;
    match step {
        MigrationStep::CreateTable { table } => vec![create_table(d, table)],
        MigrationStep::DropTable { table } => {
            vec![format!("DROP TABLE {};", target(d, table))]
        }

        MigrationStep::AddColumn { table, column } => {
            let keyword = if d.is_mssql() { "ADD" } else { "ADD COLUMN" };
            vec![format!(
                "ALTER TABLE {} {} {} {};",
                target(d, table),
                keyword,
                d.quote(&column.name),
                d.column_definition(&table.name, column)
            )]
        }
        MigrationStep::AlterColumn { table, from, to } => alter_column(d, table, from, to),
        MigrationStep::DropColumn {
            table,
            column,
            definition,
        } => {
            let mut statements = Vec::new();
            let had_default = definition.as_ref().is_some_and(|c| c.default.is_some());
            if d.is_mssql() && had_default {
                statements.push(drop_default_constraint(d, table, column));
            }
            statements.push(format!(
                "ALTER TABLE {} DROP COLUMN {};",
                target(d, table),
                d.quote(column)
            ));
            statements
        }

        MigrationStep::CreateIndex { table, index } => vec![create_index(d, table, index)],
        MigrationStep::DropIndex { table, index } => {
            let sql = if d.is_mssql() {
                format!("DROP INDEX {} ON {};", d.quote(&index.name), target(d, table))
            } else {
                format!("DROP INDEX {};", d.qualified(&table.schema, &index.name))
            };
            vec![sql]
        }

        MigrationStep::AddUnique { table, constraint } => vec![add_constraint(
            d,
            table,
            &constraint.name,
            &format!("UNIQUE ({})", d.column_list(&constraint.columns)),
        )],
        MigrationStep::DropUnique { table, constraint } => {
            vec![drop_constraint(d, table, &constraint.name)]
        }
        MigrationStep::AddCheck { table, constraint } => vec![add_constraint(
            d,
            table,
            &constraint.name,
            &format!("CHECK ({})", constraint.expression.trim()),
        )],
        MigrationStep::DropCheck { table, constraint } => {
            vec![drop_constraint(d, table, &constraint.name)]
        }
        MigrationStep::AddPrimaryKey { table, columns } => vec![add_constraint(
            d,
            table,
            &primary_key_name(&table.name),
            &format!("PRIMARY KEY ({})", d.column_list(columns)),
        )],
        MigrationStep::DropPrimaryKey { table, .. } => {
            vec![drop_constraint(d, table, &primary_key_name(&table.name))]
        }
        MigrationStep::AddForeignKey {
            table,
            fk,
            ref_schema,
        } => vec![add_constraint(
            d,
            table,
            &foreign_key_name(&table.name, &fk.ref_table),
            &foreign_key_clause(d, fk, ref_schema),
        )],
        MigrationStep::DropForeignKey { table, fk, .. } => vec![drop_constraint(
            d,
            table,
            &foreign_key_name(&table.name, &fk.ref_table),
        )],

        MigrationStep::CreateView { view } => {
            let verb = if d.is_mssql() {
                "CREATE OR ALTER VIEW"
            } else {
                "CREATE OR REPLACE VIEW"
            };
            vec![format!(
                "{} {} AS\n{};",
                verb,
                d.qualified(&view.schema_qualifier, &view.name),
                view.body()
            )]
        }
        MigrationStep::DropView { view } => vec![format!(
            "DROP VIEW {};",
            d.qualified(&view.schema_qualifier, &view.name)
        )],

        MigrationStep::ManualRestore { note } => vec![todo(note)],
    }
}

fn target(d: &Dialect, table: &TableRef) -> String {
    d.qualified(&table.schema, &table.name)
}

fn todo(note: &str) -> String {
    format!("-- TODO: {}", note)
}

fn add_constraint(d: &Dialect, table: &TableRef, name: &str, body: &str) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {};",
        target(d, table),
        d.quote(name),
        body
    )
}

fn drop_constraint(d: &Dialect, table: &TableRef, name: &str) -> String {
    format!(
        "ALTER TABLE {} DROP CONSTRAINT {};",
        target(d, table),
        d.quote(name)
    )
}

fn drop_default_constraint(d: &Dialect, table: &TableRef, column: &str) -> String {
    drop_constraint(d, table, &default_constraint_name(&table.name, column))
}

fn foreign_key_clause(d: &Dialect, fk: &ForeignKeyDescriptor, ref_schema: &str) -> String {
    let mut clause = format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        d.quote(&fk.child_column),
        d.qualified(ref_schema, &fk.ref_table),
        d.quote(&fk.ref_column)
    );
    if !fk.on_delete.is_default() {
        clause.push_str(" ON DELETE ");
        clause.push_str(fk.on_delete.to_sql(d.platform()));
    }
    if !fk.on_update.is_default() {
        clause.push_str(" ON UPDATE ");
        clause.push_str(fk.on_update.to_sql(d.platform()));
    }
    clause
}

fn create_table(d: &Dialect, table: &TableDefinition) -> String {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            format!(
                "{} {}",
                d.quote(&c.name),
                d.column_definition(&table.name, c)
            )
        })
        .collect();

    if !table.primary_key.is_empty() {
        lines.push(format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            d.quote(&primary_key_name(&table.name)),
            d.column_list(&table.primary_key)
        ));
    }
    for unique in &table.unique_constraints {
        lines.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            d.quote(&unique.name),
            d.column_list(&unique.columns)
        ));
    }
    for check in &table.check_constraints {
        lines.push(format!(
            "CONSTRAINT {} CHECK ({})",
            d.quote(&check.name),
            check.expression.trim()
        ));
    }

    format!(
        "CREATE TABLE {} (\n    {}\n);",
        d.qualified(&table.schema_qualifier, &table.name),
        lines.join(",\n    ")
    )
}

fn create_index(d: &Dialect, table: &TableRef, index: &IndexDefinition) -> String {
    format!(
        "CREATE {}INDEX {} ON {} ({});",
        if index.unique { "UNIQUE " } else { "" },
        d.quote(&index.name),
        target(d, table),
        d.column_list(&index.columns)
    )
}

fn alter_column(
    d: &Dialect,
    table: &TableRef,
    from: &ColumnDefinition,
    to: &ColumnDefinition,
) -> Vec<String> {
    let mut statements = Vec::new();
    let column = d.quote(&to.name);
    let alter = format!("ALTER TABLE {} ALTER COLUMN {}", target(d, table), column);

    if from.identity != to.identity {
        statements.push(todo(&format!(
            "{} identity on column {} of {} manually.",
            if to.identity { "add" } else { "remove" },
            to.name,
            table.name
        )));
    }

    let old_default = d.default_expr(from);
    let new_default = d.default_expr(to);
    let default_changed = old_default != new_default;

    if d.is_mssql() {
        let rewrite = storage_changed(from, to);
        let drop_default = old_default.is_some() && (default_changed || rewrite);
        if drop_default {
            statements.push(drop_default_constraint(d, table, &to.name));
        }
        if rewrite {
            let not_null = if d.is_not_null(to) { " NOT NULL" } else { "" };
            statements.push(format!("{} {}{};", alter, d.column_type(to), not_null));
        }
        if let Some(default) = new_default.filter(|_| default_changed || drop_default) {
            statements.push(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} DEFAULT {} FOR {};",
                target(d, table),
                d.quote(&default_constraint_name(&table.name, &to.name)),
                default,
                column
            ));
        }
        return statements;
    }

    if type_changed(from, to) {
        statements.push(format!("{} TYPE {};", alter, d.column_type(to)));
    }
    match (d.is_not_null(from), d.is_not_null(to)) {
        (false, true) => statements.push(format!("{} SET NOT NULL;", alter)),
        (true, false) => statements.push(format!("{} DROP NOT NULL;", alter)),
        _ => {}
    }
    if default_changed {
        match new_default {
            Some(default) => statements.push(format!("{} SET DEFAULT {};", alter, default)),
            None => statements.push(format!("{} DROP DEFAULT;", alter)),
        }
    }
    statements
}
