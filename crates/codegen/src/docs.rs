//! # Schema Reference Generator
//!
//! Renders a [`SchemaModel`] as one Markdown document: a table of contents,
//! a Mermaid `erDiagram` of the foreign keys, a section per table and a
//! section per view.
//!
//! The output is a pure function of the model, so documents can be checked
//! into version control next to the migration scripts.

use crate::dialect::foreign_key_name;
use heck::ToKebabCase;
use tabula_ir::{ColumnDefinition, SchemaModel, TableDefinition, ViewDefinition};

// ============================================================================
// Public API
// ============================================================================

/// Render the whole reference document
pub fn render_markdown(schema: &SchemaModel, version: &str) -> String {
    let mut out = String::with_capacity(8192);

    out.push_str(&format!("# Schema reference (v{})\n\n", version));
    out.push_str(&format!(
        "{} tables, {} views.\n\n",
        schema.table_count(),
        schema.view_count()
    ));

    // ── Contents ─────────────────────────────────────────────────────────
    out.push_str("## Contents\n\n");
    for table in schema.tables() {
        out.push_str(&format!("- [{}](#{})\n", table.name, anchor("table", &table.name)));
    }
    for view in schema.views() {
        out.push_str(&format!("- [{}](#{})\n", view.name, anchor("view", &view.name)));
    }
    out.push('\n');

    // ── Diagram ──────────────────────────────────────────────────────────
    if schema.table_count() > 0 {
        out.push_str("## Relationships\n\n");
        out.push_str(&er_diagram(schema));
        out.push('\n');
    }

    // ── Sections ─────────────────────────────────────────────────────────
    for table in schema.tables() {
        out.push_str(&table_section(schema, table));
    }
    for view in schema.views() {
        out.push_str(&view_section(view));
    }

    out
}

/// Heading anchor, e.g. `table-order-line` for table `OrderLine`
pub fn anchor(kind: &str, name: &str) -> String {
    format!("{}-{}", kind, name).to_kebab_case()
}

/// Mermaid `erDiagram` block: every table with its columns, then one
/// relationship line per foreign key
pub fn er_diagram(schema: &SchemaModel) -> String {
    let mut out = String::from("```mermaid\nerDiagram\n");

    for table in schema.tables() {
        out.push_str(&format!("    {} {{\n", table.name));
        for column in &table.columns {
            let pk = table.primary_key.contains(&column.name);
            let keys = match (pk, column.is_foreign_key()) {
                (true, true) => " PK, FK",
                (true, false) => " PK",
                (false, true) => " FK",
                (false, false) => "",
            };
            out.push_str(&format!(
                "        {} {}{}\n",
                column.logical_type.as_str(),
                column.name,
                keys
            ));
        }
        out.push_str("    }\n");
    }

    for table in schema.tables() {
        for column in table.foreign_key_columns() {
            if let Some(fk) = &column.foreign_key {
                let many = if column.nullable { "o{" } else { "|{" };
                out.push_str(&format!(
                    "    {} ||--{} {} : \"{}\"\n",
                    fk.table,
                    many,
                    table.name,
                    foreign_key_name(&table.name, &fk.table)
                ));
            }
        }
    }

    out.push_str("```\n");
    out
}

// ============================================================================
// Sections
// ============================================================================

fn table_section(schema: &SchemaModel, table: &TableDefinition) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "## {} <a id=\"{}\"></a>\n\n",
        table.name,
        anchor("table", &table.name)
    ));
    out.push_str(&format!("Schema: `{}`\n\n", table.schema_qualifier));
    if !table.description.trim().is_empty() {
        out.push_str(&format!("{}\n\n", table.description.trim()));
    }

    out.push_str("| Column | Type | Nullable | Default | Description |\n");
    out.push_str("|--------|------|----------|---------|-------------|\n");
    for column in &table.columns {
        out.push_str(&column_row(column));
    }
    out.push('\n');

    if !table.primary_key.is_empty() {
        out.push_str(&format!("**Primary key:** {}\n\n", code_list(&table.primary_key)));
    }

    if !table.indexes.is_empty() {
        out.push_str("**Indexes:**\n\n");
        for index in &table.indexes {
            out.push_str(&format!(
                "- `{}`{} on {}\n",
                index.name,
                if index.unique { " (unique)" } else { "" },
                code_list(&index.columns)
            ));
        }
        out.push('\n');
    }

    if !table.unique_constraints.is_empty() || !table.check_constraints.is_empty() {
        out.push_str("**Constraints:**\n\n");
        for unique in &table.unique_constraints {
            out.push_str(&format!(
                "- `{}` unique on {}\n",
                unique.name,
                code_list(&unique.columns)
            ));
        }
        for check in &table.check_constraints {
            out.push_str(&format!("- `{}` check `{}`\n", check.name, check.expression.trim()));
        }
        out.push('\n');
    }

    let outgoing: Vec<&ColumnDefinition> = table.foreign_key_columns().collect();
    if !outgoing.is_empty() {
        out.push_str("**References:**\n\n");
        for column in outgoing {
            if let Some(fk) = &column.foreign_key {
                out.push_str(&format!(
                    "- `{}` → [{}](#{}).`{}`\n",
                    column.name,
                    fk.table,
                    anchor("table", &fk.table),
                    fk.column
                ));
            }
        }
        out.push('\n');
    }

    let incoming = schema.incoming_references(&table.name);
    if !incoming.is_empty() {
        out.push_str("**Referenced by:**\n\n");
        for (child, column) in incoming {
            out.push_str(&format!(
                "- [{}](#{}).`{}`\n",
                child,
                anchor("table", &child),
                column
            ));
        }
        out.push('\n');
    }

    out
}

fn view_section(view: &ViewDefinition) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "## {} (view) <a id=\"{}\"></a>\n\n",
        view.name,
        anchor("view", &view.name)
    ));
    out.push_str(&format!("Schema: `{}`\n\n", view.schema_qualifier));
    if !view.description.trim().is_empty() {
        out.push_str(&format!("{}\n\n", view.description.trim()));
    }

    if !view.columns.is_empty() {
        out.push_str("| Column | Type | Source | Description |\n");
        out.push_str("|--------|------|--------|-------------|\n");
        for column in &view.columns {
            out.push_str(&format!(
                "| {} | `{}` | {} | {} |\n",
                column.name,
                column.sql_data_type,
                column.source_column.as_deref().unwrap_or(""),
                cell(&column.description)
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!("```sql\n{}\n```\n\n", view.body()));
    out
}

fn column_row(column: &ColumnDefinition) -> String {
    let mut ty = format!("`{}`", column.type_label());
    if column.identity {
        ty.push_str(" identity");
    }
    format!(
        "| {} | {} | {} | {} | {} |\n",
        column.name,
        ty,
        if column.nullable { "yes" } else { "no" },
        column
            .default
            .as_deref()
            .map(|d| format!("`{}`", d))
            .unwrap_or_default(),
        cell(column.description.as_deref().unwrap_or(""))
    )
}

/// Markdown table cells cannot contain pipes or line breaks
fn cell(text: &str) -> String {
    text.trim().replace('|', "\\|").replace('\n', " ")
}

fn code_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("`{}`", i))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Tests
// ============================================================================
