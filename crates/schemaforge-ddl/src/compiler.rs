use thiserror::Error;

use schemaforge_core::{
    plan_emission, Attribute, AttributeType, Connection, EmissionPlan, Error as CoreError,
    ForeignKeyRef, SchemaGraph, Table,
};

use crate::dialect::Dialect;

/// Errors emitted by the DDL compiler.
///
/// Ordering never fails: the resolver guarantees a total order by deferring
/// cyclic edges. Types outside the closed enumeration surface as the core's
/// `UnsupportedType` through the `Schema` wrap.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A DEFAULT literal does not fit the attribute's type.
    #[error("invalid default value: {0}")]
    InvalidDefault(String),
    #[error(transparent)]
    Schema(#[from] CoreError),
}

/// Compile the graph into an executable DDL script.
///
/// One `CREATE TABLE` per table in emission order, then one `ALTER TABLE ...
/// ADD FOREIGN KEY` per deferred edge. Statements are newline-terminated and
/// separated by a blank line.
pub fn compile(graph: &SchemaGraph, dialect: Dialect) -> Result<String, CompileError> {
    let plan = plan_emission(graph);

    let mut statements = Vec::with_capacity(plan.order.len() + plan.deferred.len() + 1);
    if let Some(header) = dialect.script_header(graph.database_name()) {
        statements.push(header);
    }

    for &table_id in &plan.order {
        let table = graph
            .table(table_id)
            .ok_or_else(|| CoreError::NotFound(format!("table id {}", table_id.0)))?;
        statements.push(render_create_table(graph, table, &plan, dialect)?);
    }

    for edge in &plan.deferred {
        statements.push(render_deferred(graph, edge)?);
    }

    Ok(format!("{}\n", statements.join("\n\n")))
}

fn render_create_table(
    graph: &SchemaGraph,
    table: &Table,
    plan: &EmissionPlan,
    dialect: Dialect,
) -> Result<String, CompileError> {
    let mut clauses = Vec::with_capacity(table.attributes.len());
    for attribute in &table.attributes {
        clauses.push(format!("  {}", render_column(attribute, dialect)?));
    }

    for attribute in &table.attributes {
        let Some(fk) = attribute.constraints.foreign_key else {
            continue;
        };
        let edge = Connection {
            source_table: table.id,
            source_attribute: attribute.id,
            target_table: fk.table,
            target_attribute: fk.attribute,
        };
        if plan.is_deferred(&edge) {
            continue;
        }
        let (target_table, target_attribute) = reference_names(graph, fk)?;
        clauses.push(format!(
            "  FOREIGN KEY ({}) REFERENCES {target_table}({target_attribute})",
            attribute.name
        ));
    }

    Ok(format!(
        "CREATE TABLE {} (\n{}\n);",
        table.name,
        clauses.join(",\n")
    ))
}

fn render_column(attribute: &Attribute, dialect: Dialect) -> Result<String, CompileError> {
    check_default(attribute)?;

    let mut clause = format!("{} {}", attribute.name, render_type(attribute, dialect));

    let constraints = &attribute.constraints;
    if constraints.not_null {
        clause.push_str(" NOT NULL");
    }
    if constraints.unique {
        clause.push_str(" UNIQUE");
    }
    if constraints.auto_increment {
        clause.push_str(" AUTO_INCREMENT");
    }
    if let Some(value) = &attribute.default_value {
        clause.push_str(" DEFAULT ");
        if attribute.attribute_type.quotes_default() {
            clause.push_str(&dialect.quote_literal(value));
        } else {
            clause.push_str(value);
        }
    }
    if constraints.primary_key {
        clause.push_str(" PRIMARY KEY");
    }

    Ok(clause)
}

fn render_type(attribute: &Attribute, dialect: Dialect) -> String {
    let base = attribute.attribute_type.as_sql();
    if attribute.attribute_type.takes_values() && !attribute.values.is_empty() {
        let members: Vec<String> = attribute
            .values
            .iter()
            .map(|member| dialect.quote_literal(member))
            .collect();
        return format!("{base}({})", members.join(", "));
    }
    if attribute.attribute_type.takes_length() {
        if let Some(length) = attribute.length {
            return format!("{base}({length})");
        }
    }
    base.to_string()
}

/// DEFAULT literals are type-checked here, not at mutation time.
fn check_default(attribute: &Attribute) -> Result<(), CompileError> {
    let Some(value) = &attribute.default_value else {
        return Ok(());
    };
    let ty = attribute.attribute_type;

    if ty.is_numeric() {
        if value.parse::<f64>().is_err() {
            return Err(CompileError::InvalidDefault(format!(
                "{}: '{value}' is not a numeric literal",
                attribute.name
            )));
        }
    } else if ty == AttributeType::Boolean {
        let normalized = value.to_ascii_lowercase();
        if !matches!(normalized.as_str(), "true" | "false" | "0" | "1") {
            return Err(CompileError::InvalidDefault(format!(
                "{}: '{value}' is not a boolean literal",
                attribute.name
            )));
        }
    } else if ty.takes_values() && !attribute.values.iter().any(|member| member == value) {
        return Err(CompileError::InvalidDefault(format!(
            "{}: '{value}' is not a declared {ty} member",
            attribute.name
        )));
    }

    Ok(())
}

fn render_deferred(graph: &SchemaGraph, edge: &Connection) -> Result<String, CompileError> {
    let source_table = graph
        .table(edge.source_table)
        .ok_or_else(|| CoreError::NotFound(format!("table id {}", edge.source_table.0)))?;
    let source = source_table
        .attribute(edge.source_attribute)
        .ok_or_else(|| CoreError::NotFound(format!("attribute id {}", edge.source_attribute.0)))?;
    let (target_table, target_attribute) = reference_names(
        graph,
        ForeignKeyRef {
            table: edge.target_table,
            attribute: edge.target_attribute,
        },
    )?;
    Ok(format!(
        "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {target_table}({target_attribute});",
        source_table.name, source.name
    ))
}

fn reference_names(graph: &SchemaGraph, fk: ForeignKeyRef) -> Result<(String, String), CompileError> {
    let table = graph
        .table(fk.table)
        .ok_or_else(|| CoreError::NotFound(format!("table id {}", fk.table.0)))?;
    let attribute = table
        .attribute(fk.attribute)
        .ok_or_else(|| CoreError::NotFound(format!("attribute id {}", fk.attribute.0)))?;
    Ok((table.name.clone(), attribute.name.clone()))
}
