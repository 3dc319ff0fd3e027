use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::graph::SchemaGraph;

/// Validate internal consistency of a whole graph.
///
/// Mutations already enforce these rules one call at a time; this re-checks
/// them wholesale:
/// - table names unique (case-insensitive)
/// - attribute names unique within their table (case-insensitive)
/// - at most one primary key per table
/// - foreign keys resolve to an existing primary-key attribute
/// - length present where the type requires it, values present for ENUM/SET
pub fn validate_graph(graph: &SchemaGraph) -> Result<()> {
    let mut table_names = BTreeSet::new();
    for table in graph.tables() {
        if !table_names.insert(table.name.to_lowercase()) {
            return Err(Error::DuplicateName(table.name.clone()));
        }

        let mut attribute_names = BTreeSet::new();
        let mut primary_keys = 0usize;
        for attribute in &table.attributes {
            if !attribute_names.insert(attribute.name.to_lowercase()) {
                return Err(Error::DuplicateName(format!(
                    "{}.{}",
                    table.name, attribute.name
                )));
            }
            if attribute.constraints.primary_key {
                primary_keys += 1;
                if primary_keys > 1 {
                    return Err(Error::MultiplePrimaryKey(table.name.clone()));
                }
            }
            if attribute.attribute_type.requires_length() && attribute.length.is_none() {
                return Err(Error::InvalidAttribute(format!(
                    "{}.{} requires a length for type {}",
                    table.name, attribute.name, attribute.attribute_type
                )));
            }
            if attribute.attribute_type.takes_values() && attribute.values.is_empty() {
                return Err(Error::InvalidAttribute(format!(
                    "{}.{} requires at least one value for type {}",
                    table.name, attribute.name, attribute.attribute_type
                )));
            }
        }
    }

    for table in graph.tables() {
        for attribute in &table.attributes {
            let Some(fk) = attribute.constraints.foreign_key else {
                continue;
            };
            let target_table = graph.table(fk.table).ok_or_else(|| {
                Error::InvalidForeignKey(format!(
                    "{}.{} references unknown table id {}",
                    table.name, attribute.name, fk.table.0
                ))
            })?;
            let target = target_table.attribute(fk.attribute).ok_or_else(|| {
                Error::InvalidForeignKey(format!(
                    "{}.{} references unknown attribute id {} in table {}",
                    table.name, attribute.name, fk.attribute.0, target_table.name
                ))
            })?;
            if !target.constraints.primary_key {
                return Err(Error::InvalidForeignKey(format!(
                    "{}.{} references {}.{}, which is not a primary key",
                    table.name, attribute.name, target_table.name, target.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeSpec;
    use crate::types::AttributeType;

    #[test]
    fn accepts_a_graph_built_through_the_mutation_api() {
        let mut graph = SchemaGraph::new();
        let users = graph.add_table("Users").unwrap();
        let users_id = graph
            .add_attribute(users, AttributeSpec::new("id", AttributeType::Integer).primary_key())
            .unwrap();
        let posts = graph.add_table("Posts").unwrap();
        graph
            .add_attribute(posts, AttributeSpec::new("id", AttributeType::Integer).primary_key())
            .unwrap();
        graph
            .add_attribute(
                posts,
                AttributeSpec::new("authorId", AttributeType::Integer).references(users, users_id),
            )
            .unwrap();

        assert!(validate_graph(&graph).is_ok());
    }

    #[test]
    fn empty_graph_is_valid() {
        assert!(validate_graph(&SchemaGraph::new()).is_ok());
    }
}
