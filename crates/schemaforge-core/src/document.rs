use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::SchemaGraph;
use crate::schema::{AttributeSpec, Constraints, ForeignKeyRef, Table, TableLayout};
use crate::types::AttributeType;

/// How the loader treats a document whose connection list or foreign keys
/// disagree with the invariants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnInconsistency {
    /// Fail the load; the document is not accepted.
    #[default]
    Reject,
    /// Drop dangling foreign keys and recompute connections from the
    /// constraints that survive.
    Repair,
}

/// Options that control how documents are loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub on_inconsistency: OnInconsistency,
}

/// Serialized schema document exchanged with editors and storage.
///
/// The shape mirrors the persisted editor state byte for byte: camelCase
/// keys, string-typed lengths and value lists, and a derived `connections`
/// array whose endpoints use the `table-attribute` compound form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub database_name: String,
    pub tables: Vec<DocumentTable>,
    #[serde(default)]
    pub connections: Vec<DocumentConnection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTable {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub attributes: Vec<DocumentAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    #[serde(default)]
    pub length: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub values: String,
    pub constraints: DocumentConstraints,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentConstraints {
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<DocumentForeignKey>,
}

/// Name-based foreign-key reference; resolved to ids at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentForeignKey {
    pub table: String,
    pub attribute: String,
}

/// Derived edge persisted for the editor; endpoints are `table-attribute`
/// compound strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentConnection {
    pub source: String,
    pub target: String,
}

impl SchemaDocument {
    /// Render a graph into its document form. Connections are written from
    /// the derived projection, so they always mirror the foreign keys.
    pub fn from_graph(graph: &SchemaGraph) -> Self {
        let tables = graph
            .tables()
            .iter()
            .map(|table| render_table(graph, table))
            .collect();

        let connections = graph
            .connections()
            .iter()
            .filter_map(|edge| {
                let source_table = graph.table(edge.source_table)?;
                let source = source_table.attribute(edge.source_attribute)?;
                let target_table = graph.table(edge.target_table)?;
                let target = target_table.attribute(edge.target_attribute)?;
                Some(DocumentConnection {
                    source: format!("{}-{}", source_table.name, source.name),
                    target: format!("{}-{}", target_table.name, target.name),
                })
            })
            .collect();

        SchemaDocument {
            database_name: graph.database_name().to_string(),
            tables,
            connections,
        }
    }

    /// Rebuild a graph from an untrusted document.
    ///
    /// The graph is reconstructed through the validating mutation API, so
    /// every invariant is re-checked: nothing in the file is trusted. Under
    /// `Reject` any dangling foreign key or a connection list that is not
    /// the exact mirror of the foreign keys fails the load; under `Repair`
    /// dangling foreign keys are dropped and the connection list is
    /// recomputed from what survives.
    pub fn into_graph(self, options: LoadOptions) -> Result<SchemaGraph> {
        let repair = options.on_inconsistency == OnInconsistency::Repair;
        let mut graph = SchemaGraph::new();
        graph.set_database_name(self.database_name);

        // Tables and plain attributes first; foreign keys attach in a second
        // pass so references resolve regardless of table order in the file.
        let mut table_ids = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let id = graph.add_empty_table(&table.name)?;
            let layout = TableLayout {
                position_x: table.position_x,
                position_y: table.position_y,
                color: table.color.clone(),
            };
            if !layout.is_empty() {
                graph.set_table_layout(id, layout)?;
            }
            for attribute in &table.attributes {
                graph.add_attribute(id, parse_attribute(attribute, &table.name)?)?;
            }
            table_ids.push(id);
        }

        for (table, &table_id) in self.tables.iter().zip(&table_ids) {
            for (index, attribute) in table.attributes.iter().enumerate() {
                let Some(reference) = &attribute.constraints.foreign_key else {
                    continue;
                };
                let resolved = resolve_reference(&graph, reference);
                let mut spec = parse_attribute(attribute, &table.name)?;
                match resolved {
                    Some(fk) => {
                        spec.constraints.foreign_key = Some(fk);
                        match graph.update_attribute(table_id, index, spec) {
                            Ok(()) => {}
                            Err(_) if repair => {}
                            Err(err) => return Err(err),
                        }
                    }
                    None if repair => {}
                    None => {
                        return Err(Error::InvalidForeignKey(format!(
                            "{}.{} references unknown target {}.{}",
                            table.name, attribute.name, reference.table, reference.attribute
                        )));
                    }
                }
            }
        }

        if !repair {
            check_connection_mirror(&graph, &self.connections)?;
        }

        Ok(graph)
    }
}

fn render_table(graph: &SchemaGraph, table: &Table) -> DocumentTable {
    let attributes = table
        .attributes
        .iter()
        .map(|attribute| {
            let foreign_key = attribute.constraints.foreign_key.and_then(|fk| {
                let target_table = graph.table(fk.table)?;
                let target = target_table.attribute(fk.attribute)?;
                Some(DocumentForeignKey {
                    table: target_table.name.clone(),
                    attribute: target.name.clone(),
                })
            });
            DocumentAttribute {
                name: attribute.name.clone(),
                attribute_type: attribute.attribute_type.as_sql().to_string(),
                length: attribute
                    .length
                    .map(|length| length.to_string())
                    .unwrap_or_default(),
                default_value: attribute.default_value.clone().unwrap_or_default(),
                values: attribute.values.join(","),
                constraints: DocumentConstraints {
                    not_null: attribute.constraints.not_null,
                    unique: attribute.constraints.unique,
                    primary_key: attribute.constraints.primary_key,
                    auto_increment: attribute.constraints.auto_increment,
                    foreign_key,
                },
            }
        })
        .collect();

    DocumentTable {
        id: table.id.0,
        name: table.name.clone(),
        position_x: table.layout.position_x,
        position_y: table.layout.position_y,
        color: table.layout.color.clone(),
        attributes,
    }
}

/// Parse a document attribute into a spec, foreign key excluded.
fn parse_attribute(attribute: &DocumentAttribute, table_name: &str) -> Result<AttributeSpec> {
    let attribute_type = AttributeType::parse(&attribute.attribute_type)?;

    let length = match attribute.length.trim() {
        "" => None,
        raw => Some(raw.parse::<u32>().map_err(|_| {
            Error::MalformedDocument(format!(
                "{table_name}.{}: length '{raw}' is not a number",
                attribute.name
            ))
        })?),
    };

    let values: Vec<String> = attribute
        .values
        .split(',')
        .map(str::trim)
        .filter(|member| !member.is_empty())
        .map(str::to_string)
        .collect();

    let default_value = match attribute.default_value.as_str() {
        "" => None,
        raw => Some(raw.to_string()),
    };

    Ok(AttributeSpec {
        name: attribute.name.clone(),
        attribute_type,
        length,
        values,
        default_value,
        constraints: Constraints {
            not_null: attribute.constraints.not_null,
            unique: attribute.constraints.unique,
            primary_key: attribute.constraints.primary_key,
            auto_increment: attribute.constraints.auto_increment,
            foreign_key: None,
        },
    })
}

fn resolve_reference(graph: &SchemaGraph, reference: &DocumentForeignKey) -> Option<ForeignKeyRef> {
    let table = graph.table_by_name(&reference.table)?;
    let attribute = table.attribute_by_name(&reference.attribute)?;
    Some(ForeignKeyRef {
        table: table.id,
        attribute: attribute.id,
    })
}

/// The connection list must be the exact mirror of the foreign keys: every
/// connection corresponds to one `foreignKey` field and vice versa.
fn check_connection_mirror(graph: &SchemaGraph, given: &[DocumentConnection]) -> Result<()> {
    let mut expected: Vec<DocumentConnection> = SchemaDocument::from_graph(graph).connections;
    let mut given: Vec<DocumentConnection> = given.to_vec();
    expected.sort();
    given.sort();
    if expected != given {
        return Err(Error::MalformedDocument(format!(
            "connection list does not mirror foreign keys: {} listed, {} derived",
            given.len(),
            expected.len()
        )));
    }
    Ok(())
}
