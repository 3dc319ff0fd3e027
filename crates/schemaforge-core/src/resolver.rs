use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::SchemaGraph;
use crate::schema::{Connection, TableId};

/// Table emission order plus the edges that must wait for deferred ALTERs.
///
/// For every non-deferred edge the referenced table strictly precedes the
/// referencing table. Deferred edges are exactly those that cannot satisfy
/// that rule — members of a cycle, self-references included.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionPlan {
    pub order: Vec<TableId>,
    pub deferred: Vec<Connection>,
}

impl EmissionPlan {
    pub fn is_deferred(&self, edge: &Connection) -> bool {
        self.deferred.contains(edge)
    }
}

/// Serializable summary of an emission plan, with ids resolved to names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionReport {
    pub tables: usize,
    pub edges: usize,
    pub has_cycle: bool,
    pub order: Vec<String>,
    pub deferred: Vec<DeferredEdge>,
}

/// A deferred edge named as `Table.attribute` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredEdge {
    pub source: String,
    pub target: String,
}

/// Compute a total emission order over all tables.
///
/// Kahn's algorithm over the table-level dependency graph; among ready nodes
/// the lowest original insertion index wins. When only cyclic nodes remain,
/// the one with the lowest insertion index is force-emitted and its
/// unsatisfied foreign keys become deferred constraints. This never fails:
/// any graph, cyclic or not, yields an order covering every table.
pub fn plan_emission(graph: &SchemaGraph) -> EmissionPlan {
    let tables = graph.tables();
    let count = tables.len();
    let index_of: BTreeMap<TableId, usize> = tables
        .iter()
        .enumerate()
        .map(|(index, table)| (table.id, index))
        .collect();

    let connections = graph.connections();
    let mut depends_on: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); count];
    for edge in &connections {
        let (Some(&source), Some(&target)) = (
            index_of.get(&edge.source_table),
            index_of.get(&edge.target_table),
        ) else {
            continue;
        };
        depends_on[source].insert(target);
    }

    let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); count];
    for (source, targets) in depends_on.iter().enumerate() {
        for &target in targets {
            dependents[target].insert(source);
        }
    }

    let mut indegree: Vec<usize> = depends_on.iter().map(BTreeSet::len).collect();
    let mut emitted = vec![false; count];
    let mut order = Vec::with_capacity(count);

    for _ in 0..count {
        let ready = (0..count).find(|&index| !emitted[index] && indegree[index] == 0);
        let next = match ready {
            Some(index) => index,
            // Cycle: break it at the earliest-created remaining table.
            None => match (0..count).find(|&index| !emitted[index]) {
                Some(index) => index,
                None => break,
            },
        };
        emitted[next] = true;
        order.push(tables[next].id);
        for &dependent in &dependents[next] {
            if !emitted[dependent] && indegree[dependent] > 0 {
                indegree[dependent] -= 1;
            }
        }
    }

    let position: BTreeMap<TableId, usize> = order
        .iter()
        .enumerate()
        .map(|(index, &id)| (id, index))
        .collect();
    let deferred = connections
        .into_iter()
        .filter(|edge| {
            let (Some(&source), Some(&target)) = (
                position.get(&edge.source_table),
                position.get(&edge.target_table),
            ) else {
                return false;
            };
            target >= source
        })
        .collect();

    EmissionPlan { order, deferred }
}

/// Build a name-resolved report for diagnostics and CLI output.
pub fn emission_report(graph: &SchemaGraph) -> EmissionReport {
    let plan = plan_emission(graph);
    let edges = graph.connections().len();

    let order = plan
        .order
        .iter()
        .filter_map(|&id| graph.table(id).map(|table| table.name.clone()))
        .collect();
    let deferred: Vec<DeferredEdge> = plan
        .deferred
        .iter()
        .filter_map(|edge| {
            let source_table = graph.table(edge.source_table)?;
            let source = source_table.attribute(edge.source_attribute)?;
            let target_table = graph.table(edge.target_table)?;
            let target = target_table.attribute(edge.target_attribute)?;
            Some(DeferredEdge {
                source: format!("{}.{}", source_table.name, source.name),
                target: format!("{}.{}", target_table.name, target.name),
            })
        })
        .collect();

    EmissionReport {
        tables: plan.order.len(),
        edges,
        has_cycle: !deferred.is_empty(),
        order,
        deferred,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeSpec;
    use crate::types::AttributeType;

    fn add_pk(graph: &mut SchemaGraph, table: TableId) -> crate::schema::AttributeId {
        graph
            .add_attribute(table, AttributeSpec::new("id", AttributeType::Integer).primary_key())
            .expect("add primary key")
    }

    fn link(graph: &mut SchemaGraph, from: TableId, name: &str, to: TableId) {
        let target = graph
            .table(to)
            .and_then(|table| table.primary_key())
            .map(|pk| pk.id)
            .expect("target primary key");
        graph
            .add_attribute(
                from,
                AttributeSpec::new(name, AttributeType::Integer).references(to, target),
            )
            .expect("add foreign key");
    }

    #[test]
    fn referenced_tables_precede_referencing_tables() {
        let mut graph = SchemaGraph::new();
        let posts = graph.add_table("Posts").unwrap();
        let users = graph.add_table("Users").unwrap();
        add_pk(&mut graph, posts);
        add_pk(&mut graph, users);
        link(&mut graph, posts, "authorId", users);

        let plan = plan_emission(&graph);
        assert_eq!(plan.order, vec![users, posts]);
        assert!(plan.deferred.is_empty());
    }

    #[test]
    fn unconstrained_tables_keep_creation_order() {
        let mut graph = SchemaGraph::new();
        let a = graph.add_table("Alpha").unwrap();
        let b = graph.add_table("Beta").unwrap();
        let c = graph.add_table("Gamma").unwrap();

        let plan = plan_emission(&graph);
        assert_eq!(plan.order, vec![a, b, c]);
    }

    #[test]
    fn diamond_dependencies_resolve_deterministically() {
        let mut graph = SchemaGraph::new();
        let orders = graph.add_table("Orders").unwrap();
        let users = graph.add_table("Users").unwrap();
        let products = graph.add_table("Products").unwrap();
        for table in [orders, users, products] {
            add_pk(&mut graph, table);
        }
        link(&mut graph, orders, "userId", users);
        link(&mut graph, orders, "productId", products);

        let plan = plan_emission(&graph);
        assert_eq!(plan.order, vec![users, products, orders]);
        assert!(plan.deferred.is_empty());
    }

    #[test]
    fn two_node_cycle_defers_one_edge() {
        let mut graph = SchemaGraph::new();
        let a = graph.add_table("A").unwrap();
        let b = graph.add_table("B").unwrap();
        add_pk(&mut graph, a);
        add_pk(&mut graph, b);
        link(&mut graph, a, "bId", b);
        link(&mut graph, b, "aId", a);

        let plan = plan_emission(&graph);
        // A was created first, so the cycle breaks there.
        assert_eq!(plan.order, vec![a, b]);
        assert_eq!(plan.deferred.len(), 1);
        assert_eq!(plan.deferred[0].source_table, a);
        assert_eq!(plan.deferred[0].target_table, b);
    }

    #[test]
    fn self_reference_is_always_deferred() {
        let mut graph = SchemaGraph::new();
        let employees = graph.add_table("Employees").unwrap();
        add_pk(&mut graph, employees);
        link(&mut graph, employees, "managerId", employees);

        let plan = plan_emission(&graph);
        assert_eq!(plan.order, vec![employees]);
        assert_eq!(plan.deferred.len(), 1);
    }

    #[test]
    fn all_cyclic_graph_still_orders_every_table() {
        let mut graph = SchemaGraph::new();
        let a = graph.add_table("A").unwrap();
        let b = graph.add_table("B").unwrap();
        let c = graph.add_table("C").unwrap();
        for table in [a, b, c] {
            add_pk(&mut graph, table);
        }
        link(&mut graph, a, "bId", b);
        link(&mut graph, b, "cId", c);
        link(&mut graph, c, "aId", a);

        let plan = plan_emission(&graph);
        assert_eq!(plan.order.len(), 3);
        assert_eq!(plan.order[0], a);
        // Breaking at A frees C, which frees B.
        assert_eq!(plan.order, vec![a, c, b]);
        assert_eq!(plan.deferred.len(), 1);
        assert_eq!(plan.deferred[0].source_table, a);
    }

    #[test]
    fn cycle_plus_tail_defers_only_cycle_edges() {
        let mut graph = SchemaGraph::new();
        let a = graph.add_table("A").unwrap();
        let b = graph.add_table("B").unwrap();
        let logs = graph.add_table("Logs").unwrap();
        for table in [a, b, logs] {
            add_pk(&mut graph, table);
        }
        link(&mut graph, a, "bId", b);
        link(&mut graph, b, "aId", a);
        link(&mut graph, logs, "aId", a);

        let plan = plan_emission(&graph);
        assert_eq!(plan.order, vec![a, b, logs]);
        assert_eq!(plan.deferred.len(), 1);
        assert_eq!(plan.deferred[0].source_table, a);
        assert_eq!(plan.deferred[0].target_table, b);
    }

    #[test]
    fn report_resolves_names_and_flags_cycles() {
        let mut graph = SchemaGraph::new();
        let a = graph.add_table("A").unwrap();
        let b = graph.add_table("B").unwrap();
        add_pk(&mut graph, a);
        add_pk(&mut graph, b);
        link(&mut graph, a, "bId", b);
        link(&mut graph, b, "aId", a);

        let report = emission_report(&graph);
        assert_eq!(report.tables, 2);
        assert_eq!(report.edges, 2);
        assert!(report.has_cycle);
        assert_eq!(report.order, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(report.deferred.len(), 1);
        assert_eq!(report.deferred[0].source, "A.bId");
        assert_eq!(report.deferred[0].target, "B.id");
    }
}
