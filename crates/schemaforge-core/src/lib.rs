//! Core contracts and helpers for Schemaforge.
//!
//! This crate defines the canonical schema graph, the mutation rules that
//! keep it structurally valid, the resolver that orders tables for DDL
//! emission, and the serialized document contract shared with editors and
//! storage.

pub mod document;
pub mod error;
pub mod graph;
pub mod resolver;
pub mod schema;
pub mod types;
pub mod validation;

pub use document::{
    DocumentAttribute, DocumentConnection, DocumentConstraints, DocumentForeignKey, DocumentTable,
    LoadOptions, OnInconsistency, SchemaDocument,
};
pub use error::{Error, Result};
pub use graph::{SchemaGraph, SEED_ATTRIBUTE};
pub use resolver::{emission_report, plan_emission, DeferredEdge, EmissionPlan, EmissionReport};
pub use schema::{
    Attribute, AttributeId, AttributeSpec, Connection, Constraints, ForeignKeyRef, Table, TableId,
    TableLayout,
};
pub use types::AttributeType;
pub use validation::validate_graph;
