use crate::error::{Error, Result};
use crate::schema::{
    Attribute, AttributeId, AttributeSpec, Connection, ForeignKeyRef, Table, TableId, TableLayout,
};
use crate::types::AttributeType;

/// Name of the audit attribute seeded into every new table.
pub const SEED_ATTRIBUTE: &str = "createdAt";

/// In-memory relational schema with validated, atomic mutations.
///
/// Every mutation validates before the first write: a returned error implies
/// the graph is unchanged. Foreign keys reference tables and attributes by
/// stable id; names matter only for uniqueness checks and at the document
/// and DDL boundaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaGraph {
    database_name: String,
    tables: Vec<Table>,
    next_table_id: u32,
    next_attribute_id: u32,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn set_database_name(&mut self, name: impl Into<String>) {
        self.database_name = name.into();
    }

    /// Drop every table and the database name.
    pub fn clear(&mut self) {
        self.database_name.clear();
        self.tables.clear();
    }

    /// Tables in creation order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|table| table.id == id)
    }

    /// Case-insensitive table lookup by name.
    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        let wanted = name.to_lowercase();
        self.tables
            .iter()
            .find(|table| table.name.to_lowercase() == wanted)
    }

    /// Create a table seeded with the `createdAt` audit attribute.
    pub fn add_table(&mut self, name: &str) -> Result<TableId> {
        let id = self.add_empty_table(name)?;
        let seed = Attribute {
            id: self.fresh_attribute_id(),
            name: SEED_ATTRIBUTE.to_string(),
            attribute_type: AttributeType::Timestamp,
            length: None,
            values: Vec::new(),
            default_value: None,
            constraints: crate::schema::Constraints {
                auto_increment: true,
                ..Default::default()
            },
        };
        if let Some(table) = self.table_mut(id) {
            table.attributes.push(seed);
        }
        Ok(id)
    }

    /// Create a table with no attributes; used by the document loader, which
    /// supplies every attribute itself.
    pub(crate) fn add_empty_table(&mut self, name: &str) -> Result<TableId> {
        if self.table_by_name(name).is_some() {
            return Err(Error::DuplicateName(name.to_string()));
        }
        let id = TableId(self.next_table_id);
        self.next_table_id += 1;
        self.tables.push(Table {
            id,
            name: name.to_string(),
            attributes: Vec::new(),
            layout: TableLayout::default(),
        });
        Ok(id)
    }

    pub fn rename_table(&mut self, id: TableId, new_name: &str) -> Result<()> {
        self.require_table(id)?;
        if let Some(existing) = self.table_by_name(new_name) {
            if existing.id != id {
                return Err(Error::DuplicateName(new_name.to_string()));
            }
        }
        if let Some(table) = self.table_mut(id) {
            table.name = new_name.to_string();
        }
        Ok(())
    }

    /// Remove a table and cascade: every foreign key elsewhere that points
    /// into it is cleared in the same mutation, so no dangling reference
    /// survives.
    pub fn delete_table(&mut self, id: TableId) -> Result<()> {
        self.require_table(id)?;
        self.tables.retain(|table| table.id != id);
        for table in &mut self.tables {
            for attribute in &mut table.attributes {
                if attribute
                    .constraints
                    .foreign_key
                    .is_some_and(|fk| fk.table == id)
                {
                    attribute.constraints.foreign_key = None;
                }
            }
        }
        Ok(())
    }

    /// Replace or clear the display data carried for a table.
    pub fn set_table_layout(&mut self, id: TableId, layout: TableLayout) -> Result<()> {
        self.require_table(id)?;
        if let Some(table) = self.table_mut(id) {
            table.layout = layout;
        }
        Ok(())
    }

    /// Append a validated attribute to a table.
    pub fn add_attribute(&mut self, table_id: TableId, spec: AttributeSpec) -> Result<AttributeId> {
        let table = self.require_table(table_id)?;
        self.validate_spec(table, &spec, None)?;
        let id = self.fresh_attribute_id();
        if let Some(table) = self.table_mut(table_id) {
            table.attributes.push(Attribute {
                id,
                name: spec.name,
                attribute_type: spec.attribute_type,
                length: spec.length,
                values: spec.values,
                default_value: spec.default_value,
                constraints: spec.constraints,
            });
        }
        Ok(id)
    }

    /// Remove the attribute at `index`. A foreign-key source takes its edge
    /// with it; a referenced primary key cascades, clearing `foreign_key` on
    /// every attribute that pointed at it.
    pub fn delete_attribute(&mut self, table_id: TableId, index: usize) -> Result<()> {
        let table = self.require_table(table_id)?;
        let victim = table.attributes.get(index).ok_or_else(|| {
            Error::NotFound(format!("attribute index {index} in table {}", table.name))
        })?;
        let cascade = victim.constraints.primary_key.then_some(ForeignKeyRef {
            table: table_id,
            attribute: victim.id,
        });
        if let Some(table) = self.table_mut(table_id) {
            table.attributes.remove(index);
        }
        if let Some(target) = cascade {
            self.clear_references_to(target);
        }
        Ok(())
    }

    /// Replace the attribute at `index`, re-validating as if it were being
    /// re-added. Identity is preserved; demoting a referenced primary key
    /// cascades exactly like deleting it.
    pub fn update_attribute(
        &mut self,
        table_id: TableId,
        index: usize,
        spec: AttributeSpec,
    ) -> Result<()> {
        let table = self.require_table(table_id)?;
        let current = table.attributes.get(index).ok_or_else(|| {
            Error::NotFound(format!("attribute index {index} in table {}", table.name))
        })?;
        let id = current.id;
        self.validate_spec(table, &spec, Some(id))?;
        let was_primary_key = current.constraints.primary_key;
        let demoted = was_primary_key && !spec.constraints.primary_key;
        if let Some(table) = self.table_mut(table_id) {
            table.attributes[index] = Attribute {
                id,
                name: spec.name,
                attribute_type: spec.attribute_type,
                length: spec.length,
                values: spec.values,
                default_value: spec.default_value,
                constraints: spec.constraints,
            };
        }
        if demoted {
            self.clear_references_to(ForeignKeyRef {
                table: table_id,
                attribute: id,
            });
        }
        Ok(())
    }

    /// The derived edge set: one connection per populated `foreign_key`
    /// field, in table and attribute insertion order.
    pub fn connections(&self) -> Vec<Connection> {
        let mut edges = Vec::new();
        for table in &self.tables {
            for attribute in &table.attributes {
                if let Some(fk) = attribute.constraints.foreign_key {
                    edges.push(Connection {
                        source_table: table.id,
                        source_attribute: attribute.id,
                        target_table: fk.table,
                        target_attribute: fk.attribute,
                    });
                }
            }
        }
        edges
    }

    fn require_table(&self, id: TableId) -> Result<&Table> {
        self.table(id)
            .ok_or_else(|| Error::NotFound(format!("table id {}", id.0)))
    }

    fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|table| table.id == id)
    }

    fn fresh_attribute_id(&mut self) -> AttributeId {
        let id = AttributeId(self.next_attribute_id);
        self.next_attribute_id += 1;
        id
    }

    /// Check a spec against `table` as if it were being added; `exclude`
    /// names the attribute being replaced during an update so it does not
    /// collide with itself.
    fn validate_spec(
        &self,
        table: &Table,
        spec: &AttributeSpec,
        exclude: Option<AttributeId>,
    ) -> Result<()> {
        let wanted = spec.name.to_lowercase();
        let collision = table.attributes.iter().any(|attribute| {
            Some(attribute.id) != exclude && attribute.name.to_lowercase() == wanted
        });
        if collision {
            return Err(Error::DuplicateName(format!(
                "{}.{}",
                table.name, spec.name
            )));
        }

        if spec.attribute_type.requires_length() && spec.length.is_none() {
            return Err(Error::InvalidAttribute(format!(
                "{} requires a length for type {}",
                spec.name, spec.attribute_type
            )));
        }
        if spec.attribute_type.takes_values() && spec.values.is_empty() {
            return Err(Error::InvalidAttribute(format!(
                "{} requires at least one value for type {}",
                spec.name, spec.attribute_type
            )));
        }

        if spec.constraints.primary_key {
            let other_pk = table
                .attributes
                .iter()
                .any(|attribute| Some(attribute.id) != exclude && attribute.constraints.primary_key);
            if other_pk {
                return Err(Error::MultiplePrimaryKey(table.name.clone()));
            }
        }

        if let Some(fk) = spec.constraints.foreign_key {
            self.validate_foreign_key(table, spec, fk, exclude)?;
        }

        Ok(())
    }

    fn validate_foreign_key(
        &self,
        table: &Table,
        spec: &AttributeSpec,
        fk: ForeignKeyRef,
        exclude: Option<AttributeId>,
    ) -> Result<()> {
        let target_table = self.table(fk.table).ok_or_else(|| {
            Error::InvalidForeignKey(format!(
                "{}.{} references unknown table id {}",
                table.name, spec.name, fk.table.0
            ))
        })?;

        // An update may point an attribute at itself; the target state is
        // then the incoming spec, not the stored attribute.
        if fk.table == table.id && Some(fk.attribute) == exclude {
            if spec.constraints.primary_key {
                return Ok(());
            }
            return Err(Error::InvalidForeignKey(format!(
                "{}.{} references an attribute that is not a primary key",
                table.name, spec.name
            )));
        }

        let target = target_table.attribute(fk.attribute).ok_or_else(|| {
            Error::InvalidForeignKey(format!(
                "{}.{} references unknown attribute id {} in table {}",
                table.name, spec.name, fk.attribute.0, target_table.name
            ))
        })?;
        if !target.constraints.primary_key {
            return Err(Error::InvalidForeignKey(format!(
                "{}.{} references {}.{}, which is not a primary key",
                table.name, spec.name, target_table.name, target.name
            )));
        }
        Ok(())
    }

    fn clear_references_to(&mut self, target: ForeignKeyRef) {
        for table in &mut self.tables {
            for attribute in &mut table.attributes {
                if attribute.constraints.foreign_key == Some(target) {
                    attribute.constraints.foreign_key = None;
                }
            }
        }
    }
}
