use crate::types::AttributeType;

/// Stable identity of a table; never reused within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u32);

/// Stable identity of an attribute; never reused within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeId(pub u32);

/// Display placement and color, carried through without interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableLayout {
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub color: Option<String>,
}

impl TableLayout {
    /// True when no display field is set.
    pub fn is_empty(&self) -> bool {
        self.position_x.is_none() && self.position_y.is_none() && self.color.is_none()
    }
}

/// A named table and its ordered attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub layout: TableLayout,
}

impl Table {
    /// The primary-key attribute, if any; at most one exists.
    pub fn primary_key(&self) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.constraints.primary_key)
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.id == id)
    }

    /// Case-insensitive attribute lookup by name.
    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        let wanted = name.to_lowercase();
        self.attributes
            .iter()
            .find(|attribute| attribute.name.to_lowercase() == wanted)
    }
}

/// Column definition owned by exactly one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    pub attribute_type: AttributeType,
    pub length: Option<u32>,
    pub values: Vec<String>,
    pub default_value: Option<String>,
    pub constraints: Constraints,
}

/// Column-level constraint flags plus the optional foreign key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub not_null: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub foreign_key: Option<ForeignKeyRef>,
}

/// Id-based reference to another table's primary-key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: TableId,
    pub attribute: AttributeId,
}

/// Directed foreign-key edge derived from attribute constraints.
///
/// Connections are a projection over `foreign_key` fields, recomputed on
/// demand; they are never stored or mutated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub source_table: TableId,
    pub source_attribute: AttributeId,
    pub target_table: TableId,
    pub target_attribute: AttributeId,
}

/// Attribute definition as supplied by callers; identity is assigned by the
/// graph when the attribute is added.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    pub name: String,
    pub attribute_type: AttributeType,
    pub length: Option<u32>,
    pub values: Vec<String>,
    pub default_value: Option<String>,
    pub constraints: Constraints,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            length: None,
            values: Vec::new(),
            default_value: None,
            constraints: Constraints::default(),
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.constraints.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.constraints.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.constraints.auto_increment = true;
        self
    }

    pub fn references(mut self, table: TableId, attribute: AttributeId) -> Self {
        self.constraints.foreign_key = Some(ForeignKeyRef { table, attribute });
        self
    }
}
