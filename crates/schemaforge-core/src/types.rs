use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Closed enumeration of column types understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeType {
    Integer,
    SmallInt,
    BigInt,
    Decimal,
    Float,
    Double,
    Char,
    Varchar,
    Text,
    Enum,
    Set,
    Date,
    Time,
    DateTime,
    Timestamp,
    Boolean,
    Binary,
    Varbinary,
    Blob,
    Geometry,
    Point,
    LineString,
    Polygon,
}

impl AttributeType {
    /// All members in declaration order.
    pub const ALL: [AttributeType; 23] = [
        AttributeType::Integer,
        AttributeType::SmallInt,
        AttributeType::BigInt,
        AttributeType::Decimal,
        AttributeType::Float,
        AttributeType::Double,
        AttributeType::Char,
        AttributeType::Varchar,
        AttributeType::Text,
        AttributeType::Enum,
        AttributeType::Set,
        AttributeType::Date,
        AttributeType::Time,
        AttributeType::DateTime,
        AttributeType::Timestamp,
        AttributeType::Boolean,
        AttributeType::Binary,
        AttributeType::Varbinary,
        AttributeType::Blob,
        AttributeType::Geometry,
        AttributeType::Point,
        AttributeType::LineString,
        AttributeType::Polygon,
    ];

    /// Parse a SQL type spelling into a member of the closed enumeration.
    pub fn parse(value: &str) -> Result<Self> {
        let spelling = value.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_sql() == spelling)
            .ok_or_else(|| Error::UnsupportedType(value.to_string()))
    }

    /// Canonical SQL spelling.
    pub fn as_sql(self) -> &'static str {
        match self {
            AttributeType::Integer => "INTEGER",
            AttributeType::SmallInt => "SMALLINT",
            AttributeType::BigInt => "BIGINT",
            AttributeType::Decimal => "DECIMAL",
            AttributeType::Float => "FLOAT",
            AttributeType::Double => "DOUBLE",
            AttributeType::Char => "CHAR",
            AttributeType::Varchar => "VARCHAR",
            AttributeType::Text => "TEXT",
            AttributeType::Enum => "ENUM",
            AttributeType::Set => "SET",
            AttributeType::Date => "DATE",
            AttributeType::Time => "TIME",
            AttributeType::DateTime => "DATETIME",
            AttributeType::Timestamp => "TIMESTAMP",
            AttributeType::Boolean => "BOOLEAN",
            AttributeType::Binary => "BINARY",
            AttributeType::Varbinary => "VARBINARY",
            AttributeType::Blob => "BLOB",
            AttributeType::Geometry => "GEOMETRY",
            AttributeType::Point => "POINT",
            AttributeType::LineString => "LINESTRING",
            AttributeType::Polygon => "POLYGON",
        }
    }

    /// Types that accept a `(length)` suffix; for DECIMAL it encodes precision.
    pub fn takes_length(self) -> bool {
        matches!(
            self,
            AttributeType::Char
                | AttributeType::Varchar
                | AttributeType::Binary
                | AttributeType::Varbinary
                | AttributeType::Decimal
        )
    }

    /// Types whose length is mandatory rather than optional.
    pub fn requires_length(self) -> bool {
        matches!(
            self,
            AttributeType::Char
                | AttributeType::Varchar
                | AttributeType::Binary
                | AttributeType::Varbinary
        )
    }

    /// Types that carry an ordered list of literal members.
    pub fn takes_values(self) -> bool {
        matches!(self, AttributeType::Enum | AttributeType::Set)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            AttributeType::Integer
                | AttributeType::SmallInt
                | AttributeType::BigInt
                | AttributeType::Decimal
                | AttributeType::Float
                | AttributeType::Double
        )
    }

    /// Whether DEFAULT literals of this type are rendered quoted.
    pub fn quotes_default(self) -> bool {
        !(self.is_numeric() || self == AttributeType::Boolean)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
