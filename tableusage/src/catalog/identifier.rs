use crate::catalog::error::Error;
use crate::dialect::Dialect;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Canonical `catalog.schema.table` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableIdentifier {
    catalog: String,
    schema: String,
    table: String,
}

/// Canonical `catalog.schema.table.column` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnIdentifier {
    table: TableIdentifier,
    column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CatalogIdentifier {
    Table(TableIdentifier),
    Column(ColumnIdentifier),
}

impl TableIdentifier {
    /// Build from raw parts, canonicalizing each one with `dialect`.
    pub fn new(catalog: &str, schema: &str, table: &str, dialect: Dialect) -> Self {
        Self::from_canonical(
            dialect.canonicalize(catalog),
            dialect.canonicalize(schema),
            dialect.canonicalize(table),
        )
    }

    /// Build from names as the warehouse stores them. Parts are trimmed and
    /// otherwise kept verbatim.
    pub(crate) fn stored(catalog: &str, schema: &str, table: &str) -> Self {
        Self::from_canonical(
            catalog.trim().to_string(),
            schema.trim().to_string(),
            table.trim().to_string(),
        )
    }

    pub(crate) fn from_canonical(catalog: String, schema: String, table: String) -> Self {
        Self {
            catalog,
            schema,
            table,
        }
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn parts(&self) -> [&str; 3] {
        [&self.catalog, &self.schema, &self.table]
    }

    pub(crate) fn column(&self, column: impl Into<String>) -> ColumnIdentifier {
        ColumnIdentifier {
            table: self.clone(),
            column: column.into(),
        }
    }
}

impl ColumnIdentifier {
    pub fn new(table: TableIdentifier, column: &str, dialect: Dialect) -> Self {
        table.column(dialect.canonicalize(column))
    }

    pub fn table(&self) -> &TableIdentifier {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl CatalogIdentifier {
    /// Parse dotted identifier text with three (table) or four (column) parts.
    pub fn parse(text: &str, dialect: Dialect) -> Result<Self, Error> {
        let parts = dialect.canonical_parts(&dialect.split_identifier(text));
        if parts.iter().any(|part| part.is_empty()) {
            return Err(Error::InvalidIdentifier(text.to_string()));
        }
        let mut parts = parts.into_iter();
        match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(catalog), Some(schema), Some(table), None, None) => Ok(Self::Table(
                TableIdentifier::from_canonical(catalog, schema, table),
            )),
            (Some(catalog), Some(schema), Some(table), Some(column), None) => Ok(Self::Column(
                TableIdentifier::from_canonical(catalog, schema, table).column(column),
            )),
            _ => Err(Error::InvalidIdentifier(text.to_string())),
        }
    }

    pub fn table(&self) -> &TableIdentifier {
        match self {
            CatalogIdentifier::Table(table) => table,
            CatalogIdentifier::Column(column) => column.table(),
        }
    }
}

impl Display for TableIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

impl Display for ColumnIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

impl Display for CatalogIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogIdentifier::Table(table) => table.fmt(f),
            CatalogIdentifier::Column(column) => column.fmt(f),
        }
    }
}

impl From<TableIdentifier> for CatalogIdentifier {
    fn from(table: TableIdentifier) -> Self {
        Self::Table(table)
    }
}

impl From<ColumnIdentifier> for CatalogIdentifier {
    fn from(column: ColumnIdentifier) -> Self {
        Self::Column(column)
    }
}

// Identifiers are map keys in serialized reports, so they serialize as strings.
impl Serialize for TableIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for ColumnIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for CatalogIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
