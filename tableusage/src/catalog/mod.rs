use crate::catalog::error::Error;
use crate::dialect::Dialect;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use tracing::debug;

pub mod error;
mod identifier;
mod row;

pub use identifier::{CatalogIdentifier, ColumnIdentifier, TableIdentifier};
pub use row::SchemaRow;

/// Outcome of looking a written table name up in an [`InfoSchema`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(TableIdentifier),
    Ambiguous(Vec<TableIdentifier>),
    NotFound,
}

/// Tables and their columns, keyed by canonical identifier.
///
/// Tables and columns keep first-seen order. Besides the primary map the
/// schema keeps reverse indexes by bare table name, by `(schema, table)` and
/// by column name.
#[derive(Debug, Clone, Default)]
pub struct InfoSchema {
    dialect: Dialect,
    tables: IndexMap<TableIdentifier, IndexSet<String>>,
    by_name: HashMap<String, Vec<TableIdentifier>>,
    by_schema: HashMap<(String, String), Vec<TableIdentifier>>,
    by_column: HashMap<String, Vec<TableIdentifier>>,
}

/// Group raw `information_schema.columns` rows into an [`InfoSchema`].
///
/// Stored names are already resolved by the warehouse, so they are only
/// trimmed, never folded: `Orders` in a snowflake catalog names the table
/// created as `"Orders"`, and only `"Orders"` in query text resolves to it.
pub fn build_info_schema<I>(rows: I, dialect: Dialect) -> Result<InfoSchema, Error>
where
    I: IntoIterator<Item = SchemaRow>,
{
    let mut info_schema = InfoSchema::new(dialect);
    for (index, row) in rows.into_iter().enumerate() {
        let catalog = required_part(row.table_catalog.as_deref(), index, "catalog")?;
        let schema = required_part(row.table_schema.as_deref(), index, "schema")?;
        let table = required_part(row.table_name.as_deref(), index, "table")?;
        let table = TableIdentifier::stored(catalog, schema, table);
        info_schema.add_table(&table);
        if let Some(column) = row.column_name.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            info_schema.add_column(&table, column.to_string());
        }
    }
    debug!(
        tables = info_schema.len(),
        columns = info_schema.column_count(),
        %dialect,
        "built info schema"
    );
    Ok(info_schema)
}

fn required_part<'a>(
    part: Option<&'a str>,
    index: usize,
    name: &'static str,
) -> Result<&'a str, Error> {
    match part {
        Some(part) if !part.trim().is_empty() => Ok(part),
        _ => Err(Error::MalformedRow { index, part: name }),
    }
}

impl InfoSchema {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(IndexSet::len).sum()
    }

    pub fn tables(&self) -> impl Iterator<Item = (&TableIdentifier, &IndexSet<String>)> {
        self.tables.iter()
    }

    pub fn read_table(&self, table: &TableIdentifier) -> Option<&IndexSet<String>> {
        self.tables.get(table)
    }

    pub fn contains_table(&self, table: &TableIdentifier) -> bool {
        self.tables.contains_key(table)
    }

    pub fn contains_column(&self, column: &ColumnIdentifier) -> bool {
        self.read_table(column.table())
            .map_or(false, |columns| columns.contains(column.column()))
    }

    pub fn read_tables_by_name(&self, table: &str) -> &[TableIdentifier] {
        self.by_name.get(table).map_or(&[], Vec::as_slice)
    }

    pub fn read_tables_by_schema(&self, schema: &str, table: &str) -> &[TableIdentifier] {
        self.by_schema
            .get(&(schema.to_string(), table.to_string()))
            .map_or(&[], Vec::as_slice)
    }

    pub fn read_tables_with_column(&self, column: &str) -> &[TableIdentifier] {
        self.by_column.get(column).map_or(&[], Vec::as_slice)
    }

    /// Resolve canonical name parts to a table.
    ///
    /// Three parts must match exactly. Two parts (`schema.table`) and one part
    /// (`table`) must match exactly one table, otherwise the name is ambiguous.
    pub fn resolve_table<S: AsRef<str>>(&self, parts: &[S]) -> Resolution {
        match parts {
            [catalog, schema, table] => {
                let ident = TableIdentifier::from_canonical(
                    catalog.as_ref().to_string(),
                    schema.as_ref().to_string(),
                    table.as_ref().to_string(),
                );
                if self.contains_table(&ident) {
                    Resolution::Resolved(ident)
                } else {
                    Resolution::NotFound
                }
            }
            [schema, table] => {
                Self::resolution(self.read_tables_by_schema(schema.as_ref(), table.as_ref()))
            }
            [table] => Self::resolution(self.read_tables_by_name(table.as_ref())),
            _ => Resolution::NotFound,
        }
    }

    /// A copy restricted to the tables `keep` accepts.
    pub fn retain<F>(&self, mut keep: F) -> InfoSchema
    where
        F: FnMut(&TableIdentifier) -> bool,
    {
        let mut info_schema = InfoSchema::new(self.dialect);
        for (table, columns) in self.tables.iter().filter(|(table, _)| keep(table)) {
            info_schema.add_table(table);
            for column in columns {
                info_schema.add_column(table, column.clone());
            }
        }
        info_schema
    }

    fn resolution(candidates: &[TableIdentifier]) -> Resolution {
        match candidates {
            [] => Resolution::NotFound,
            [table] => Resolution::Resolved(table.clone()),
            _ => Resolution::Ambiguous(candidates.to_vec()),
        }
    }

    fn add_table(&mut self, table: &TableIdentifier) {
        if self.tables.contains_key(table) {
            return;
        }
        self.tables.insert(table.clone(), IndexSet::new());
        self.by_name
            .entry(table.table().to_string())
            .or_default()
            .push(table.clone());
        self.by_schema
            .entry((table.schema().to_string(), table.table().to_string()))
            .or_default()
            .push(table.clone());
    }

    fn add_column(&mut self, table: &TableIdentifier, column: String) {
        let Some(columns) = self.tables.get_mut(table) else {
            return;
        };
        if columns.insert(column.clone()) {
            self.by_column.entry(column).or_default().push(table.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<SchemaRow> {
        vec![
            SchemaRow::new("DB", "PUBLIC", "ORDERS", "ID"),
            SchemaRow::new("DB", "PUBLIC", "ORDERS", "AMOUNT"),
            SchemaRow::new(" DB", "PUBLIC", "ORDERS ", "ID"),
            SchemaRow::new("DB", "PUBLIC", "CUSTOMERS", "ID"),
            SchemaRow::new("DB", "PUBLIC", "CUSTOMERS", "NAME"),
            SchemaRow::new("DB", "STAGING", "ORDERS", "ID"),
        ]
    }

    #[test]
    fn build() -> Result<(), Error> {
        let info_schema = build_info_schema(rows(), Dialect::Snowflake)?;
        assert_eq!(info_schema.len(), 3);
        assert_eq!(info_schema.column_count(), 5);
        let orders = TableIdentifier::new("DB", "PUBLIC", "ORDERS", Dialect::Snowflake);
        assert_eq!(
            info_schema
                .read_table(&orders)
                .map(|columns| columns.iter().map(String::as_str).collect::<Vec<_>>()),
            Some(vec!["ID", "AMOUNT"])
        );
        let tables = info_schema
            .tables()
            .map(|(table, _)| table.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            tables,
            vec!["DB.PUBLIC.ORDERS", "DB.PUBLIC.CUSTOMERS", "DB.STAGING.ORDERS"]
        );
        assert_eq!(info_schema.read_tables_with_column("ID").len(), 3);
        assert_eq!(info_schema.read_tables_with_column("NAME").len(), 1);
        assert!(info_schema.contains_column(&orders.column("AMOUNT")));
        assert!(!info_schema.contains_column(&orders.column("NAME")));
        Ok(())
    }

    #[test]
    fn no_orphan_columns() -> Result<(), Error> {
        let info_schema = build_info_schema(rows(), Dialect::Postgres)?;
        for row in rows() {
            let table = TableIdentifier::stored(
                row.table_catalog.as_deref().unwrap(),
                row.table_schema.as_deref().unwrap(),
                row.table_name.as_deref().unwrap(),
            );
            let column = table.column(row.column_name.as_deref().unwrap().trim());
            assert!(info_schema.contains_table(&table));
            assert!(info_schema.contains_column(&column));
        }
        Ok(())
    }

    #[test]
    fn stored_names_keep_case() -> Result<(), Error> {
        let rows = vec![
            SchemaRow::new("DB", "PUBLIC", "Orders", "Id"),
            SchemaRow::new("DB", "PUBLIC", "ORDERS", "ID"),
            SchemaRow::new("db", "public", "events", "id"),
        ];
        for dialect in [Dialect::Snowflake, Dialect::Postgres] {
            let info_schema = build_info_schema(rows.clone(), dialect)?;
            assert_eq!(info_schema.len(), 3);
            let quoted = TableIdentifier::new("db", "public", "\"Orders\"", Dialect::Snowflake);
            assert!(info_schema.contains_column(&quoted.column("Id")));
            assert!(!info_schema.contains_column(&quoted.column("ID")));
            assert_eq!(
                info_schema.resolve_table(&["DB", "PUBLIC", "Orders"]),
                Resolution::Resolved(quoted)
            );
            assert!(matches!(
                info_schema.resolve_table(&["db", "public", "events"]),
                Resolution::Resolved(_)
            ));
        }
        Ok(())
    }

    #[test]
    fn malformed_rows() {
        let mut missing_schema = SchemaRow::new("db", "public", "orders", "id");
        missing_schema.table_schema = None;
        let rows = vec![SchemaRow::new("db", "public", "orders", "id"), missing_schema];
        assert_eq!(
            build_info_schema(rows, Dialect::Snowflake).unwrap_err(),
            Error::MalformedRow {
                index: 1,
                part: "schema"
            }
        );
        let empty_table = SchemaRow::new("db", "public", "  ", "id");
        assert_eq!(
            build_info_schema(vec![empty_table], Dialect::Snowflake).unwrap_err(),
            Error::MalformedRow {
                index: 0,
                part: "table"
            }
        );
    }

    #[test]
    fn table_without_columns() -> Result<(), Error> {
        let mut row = SchemaRow::new("db", "public", "empty", "");
        row.column_name = None;
        let info_schema = build_info_schema(vec![row], Dialect::Snowflake)?;
        assert_eq!(info_schema.len(), 1);
        assert_eq!(info_schema.column_count(), 0);
        Ok(())
    }

    #[test]
    fn resolve_table() -> Result<(), Error> {
        let info_schema = build_info_schema(rows(), Dialect::Snowflake)?;
        let public_orders = TableIdentifier::new("DB", "PUBLIC", "ORDERS", Dialect::Snowflake);
        let staging_orders = TableIdentifier::new("DB", "STAGING", "ORDERS", Dialect::Snowflake);
        assert_eq!(
            info_schema.resolve_table(&["DB", "PUBLIC", "ORDERS"]),
            Resolution::Resolved(public_orders.clone())
        );
        assert_eq!(
            info_schema.resolve_table(&["OTHER", "PUBLIC", "ORDERS"]),
            Resolution::NotFound
        );
        assert_eq!(
            info_schema.resolve_table(&["STAGING", "ORDERS"]),
            Resolution::Resolved(staging_orders.clone())
        );
        assert_eq!(
            info_schema.resolve_table(&["ORDERS"]),
            Resolution::Ambiguous(vec![public_orders, staging_orders])
        );
        assert!(matches!(
            info_schema.resolve_table(&["CUSTOMERS"]),
            Resolution::Resolved(_)
        ));
        assert_eq!(info_schema.resolve_table(&["orders"]), Resolution::NotFound);
        assert_eq!(
            info_schema.resolve_table::<&str>(&[]),
            Resolution::NotFound
        );

        let info_schema = build_info_schema(
            vec![
                SchemaRow::new("A", "PUBLIC", "ORDERS", "ID"),
                SchemaRow::new("B", "PUBLIC", "ORDERS", "ID"),
            ],
            Dialect::Snowflake,
        )?;
        assert_eq!(
            info_schema.resolve_table(&["PUBLIC", "ORDERS"]),
            Resolution::Ambiguous(vec![
                TableIdentifier::stored("A", "PUBLIC", "ORDERS"),
                TableIdentifier::stored("B", "PUBLIC", "ORDERS"),
            ])
        );
        Ok(())
    }

    #[test]
    fn retain() -> Result<(), Error> {
        let info_schema = build_info_schema(rows(), Dialect::Snowflake)?;
        let public = info_schema.retain(|table| table.schema() == "PUBLIC");
        assert_eq!(public.len(), 2);
        assert_eq!(public.read_tables_by_name("ORDERS").len(), 1);
        assert_eq!(public.read_tables_with_column("ID").len(), 2);
        Ok(())
    }
}
