use crate::catalog::SchemaRow;
use crate::source::{
    Error, QueryHistorySource, QueryRecord, SchemaSource, SourceResult, TimeWindow,
};
use futures::{stream, Stream};
use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const INFORMATION_SCHEMA: &str = "information_schema";

/// Schema rows held in memory, e.g. loaded from an `information_schema`
/// export.
#[derive(Debug, Clone, Default)]
pub struct MemorySchemaSource {
    rows: Vec<SchemaRow>,
}

/// Query history held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueryHistory {
    records: Vec<QueryRecord>,
}

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> SourceResult<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

impl MemorySchemaSource {
    pub fn new(rows: Vec<SchemaRow>) -> Self {
        Self { rows }
    }

    /// Load a JSON array of rows.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        read_json(path).map(Self::new)
    }

    pub fn rows(&self) -> &[SchemaRow] {
        &self.rows
    }
}

impl SchemaSource for MemorySchemaSource {
    async fn fetch_columns(&self, identifiers: &IndexSet<String>) -> SourceResult<Vec<SchemaRow>> {
        let wanted = identifiers
            .iter()
            .map(|ident| ident.to_lowercase())
            .collect::<IndexSet<_>>();
        Ok(self
            .rows
            .iter()
            .filter(|row| {
                let Some(path) = row.table_path() else {
                    return false;
                };
                !row.table_schema
                    .as_deref()
                    .is_some_and(|schema| schema.eq_ignore_ascii_case(INFORMATION_SCHEMA))
                    && wanted.contains(&path.to_lowercase())
            })
            .cloned()
            .collect())
    }
}

impl MemoryQueryHistory {
    pub fn new(records: Vec<QueryRecord>) -> Self {
        Self { records }
    }

    /// Load a JSON array of records.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        read_json(path).map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl QueryHistorySource for MemoryQueryHistory {
    async fn fetch_queries(
        &self,
        window: &TimeWindow,
    ) -> SourceResult<impl Stream<Item = SourceResult<QueryRecord>>> {
        let records = self
            .records
            .iter()
            .filter(|record| window.contains(&record.start_time))
            .cloned()
            .collect::<Vec<_>>();
        Ok(stream::iter(records.into_iter().map(Ok::<_, Error>)))
    }
}
