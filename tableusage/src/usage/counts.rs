use crate::catalog::{ColumnIdentifier, InfoSchema, TableIdentifier};
use crate::sql::ReferenceSet;
use indexmap::IndexMap;
use serde::Serialize;

/// Run statistics, kept beside the counts so a run that discarded
/// references can be told apart from a clean one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub queries_seen: u64,
    pub queries_skipped: u64,
    /// Queries that referenced at least one table.
    pub queries_referencing: u64,
    pub ambiguous_references: u64,
    pub ambiguous_columns: u64,
}

impl UsageStats {
    pub fn merge(&mut self, other: UsageStats) {
        self.queries_seen += other.queries_seen;
        self.queries_skipped += other.queries_skipped;
        self.queries_referencing += other.queries_referencing;
        self.ambiguous_references += other.ambiguous_references;
        self.ambiguous_columns += other.ambiguous_columns;
    }

    pub fn has_discards(&self) -> bool {
        self.ambiguous_references > 0 || self.ambiguous_columns > 0
    }
}

/// Number of queries referencing each table and column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageCounts {
    tables: IndexMap<TableIdentifier, u64>,
    columns: IndexMap<ColumnIdentifier, u64>,
    stats: UsageStats,
}

impl UsageCounts {
    /// Counts seeded with zero for every table of `info_schema`, and for
    /// every column too when `count_columns` is set.
    pub fn new(info_schema: &InfoSchema, count_columns: bool) -> Self {
        let mut counts = Self::default();
        for (table, columns) in info_schema.tables() {
            counts.tables.insert(table.clone(), 0);
            if count_columns {
                for column in columns {
                    counts.columns.insert(table.column(column.clone()), 0);
                }
            }
        }
        counts
    }

    /// Add one query's references.
    pub fn record(&mut self, references: &ReferenceSet) {
        self.stats.queries_seen += 1;
        if !references.tables.is_empty() {
            self.stats.queries_referencing += 1;
        }
        self.stats.ambiguous_references += references.ambiguous_tables() as u64;
        self.stats.ambiguous_columns += references.ambiguous_columns() as u64;
        for table in &references.tables {
            *self.tables.entry(table.clone()).or_insert(0) += 1;
        }
        for column in &references.columns {
            *self.columns.entry(column.clone()).or_insert(0) += 1;
        }
    }

    /// Note a query that was seen but not examined.
    pub fn record_skipped(&mut self) {
        self.stats.queries_seen += 1;
        self.stats.queries_skipped += 1;
    }

    pub fn merge(&mut self, other: UsageCounts) {
        for (table, count) in other.tables {
            *self.tables.entry(table).or_insert(0) += count;
        }
        for (column, count) in other.columns {
            *self.columns.entry(column).or_insert(0) += count;
        }
        self.stats.merge(other.stats);
    }

    pub fn table_count(&self, table: &TableIdentifier) -> Option<u64> {
        self.tables.get(table).copied()
    }

    pub fn column_count(&self, column: &ColumnIdentifier) -> Option<u64> {
        self.columns.get(column).copied()
    }

    pub fn tables(&self) -> impl Iterator<Item = (&TableIdentifier, u64)> {
        self.tables.iter().map(|(table, count)| (table, *count))
    }

    pub fn columns(&self) -> impl Iterator<Item = (&ColumnIdentifier, u64)> {
        self.columns.iter().map(|(column, count)| (column, *count))
    }

    pub fn stats(&self) -> &UsageStats {
        &self.stats
    }
}
