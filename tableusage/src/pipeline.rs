use crate::catalog::{self, build_info_schema, CatalogIdentifier, InfoSchema, TableIdentifier};
use crate::config::UsageConfig;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::source::{QueryHistorySource, QueryRecord, SchemaSource, TimeWindow};
use crate::usage::{aggregate_stream, UsageCounts, UsageStats};
use async_stream::try_stream;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, trace, warn};

/// Outcome of one usage run.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    dialect: Dialect,
    /// Filter entries as the caller wrote them, with their canonical form.
    requested: IndexMap<String, TableIdentifier>,
    unknown: Vec<String>,
    usage: UsageCounts,
}

impl UsageReport {
    /// Queries referencing the `catalog.schema.table` table.
    pub fn table_count(&self, identifier: &str) -> Result<u64> {
        match CatalogIdentifier::parse(identifier, self.dialect)? {
            CatalogIdentifier::Table(table) => self
                .usage
                .table_count(&table)
                .ok_or_else(|| Error::UnknownIdentifier(identifier.to_string())),
            CatalogIdentifier::Column(_) => {
                Err(catalog::error::Error::InvalidIdentifier(identifier.to_string()).into())
            }
        }
    }

    /// Queries referencing the `catalog.schema.table.column` column.
    pub fn column_count(&self, identifier: &str) -> Result<u64> {
        match CatalogIdentifier::parse(identifier, self.dialect)? {
            CatalogIdentifier::Column(column) => self
                .usage
                .column_count(&column)
                .ok_or_else(|| Error::UnknownIdentifier(identifier.to_string())),
            CatalogIdentifier::Table(_) => {
                Err(catalog::error::Error::InvalidIdentifier(identifier.to_string()).into())
            }
        }
    }

    /// Count per requested identifier, keyed the way the caller wrote it.
    /// Identifiers missing from the schema are left out, see
    /// [`UsageReport::unknown_identifiers`].
    pub fn counts(&self) -> IndexMap<String, u64> {
        self.requested
            .iter()
            .filter_map(|(text, table)| {
                self.usage
                    .table_count(table)
                    .map(|count| (text.clone(), count))
            })
            .collect()
    }

    pub fn unknown_identifiers(&self) -> &[String] {
        &self.unknown
    }

    pub fn stats(&self) -> &UsageStats {
        self.usage.stats()
    }

    pub fn usage(&self) -> &UsageCounts {
        &self.usage
    }
}

/// Computes usage counts from a schema source and a query history.
pub struct UsagePipeline<S, Q> {
    schema_source: S,
    query_source: Q,
    config: UsageConfig,
}

/// Run a pipeline with default settings for `dialect`.
pub async fn compute_usage<S, Q, T>(
    window: &TimeWindow,
    identifier_filter: &[T],
    dialect: Dialect,
    schema_source: &S,
    query_source: &Q,
) -> Result<UsageReport>
where
    S: SchemaSource,
    Q: QueryHistorySource,
    T: AsRef<str>,
{
    UsagePipeline::new(
        schema_source,
        query_source,
        UsageConfig::default().with_dialect(dialect),
    )
    .compute_usage(window, identifier_filter)
    .await
}

impl<S: SchemaSource, Q: QueryHistorySource> UsagePipeline<S, Q> {
    pub fn new(schema_source: S, query_source: Q, config: UsageConfig) -> Self {
        Self {
            schema_source,
            query_source,
            config,
        }
    }

    /// Count how many queries inside `window` reference each table of
    /// `identifier_filter`, plus each of their columns.
    ///
    /// The filter is checked before either source is called.
    #[instrument(
        skip_all,
        fields(dialect = %self.config.dialect, since = %window.since(), before = %window.before())
    )]
    pub async fn compute_usage<T: AsRef<str>>(
        &self,
        window: &TimeWindow,
        identifier_filter: &[T],
    ) -> Result<UsageReport> {
        let dialect = self.config.dialect;
        let requested = parse_filter(identifier_filter, dialect)?;
        let wanted = requested.values().cloned().collect::<IndexSet<_>>();
        info!(tables = wanted.len(), "computing usage");

        let identifiers = wanted.iter().map(ToString::to_string).collect::<IndexSet<_>>();
        let rows = self
            .with_timeout("schema fetch", self.schema_source.fetch_columns(&identifiers))
            .await??;
        let info_schema = build_info_schema(rows, dialect)?.retain(|table| wanted.contains(table));
        let unknown = requested
            .iter()
            .filter(|(_, table)| !info_schema.contains_table(table))
            .map(|(text, _)| text.clone())
            .collect::<Vec<_>>();
        if !unknown.is_empty() {
            warn!(?unknown, "identifiers not found in schema");
        }

        let usage = self
            .with_timeout("query history", self.drain(window, Arc::new(info_schema)))
            .await??;
        let stats = usage.stats();
        info!(
            queries = stats.queries_seen,
            referencing = stats.queries_referencing,
            skipped = stats.queries_skipped,
            "computed usage"
        );
        if stats.has_discards() {
            warn!(
                tables = stats.ambiguous_references,
                columns = stats.ambiguous_columns,
                "ambiguous references were not counted"
            );
        }
        Ok(UsageReport {
            dialect,
            requested,
            unknown,
            usage,
        })
    }

    async fn drain(
        &self,
        window: &TimeWindow,
        info_schema: Arc<InfoSchema>,
    ) -> Result<UsageCounts> {
        let records = self.query_source.fetch_queries(window).await?;
        let window = *window;
        let records = try_stream! {
            for await record in records {
                let record: QueryRecord = record?;
                if window.contains(&record.start_time) {
                    yield record;
                } else {
                    trace!(
                        query_id = ?record.query_id,
                        start_time = %record.start_time,
                        "dropping query outside window"
                    );
                }
            }
        };
        aggregate_stream(
            records,
            info_schema,
            self.config.dialect,
            &self.config.aggregate_options(),
        )
        .await
    }

    async fn with_timeout<F: Future>(&self, what: &'static str, future: F) -> Result<F::Output> {
        match self.config.fetch_timeout() {
            Some(limit) => tokio::time::timeout(limit, future)
                .await
                .map_err(|_| Error::Timeout(what, limit.as_secs())),
            None => Ok(future.await),
        }
    }
}

fn parse_filter<T: AsRef<str>>(
    identifier_filter: &[T],
    dialect: Dialect,
) -> Result<IndexMap<String, TableIdentifier>> {
    if identifier_filter.is_empty() {
        return Err(Error::EmptyFilter);
    }
    identifier_filter
        .iter()
        .map(|text| -> Result<(String, TableIdentifier)> {
            let text = text.as_ref();
            match CatalogIdentifier::parse(text, dialect)? {
                CatalogIdentifier::Table(table) => Ok((text.to_string(), table)),
                CatalogIdentifier::Column(_) => {
                    Err(catalog::error::Error::InvalidIdentifier(text.to_string()).into())
                }
            }
        })
        .collect()
}
