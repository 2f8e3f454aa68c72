use crate::catalog::InfoSchema;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::source::{QueryRecord, QueryStatus, SourceResult};
use crate::sql::{extract_references, extract_references_in_context, ReferenceSet};
use futures::{pin_mut, Stream, TryStreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

mod counts;

pub use counts::{UsageCounts, UsageStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    pub count_columns: bool,
    pub include_failed_queries: bool,
    pub use_session_context: bool,
    /// Extraction workers for [`aggregate_stream`]. One means inline.
    pub workers: usize,
    pub batch_size: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            count_columns: true,
            include_failed_queries: false,
            use_session_context: false,
            workers: 1,
            batch_size: 512,
        }
    }
}

impl AggregateOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_session_context(mut self, use_session_context: bool) -> Self {
        self.use_session_context = use_session_context;
        self
    }

    pub fn with_failed_queries(mut self, include_failed_queries: bool) -> Self {
        self.include_failed_queries = include_failed_queries;
        self
    }

    pub fn with_columns(mut self, count_columns: bool) -> Self {
        self.count_columns = count_columns;
        self
    }
}

/// The references of each record, computed lazily as the iterator is driven.
pub fn references<'a, I>(
    records: I,
    info_schema: &'a InfoSchema,
    dialect: Dialect,
) -> impl Iterator<Item = ReferenceSet> + 'a
where
    I: IntoIterator<Item = QueryRecord>,
    I::IntoIter: 'a,
{
    records
        .into_iter()
        .map(move |record| extract_references(&record.text, info_schema, dialect))
}

/// Count, for every table and column of `info_schema`, how many records
/// reference it.
pub fn aggregate<I>(records: I, info_schema: &InfoSchema, dialect: Dialect) -> UsageCounts
where
    I: IntoIterator<Item = QueryRecord>,
{
    aggregate_with(records, info_schema, dialect, &AggregateOptions::default())
}

pub fn aggregate_with<I>(
    records: I,
    info_schema: &InfoSchema,
    dialect: Dialect,
    options: &AggregateOptions,
) -> UsageCounts
where
    I: IntoIterator<Item = QueryRecord>,
{
    let mut counts = UsageCounts::new(info_schema, options.count_columns);
    for record in records {
        tally(&mut counts, &record, info_schema, dialect, options);
    }
    counts
}

/// Drain a stream of records into counts.
///
/// With more than one worker, records are cut into batches of
/// `batch_size` and extracted on blocking tasks, at most `workers` batches
/// in flight. The first stream error aborts the run.
pub async fn aggregate_stream<S>(
    records: S,
    info_schema: Arc<InfoSchema>,
    dialect: Dialect,
    options: &AggregateOptions,
) -> Result<UsageCounts>
where
    S: Stream<Item = SourceResult<QueryRecord>>,
{
    pin_mut!(records);
    let mut counts = UsageCounts::new(&info_schema, options.count_columns);
    if options.workers <= 1 {
        while let Some(record) = records.try_next().await? {
            tally(&mut counts, &record, &info_schema, dialect, options);
        }
        return Ok(counts);
    }

    let batch_size = options.batch_size.max(1);
    let mut tasks = VecDeque::new();
    let mut batch = Vec::with_capacity(batch_size);
    let mut batches = 0usize;
    while let Some(record) = records.try_next().await? {
        batch.push(record);
        if batch.len() < batch_size {
            continue;
        }
        let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
        tasks.push_back(spawn_batch(full, info_schema.clone(), dialect, options.clone()));
        batches += 1;
        if tasks.len() >= options.workers {
            if let Some(task) = tasks.pop_front() {
                counts.merge(task.await?);
            }
        }
    }
    if !batch.is_empty() {
        tasks.push_back(spawn_batch(batch, info_schema.clone(), dialect, options.clone()));
        batches += 1;
    }
    for task in tasks {
        counts.merge(task.await?);
    }
    debug!(batches, workers = options.workers, "aggregated query stream");
    Ok(counts)
}

fn spawn_batch(
    batch: Vec<QueryRecord>,
    info_schema: Arc<InfoSchema>,
    dialect: Dialect,
    options: AggregateOptions,
) -> JoinHandle<UsageCounts> {
    tokio::task::spawn_blocking(move || {
        let mut counts = UsageCounts::default();
        for record in &batch {
            tally(&mut counts, record, &info_schema, dialect, &options);
        }
        counts
    })
}

fn tally(
    counts: &mut UsageCounts,
    record: &QueryRecord,
    info_schema: &InfoSchema,
    dialect: Dialect,
    options: &AggregateOptions,
) {
    if record.status == QueryStatus::Failed && !options.include_failed_queries {
        trace!(query_id = ?record.query_id, "skipping failed query");
        counts.record_skipped();
        return;
    }
    let mut references = if options.use_session_context {
        extract_references_in_context(&record.text, info_schema, dialect, &record.context)
    } else {
        extract_references(&record.text, info_schema, dialect)
    };
    if !options.count_columns {
        references.columns.clear();
    }
    counts.record(&references);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_info_schema, SchemaRow, TableIdentifier};
    use crate::error::Error;
    use crate::source::{self, QueryContext};
    use chrono::{DateTime, TimeZone, Utc};
    use futures::stream;

    fn info_schema() -> InfoSchema {
        build_info_schema(
            vec![
                SchemaRow::new("DB", "PUBLIC", "ORDERS", "ID"),
                SchemaRow::new("DB", "PUBLIC", "ORDERS", "AMOUNT"),
                SchemaRow::new("DB", "PUBLIC", "CUSTOMERS", "ID"),
                SchemaRow::new("DB", "PUBLIC", "CUSTOMERS", "NAME"),
                SchemaRow::new("DB", "STAGING", "EVENTS", "ID"),
                SchemaRow::new("DB", "PUBLIC", "UNUSED", "ID"),
            ],
            Dialect::Snowflake,
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn records() -> Vec<QueryRecord> {
        [
            "select * from db.public.orders",
            "select amount from orders o join customers c on o.id = c.id",
            "select name from customers where name like '%from orders%'",
            "insert into events select id from orders",
            "select 1",
            "select * from orders a, orders b, public.orders",
        ]
        .into_iter()
        .map(|text| QueryRecord::new(text, now()))
        .collect()
    }

    fn table(schema: &str, name: &str) -> TableIdentifier {
        TableIdentifier::new("DB", schema, name, Dialect::Snowflake)
    }

    #[test]
    fn counts() {
        let info_schema = info_schema();
        let counts = aggregate(records(), &info_schema, Dialect::Snowflake);
        assert_eq!(counts.table_count(&table("PUBLIC", "ORDERS")), Some(4));
        assert_eq!(counts.table_count(&table("PUBLIC", "CUSTOMERS")), Some(2));
        assert_eq!(counts.table_count(&table("STAGING", "EVENTS")), Some(1));
        assert_eq!(counts.table_count(&table("PUBLIC", "UNUSED")), Some(0));
        assert_eq!(
            counts.column_count(&table("PUBLIC", "CUSTOMERS").column("NAME")),
            Some(1)
        );
        assert_eq!(
            counts.column_count(&table("PUBLIC", "UNUSED").column("ID")),
            Some(0)
        );
        assert_eq!(counts.stats().queries_seen, 6);
        assert_eq!(counts.stats().queries_referencing, 5);
    }

    #[test]
    fn order_independent() {
        let info_schema = info_schema();
        let forward = aggregate(records(), &info_schema, Dialect::Snowflake);
        let mut reversed = records();
        reversed.reverse();
        assert_eq!(forward, aggregate(reversed, &info_schema, Dialect::Snowflake));
        let mut rotated = records();
        rotated.rotate_left(2);
        assert_eq!(forward, aggregate(rotated, &info_schema, Dialect::Snowflake));
    }

    #[test]
    fn lazy_references() {
        let info_schema = info_schema();
        let mut references = references(records(), &info_schema, Dialect::Snowflake);
        let first = references.next().unwrap();
        assert_eq!(first.tables.len(), 1);
        assert_eq!(references.count(), 5);
    }

    #[test]
    fn options() {
        let info_schema = info_schema();
        let orders = table("PUBLIC", "ORDERS");
        let records = vec![
            QueryRecord::new("select * from orders", now()).with_status(QueryStatus::Failed),
            QueryRecord::new("select id from events", now()).with_context(
                QueryContext::default()
                    .with_database("DB")
                    .with_schema("STAGING"),
            ),
        ];

        let counts = aggregate(records.clone(), &info_schema, Dialect::Snowflake);
        assert_eq!(counts.table_count(&orders), Some(0));
        assert_eq!(counts.stats().queries_skipped, 1);

        let options = AggregateOptions::default()
            .with_failed_queries(true)
            .with_columns(false);
        let counts = aggregate_with(records, &info_schema, Dialect::Snowflake, &options);
        assert_eq!(counts.table_count(&orders), Some(1));
        assert_eq!(counts.stats().queries_skipped, 0);
        assert_eq!(counts.columns().count(), 0);
    }

    #[tokio::test]
    async fn stream_matches_iterator() -> Result<()> {
        let info_schema = Arc::new(info_schema());
        let mut records = records();
        for _ in 0..5 {
            records.extend(self::records());
        }
        let expected = aggregate(records.clone(), &info_schema, Dialect::Snowflake);

        for options in [
            AggregateOptions::default(),
            AggregateOptions::default().with_workers(3).with_batch_size(4),
            AggregateOptions::default().with_workers(2).with_batch_size(1000),
        ] {
            let stream = stream::iter(records.clone().into_iter().map(Ok));
            let counts =
                aggregate_stream(stream, info_schema.clone(), Dialect::Snowflake, &options).await?;
            assert_eq!(counts, expected, "{options:?}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn stream_error() {
        let stream = stream::iter(vec![
            Ok(QueryRecord::new("select * from orders", now())),
            Err(source::Error::Fetch("connection reset".to_string())),
        ]);
        let result = aggregate_stream(
            stream,
            Arc::new(info_schema()),
            Dialect::Snowflake,
            &AggregateOptions::default().with_workers(2),
        )
        .await;
        assert!(matches!(result, Err(Error::Source(source::Error::Fetch(_)))));
    }
}
