use crate::catalog::SchemaRow;
use crate::error;
use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use futures::Stream;
use indexmap::IndexSet;
use std::future::Future;
use thiserror::Error;

mod memory;
mod record;

pub use memory::{MemoryQueryHistory, MemorySchemaSource};
pub use record::{QueryContext, QueryRecord, QueryStatus};

pub type SourceResult<T> = Result<T, Error>;
#[derive(Error, Debug)]
pub enum Error {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Half-open time range `[since, before)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    since: DateTime<Utc>,
    before: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(since: DateTime<Utc>, before: DateTime<Utc>) -> error::Result<Self> {
        if since >= before {
            return Err(error::Error::InvalidWindow { since, before });
        }
        Ok(Self { since, before })
    }

    /// The `days` days up to the end of the day after `now`.
    pub fn trailing_days(now: DateTime<Utc>, days: u32) -> error::Result<Self> {
        let before = now
            .date_naive()
            .checked_add_days(Days::new(2))
            .map(|day| day.and_time(NaiveTime::MIN).and_utc())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let since = before
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::new(since, before)
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    pub fn before(&self) -> DateTime<Utc> {
        self.before
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        self.since <= *time && *time < self.before
    }
}

/// Provides `information_schema.columns` style rows.
pub trait SchemaSource {
    /// Rows of the tables whose `catalog.schema.table` identifier matches one
    /// of `identifiers` ignoring case. `INFORMATION_SCHEMA` itself is never
    /// returned.
    fn fetch_columns(
        &self,
        identifiers: &IndexSet<String>,
    ) -> impl Future<Output = SourceResult<Vec<SchemaRow>>>;
}

/// Provides executed queries.
pub trait QueryHistorySource {
    /// Queries started inside `window`, in no particular order.
    fn fetch_queries(
        &self,
        window: &TimeWindow,
    ) -> impl Future<Output = SourceResult<impl Stream<Item = SourceResult<QueryRecord>>>>;
}

impl<T: SchemaSource> SchemaSource for &T {
    fn fetch_columns(
        &self,
        identifiers: &IndexSet<String>,
    ) -> impl Future<Output = SourceResult<Vec<SchemaRow>>> {
        (**self).fetch_columns(identifiers)
    }
}

impl<T: QueryHistorySource> QueryHistorySource for &T {
    fn fetch_queries(
        &self,
        window: &TimeWindow,
    ) -> impl Future<Output = SourceResult<impl Stream<Item = SourceResult<QueryRecord>>>> {
        (**self).fetch_queries(window)
    }
}
