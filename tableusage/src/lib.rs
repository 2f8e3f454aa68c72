pub mod catalog;
pub mod config;
pub mod dialect;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod sql;
pub mod usage;

pub use catalog::{
    build_info_schema, CatalogIdentifier, ColumnIdentifier, InfoSchema, Resolution, SchemaRow,
    TableIdentifier,
};
pub use config::UsageConfig;
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use pipeline::{compute_usage, UsagePipeline, UsageReport};
pub use source::{
    MemoryQueryHistory, MemorySchemaSource, QueryContext, QueryHistorySource, QueryRecord,
    QueryStatus, SchemaSource, TimeWindow,
};
pub use sql::{extract_references, extract_references_in_context, ReferenceSet};
pub use usage::{
    aggregate, aggregate_stream, aggregate_with, references, AggregateOptions, UsageCounts,
    UsageStats,
};
