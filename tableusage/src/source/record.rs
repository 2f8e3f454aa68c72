use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One executed query from the warehouse's query history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    #[serde(default)]
    pub query_id: Option<String>,
    pub text: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub status: QueryStatus,
    #[serde(default)]
    pub context: QueryContext,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    #[default]
    Success,
    Failed,
}

/// Session state the query was issued under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub user: Option<String>,
    pub role: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl QueryRecord {
    pub fn new<T: Into<String>>(text: T, start_time: DateTime<Utc>) -> Self {
        Self {
            query_id: None,
            text: text.into(),
            start_time,
            status: QueryStatus::Success,
            context: QueryContext::default(),
        }
    }

    pub fn with_query_id(mut self, query_id: impl Into<String>) -> Self {
        self.query_id = Some(query_id.into());
        self
    }

    pub fn with_status(mut self, status: QueryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_context(mut self, context: QueryContext) -> Self {
        self.context = context;
        self
    }
}

impl QueryContext {
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}
