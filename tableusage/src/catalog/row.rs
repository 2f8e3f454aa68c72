use serde::{Deserialize, Serialize};

/// One row of `information_schema.columns`. Any part may come back null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SchemaRow {
    pub table_catalog: Option<String>,
    pub table_schema: Option<String>,
    pub table_name: Option<String>,
    pub column_name: Option<String>,
}

impl SchemaRow {
    pub fn new(catalog: &str, schema: &str, table: &str, column: &str) -> Self {
        Self {
            table_catalog: Some(catalog.to_string()),
            table_schema: Some(schema.to_string()),
            table_name: Some(table.to_string()),
            column_name: Some(column.to_string()),
        }
    }

    /// Dotted `catalog.schema.table` text as stored, `None` if a part is missing.
    pub fn table_path(&self) -> Option<String> {
        match (&self.table_catalog, &self.table_schema, &self.table_name) {
            (Some(catalog), Some(schema), Some(table)) => {
                Some(format!("{}.{}.{}", catalog, schema, table))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_information_schema_names() {
        let row: SchemaRow = serde_json::from_str(
            r#"{"TABLE_CATALOG":"DB","TABLE_SCHEMA":"PUBLIC",
                "TABLE_NAME":"ORDERS","COLUMN_NAME":null}"#,
        )
        .unwrap();
        assert_eq!(row.table_path().as_deref(), Some("DB.PUBLIC.ORDERS"));
        assert_eq!(row.column_name, None);
    }
}
