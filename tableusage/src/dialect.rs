use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// SQL dialects whose identifier rules are understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Snowflake,
    Postgres,
    BigQuery,
    MySql,
}

/// How unquoted identifiers are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    Upper,
    Lower,
    Preserve,
}

#[derive(Error, Debug, PartialEq)]
#[error("unknown dialect {0}")]
pub struct UnknownDialect(pub String);

impl Fold {
    pub fn apply(&self, ident: &str) -> String {
        match self {
            Fold::Upper => ident.to_uppercase(),
            Fold::Lower => ident.to_lowercase(),
            Fold::Preserve => ident.to_string(),
        }
    }
}

impl Dialect {
    pub fn fold(&self) -> Fold {
        match self {
            Dialect::Snowflake => Fold::Upper,
            Dialect::Postgres => Fold::Lower,
            Dialect::BigQuery | Dialect::MySql => Fold::Preserve,
        }
    }

    pub fn quote_char(&self) -> char {
        match self {
            Dialect::Snowflake | Dialect::Postgres => '"',
            Dialect::BigQuery | Dialect::MySql => '`',
        }
    }

    /// Whether a single quoted identifier may spell a whole dotted path,
    /// e.g. `` `project.dataset.table` ``.
    pub fn quoted_paths(&self) -> bool {
        matches!(self, Dialect::BigQuery)
    }

    /// Whether `#` starts a line comment.
    pub fn hash_comments(&self) -> bool {
        matches!(self, Dialect::MySql | Dialect::BigQuery)
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Dialect::Snowflake => "snowflake",
            Dialect::Postgres => "postgres",
            Dialect::BigQuery => "bigquery",
            Dialect::MySql => "mysql",
        }
    }

    pub fn is_quoted(&self, raw: &str) -> bool {
        self.unquote(raw.trim()).is_some()
    }

    /// Canonical form of one identifier part.
    ///
    /// Quoted parts keep their case and lose the surrounding quotes, unquoted
    /// parts are folded. Never fails: anything the rules don't cover passes
    /// through after the fold.
    pub fn canonicalize(&self, raw: &str) -> String {
        let raw = raw.trim();
        match self.unquote(raw) {
            Some(inner) => inner,
            None => self.fold().apply(raw),
        }
    }

    /// Split dotted identifier text into raw parts, ignoring dots inside quotes.
    pub fn split_identifier<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let quote = self.quote_char();
        let mut in_quotes = false;
        let mut start = 0usize;
        let mut parts = Vec::new();
        for (idx, ch) in text.char_indices() {
            if ch == quote {
                in_quotes = !in_quotes;
            } else if ch == '.' && !in_quotes {
                parts.push(text[start..idx].trim());
                start = idx + ch.len_utf8();
            }
        }
        parts.push(text[start..].trim());
        parts
    }

    /// Canonicalize raw parts, expanding quoted paths where the dialect allows them.
    pub fn canonical_parts<S: AsRef<str>>(&self, raw_parts: &[S]) -> Vec<String> {
        let mut parts = Vec::with_capacity(raw_parts.len());
        for raw in raw_parts {
            let raw = raw.as_ref();
            let canonical = self.canonicalize(raw);
            if self.quoted_paths() && self.is_quoted(raw) && canonical.contains('.') {
                parts.extend(canonical.split('.').map(str::to_string));
            } else {
                parts.push(canonical);
            }
        }
        parts
    }

    fn unquote(&self, raw: &str) -> Option<String> {
        let quote = self.quote_char();
        let inner = raw.strip_prefix(quote)?.strip_suffix(quote)?;
        let mut doubled = String::with_capacity(2);
        doubled.push(quote);
        doubled.push(quote);
        Some(inner.replace(&doubled, &quote.to_string()))
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_ref() {
            "snowflake" => Dialect::Snowflake,
            "postgres" | "postgresql" => Dialect::Postgres,
            "bigquery" => Dialect::BigQuery,
            "mysql" => Dialect::MySql,
            _ => return Err(UnknownDialect(s.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIALECTS: [Dialect; 4] = [
        Dialect::Snowflake,
        Dialect::Postgres,
        Dialect::BigQuery,
        Dialect::MySql,
    ];

    #[test]
    fn snowflake_canonicalize() {
        let dialect = Dialect::Snowflake;
        assert_eq!(dialect.canonicalize("orders"), "ORDERS");
        assert_eq!(dialect.canonicalize("Orders"), "ORDERS");
        assert_eq!(dialect.canonicalize("\"Orders\""), "Orders");
        assert_eq!(dialect.canonicalize("\"my \"\"odd\"\" name\""), "my \"odd\" name");
        assert_eq!(dialect.canonicalize("  t$1 "), "T$1");
        assert_eq!(dialect.canonicalize("\""), "\"");
        assert_eq!(dialect.canonicalize(""), "");
    }

    #[test]
    fn other_dialects() {
        assert_eq!(Dialect::Postgres.canonicalize("Orders"), "orders");
        assert_eq!(Dialect::Postgres.canonicalize("\"Orders\""), "Orders");
        assert_eq!(Dialect::BigQuery.canonicalize("Orders"), "Orders");
        assert_eq!(Dialect::BigQuery.canonicalize("`Orders`"), "Orders");
        assert_eq!(Dialect::MySql.canonicalize("`order-items`"), "order-items");
        // a quote char foreign to the dialect is just a character
        assert_eq!(Dialect::MySql.canonicalize("\"x\""), "\"x\"");
    }

    #[test]
    fn canonicalize_idempotent() {
        let inputs = [
            "orders",
            "Orders",
            "ORDERS",
            "\"ORDERS\"",
            "\"orders\"",
            " spaced ",
            "weird-chars!",
            "`tick`",
            "t$1",
            "straße",
            "",
        ];
        for dialect in DIALECTS {
            for input in inputs {
                let once = dialect.canonicalize(input);
                // quoted identifiers that are not fold-stable name a different
                // object once the quotes are gone
                if dialect.is_quoted(input) && dialect.fold().apply(&once) != once {
                    continue;
                }
                assert_eq!(dialect.canonicalize(&once), once, "{dialect} {input:?}");
            }
        }
    }

    #[test]
    fn split_identifier() {
        let dialect = Dialect::Snowflake;
        assert_eq!(
            dialect.split_identifier("db.public.orders"),
            vec!["db", "public", "orders"]
        );
        assert_eq!(
            dialect.split_identifier("\"my.db\".\"s\".t"),
            vec!["\"my.db\"", "\"s\"", "t"]
        );
        assert_eq!(dialect.split_identifier("orders"), vec!["orders"]);
    }

    #[test]
    fn canonical_parts() {
        assert_eq!(
            Dialect::BigQuery.canonical_parts(&["`proj.ds.tbl`"]),
            vec!["proj", "ds", "tbl"]
        );
        assert_eq!(
            Dialect::Snowflake.canonical_parts(&["\"a.b\"", "c"]),
            vec!["a.b", "C"]
        );
    }

    #[test]
    fn parse_dialect() {
        assert_eq!("Snowflake".parse(), Ok(Dialect::Snowflake));
        assert_eq!("postgresql".parse(), Ok(Dialect::Postgres));
        assert_eq!(
            "oracle".parse::<Dialect>(),
            Err(UnknownDialect("oracle".to_string()))
        );
        for dialect in DIALECTS {
            assert_eq!(dialect.to_string().parse(), Ok(dialect));
        }
    }
}
