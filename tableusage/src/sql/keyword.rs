/// Reserved words the reference scanner cares about.
///
/// Anything not listed here lexes as an identifier, so common column names
/// (`date`, `name`, `value`, ...) must stay out of this list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    All,
    Alter,
    And,
    Any,
    As,
    Asc,
    At,
    Before,
    Between,
    By,
    Case,
    Changes,
    Create,
    Cross,
    Delete,
    Desc,
    Describe,
    Distinct,
    Drop,
    Else,
    End,
    Except,
    Exists,
    False,
    From,
    Full,
    Group,
    Having,
    If,
    Ilike,
    In,
    Inner,
    Insert,
    Intersect,
    Into,
    Is,
    Join,
    Lateral,
    Left,
    Like,
    Limit,
    Merge,
    Minus,
    Natural,
    Not,
    Null,
    Offset,
    On,
    Only,
    Or,
    Order,
    Outer,
    Over,
    Overwrite,
    Partition,
    Pivot,
    Qualify,
    Recursive,
    Replace,
    Returning,
    Right,
    Sample,
    Select,
    Set,
    Show,
    Table,
    Tablesample,
    Temp,
    Temporary,
    Then,
    Transient,
    True,
    Truncate,
    Union,
    Unpivot,
    Update,
    Use,
    Using,
    Values,
    When,
    Where,
    With,
}

impl Keyword {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(ident: &str) -> Option<Self> {
        Some(match ident.to_uppercase().as_ref() {
            "ALL" => Self::All,
            "ALTER" => Self::Alter,
            "AND" => Self::And,
            "ANY" => Self::Any,
            "AS" => Self::As,
            "ASC" => Self::Asc,
            "AT" => Self::At,
            "BEFORE" => Self::Before,
            "BETWEEN" => Self::Between,
            "BY" => Self::By,
            "CASE" => Self::Case,
            "CHANGES" => Self::Changes,
            "CREATE" => Self::Create,
            "CROSS" => Self::Cross,
            "DELETE" => Self::Delete,
            "DESC" => Self::Desc,
            "DESCRIBE" => Self::Describe,
            "DISTINCT" => Self::Distinct,
            "DROP" => Self::Drop,
            "ELSE" => Self::Else,
            "END" => Self::End,
            "EXCEPT" => Self::Except,
            "EXISTS" => Self::Exists,
            "FALSE" => Self::False,
            "FROM" => Self::From,
            "FULL" => Self::Full,
            "GROUP" => Self::Group,
            "HAVING" => Self::Having,
            "IF" => Self::If,
            "ILIKE" => Self::Ilike,
            "IN" => Self::In,
            "INNER" => Self::Inner,
            "INSERT" => Self::Insert,
            "INTERSECT" => Self::Intersect,
            "INTO" => Self::Into,
            "IS" => Self::Is,
            "JOIN" => Self::Join,
            "LATERAL" => Self::Lateral,
            "LEFT" => Self::Left,
            "LIKE" => Self::Like,
            "LIMIT" => Self::Limit,
            "MERGE" => Self::Merge,
            "MINUS" => Self::Minus,
            "NATURAL" => Self::Natural,
            "NOT" => Self::Not,
            "NULL" => Self::Null,
            "OFFSET" => Self::Offset,
            "ON" => Self::On,
            "ONLY" => Self::Only,
            "OR" => Self::Or,
            "ORDER" => Self::Order,
            "OUTER" => Self::Outer,
            "OVER" => Self::Over,
            "OVERWRITE" => Self::Overwrite,
            "PARTITION" => Self::Partition,
            "PIVOT" => Self::Pivot,
            "QUALIFY" => Self::Qualify,
            "RECURSIVE" => Self::Recursive,
            "REPLACE" => Self::Replace,
            "RETURNING" => Self::Returning,
            "RIGHT" => Self::Right,
            "SAMPLE" => Self::Sample,
            "SELECT" => Self::Select,
            "SET" => Self::Set,
            "SHOW" => Self::Show,
            "TABLE" => Self::Table,
            "TABLESAMPLE" => Self::Tablesample,
            "TEMP" => Self::Temp,
            "TEMPORARY" => Self::Temporary,
            "THEN" => Self::Then,
            "TRANSIENT" => Self::Transient,
            "TRUE" => Self::True,
            "TRUNCATE" => Self::Truncate,
            "UNION" => Self::Union,
            "UNPIVOT" => Self::Unpivot,
            "UPDATE" => Self::Update,
            "USE" => Self::Use,
            "USING" => Self::Using,
            "VALUES" => Self::Values,
            "WHEN" => Self::When,
            "WHERE" => Self::Where,
            "WITH" => Self::With,
            _ => return None,
        })
    }

    pub fn to_str(&self) -> &str {
        match self {
            Self::All => "ALL",
            Self::Alter => "ALTER",
            Self::And => "AND",
            Self::Any => "ANY",
            Self::As => "AS",
            Self::Asc => "ASC",
            Self::At => "AT",
            Self::Before => "BEFORE",
            Self::Between => "BETWEEN",
            Self::By => "BY",
            Self::Case => "CASE",
            Self::Changes => "CHANGES",
            Self::Create => "CREATE",
            Self::Cross => "CROSS",
            Self::Delete => "DELETE",
            Self::Desc => "DESC",
            Self::Describe => "DESCRIBE",
            Self::Distinct => "DISTINCT",
            Self::Drop => "DROP",
            Self::Else => "ELSE",
            Self::End => "END",
            Self::Except => "EXCEPT",
            Self::Exists => "EXISTS",
            Self::False => "FALSE",
            Self::From => "FROM",
            Self::Full => "FULL",
            Self::Group => "GROUP",
            Self::Having => "HAVING",
            Self::If => "IF",
            Self::Ilike => "ILIKE",
            Self::In => "IN",
            Self::Inner => "INNER",
            Self::Insert => "INSERT",
            Self::Intersect => "INTERSECT",
            Self::Into => "INTO",
            Self::Is => "IS",
            Self::Join => "JOIN",
            Self::Lateral => "LATERAL",
            Self::Left => "LEFT",
            Self::Like => "LIKE",
            Self::Limit => "LIMIT",
            Self::Merge => "MERGE",
            Self::Minus => "MINUS",
            Self::Natural => "NATURAL",
            Self::Not => "NOT",
            Self::Null => "NULL",
            Self::Offset => "OFFSET",
            Self::On => "ON",
            Self::Only => "ONLY",
            Self::Or => "OR",
            Self::Order => "ORDER",
            Self::Outer => "OUTER",
            Self::Over => "OVER",
            Self::Overwrite => "OVERWRITE",
            Self::Partition => "PARTITION",
            Self::Pivot => "PIVOT",
            Self::Qualify => "QUALIFY",
            Self::Recursive => "RECURSIVE",
            Self::Replace => "REPLACE",
            Self::Returning => "RETURNING",
            Self::Right => "RIGHT",
            Self::Sample => "SAMPLE",
            Self::Select => "SELECT",
            Self::Set => "SET",
            Self::Show => "SHOW",
            Self::Table => "TABLE",
            Self::Tablesample => "TABLESAMPLE",
            Self::Temp => "TEMP",
            Self::Temporary => "TEMPORARY",
            Self::Then => "THEN",
            Self::Transient => "TRANSIENT",
            Self::True => "TRUE",
            Self::Truncate => "TRUNCATE",
            Self::Union => "UNION",
            Self::Unpivot => "UNPIVOT",
            Self::Update => "UPDATE",
            Self::Use => "USE",
            Self::Using => "USING",
            Self::Values => "VALUES",
            Self::When => "WHEN",
            Self::Where => "WHERE",
            Self::With => "WITH",
        }
    }

    /// Keywords after which a table name is expected.
    pub fn introduces_table(&self) -> bool {
        matches!(
            self,
            Self::From | Self::Join | Self::Update | Self::Into | Self::Table | Self::Using
        )
    }

    /// Keywords that may sit between a table keyword and the name itself,
    /// e.g. `DROP TABLE IF EXISTS t` or `FROM ONLY t`.
    pub fn is_table_modifier(&self) -> bool {
        matches!(self, Self::If | Self::Not | Self::Exists | Self::Only)
    }
}
