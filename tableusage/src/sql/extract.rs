use crate::catalog::{ColumnIdentifier, InfoSchema, Resolution, TableIdentifier};
use crate::dialect::Dialect;
use crate::source::QueryContext;
use crate::sql::keyword::Keyword;
use crate::sql::lexer::{tokenize, Token};
use indexmap::IndexSet;
use std::collections::HashSet;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceKind {
    Table,
    Column,
}

/// A name that matched more than one catalog object and was dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct AmbiguousReference {
    pub kind: ReferenceKind,
    pub name: String,
    pub candidates: Vec<String>,
}

/// Catalog objects one query references. Each object appears once no matter
/// how often the query names it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceSet {
    pub tables: IndexSet<TableIdentifier>,
    pub columns: IndexSet<ColumnIdentifier>,
    pub ambiguous: Vec<AmbiguousReference>,
}

impl ReferenceSet {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.columns.is_empty()
    }

    pub fn ambiguous_tables(&self) -> usize {
        self.ambiguous_of(ReferenceKind::Table)
    }

    pub fn ambiguous_columns(&self) -> usize {
        self.ambiguous_of(ReferenceKind::Column)
    }

    fn ambiguous_of(&self, kind: ReferenceKind) -> usize {
        self.ambiguous
            .iter()
            .filter(|reference| reference.kind == kind)
            .count()
    }
}

/// Find the tables and columns of `info_schema` that `query_text` references.
///
/// Names are taken from table positions (`FROM`, `JOIN`, `UPDATE`, `INTO`,
/// `TABLE`, `USING`) and resolved fully qualified first, then as
/// `schema.table`, then as a bare table name. A name matching several tables
/// is dropped and reported in [`ReferenceSet::ambiguous`]. Columns are only
/// resolved against tables the same query resolved.
pub fn extract_references(
    query_text: &str,
    info_schema: &InfoSchema,
    dialect: Dialect,
) -> ReferenceSet {
    Extractor::new(info_schema, dialect, None).extract(query_text)
}

/// Like [`extract_references`], but names that don't resolve on their own are
/// retried qualified with the session database and schema of `context`.
pub fn extract_references_in_context(
    query_text: &str,
    info_schema: &InfoSchema,
    dialect: Dialect,
    context: &QueryContext,
) -> ReferenceSet {
    Extractor::new(info_schema, dialect, Some(context)).extract(query_text)
}

/// A table name as written in a table position, canonicalized.
#[derive(Debug)]
struct TableRef {
    parts: Vec<String>,
    alias: Option<String>,
}

#[derive(Debug)]
struct ColumnRef {
    qualifier: Vec<String>,
    column: String,
}

#[derive(Debug, Default)]
struct Scan {
    tables: Vec<TableRef>,
    columns: Vec<ColumnRef>,
    ctes: HashSet<String>,
}

struct Scanner<'t, 'a> {
    tokens: &'t [Token<'a>],
    dialect: Dialect,
    /// Token positions of CTE definitions, never column candidates.
    skip: HashSet<usize>,
    scan: Scan,
}

impl<'t, 'a> Scanner<'t, 'a> {
    fn new(tokens: &'t [Token<'a>], dialect: Dialect) -> Self {
        Self {
            tokens,
            dialect,
            skip: HashSet::new(),
            scan: Scan::default(),
        }
    }

    fn run(mut self) -> Scan {
        self.collect_ctes();
        // one entry per open paren: whether it belongs to a function call
        let mut calls: Vec<bool> = Vec::new();
        let mut i = 0;
        while i < self.tokens.len() {
            let token = self.tokens[i];
            match token {
                Token::LParen => {
                    let previous = i.checked_sub(1).map(|p| self.tokens[p]);
                    calls.push(matches!(previous, Some(Token::Identifier(_))));
                    i += 1;
                    // `FROM (a JOIN b ON ...)`
                    if matches!(
                        (previous, self.tokens.get(i)),
                        (
                            Some(Token::Keyword(Keyword::From | Keyword::Join, _)),
                            Some(Token::Identifier(_))
                        )
                    ) {
                        i = self.table_references(i, Keyword::From);
                    }
                }
                Token::RParen => {
                    calls.pop();
                    i += 1;
                }
                // mysql `ON DUPLICATE KEY UPDATE col = ...`
                Token::Keyword(Keyword::Update, _) if self.follows_key(i) => i += 1,
                // `EXTRACT(YEAR FROM ts)` and friends
                Token::Keyword(keyword, _)
                    if keyword.introduces_table() && !calls.last().copied().unwrap_or(false) =>
                {
                    i = self.table_references(i + 1, keyword);
                }
                Token::Identifier(_) if !self.skip.contains(&i) => {
                    i = self.column_reference(i);
                }
                _ => i += 1,
            }
        }
        self.scan
    }

    fn collect_ctes(&mut self) {
        for i in 1..self.tokens.len() {
            let Token::Identifier(name) = self.tokens[i] else {
                continue;
            };
            if !matches!(
                self.tokens[i - 1],
                Token::Keyword(Keyword::With | Keyword::Recursive, _) | Token::Comma
            ) {
                continue;
            }
            let mut j = i + 1;
            let mut column_list = None;
            if matches!(self.tokens.get(j), Some(Token::LParen)) {
                let Some(end) = self.matching_paren(j) else {
                    continue;
                };
                column_list = Some(end);
                j = end + 1;
            }
            if matches!(
                (self.tokens.get(j), self.tokens.get(j + 1)),
                (Some(Token::Keyword(Keyword::As, _)), Some(Token::LParen))
            ) {
                self.scan.ctes.insert(self.dialect.canonicalize(name));
                self.skip.insert(i);
                if let Some(end) = column_list {
                    self.skip.extend(i + 1..end);
                }
            }
        }
    }

    fn follows_key(&self, i: usize) -> bool {
        matches!(
            i.checked_sub(1).map(|p| self.tokens[p]),
            Some(Token::Identifier(raw)) if raw.eq_ignore_ascii_case("key")
        )
    }

    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (offset, token) in self.tokens[open..].iter().enumerate() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + offset);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Read the table name(s) following `keyword`, returning the position to
    /// continue scanning from.
    fn table_references(&mut self, start: usize, keyword: Keyword) -> usize {
        let list = keyword == Keyword::From;
        // after INTO/TABLE/UPDATE a paren opens a column list, not call arguments
        let functions = matches!(keyword, Keyword::From | Keyword::Join | Keyword::Using);
        let mut i = start;
        loop {
            while matches!(self.tokens.get(i), Some(Token::Keyword(k, _)) if k.is_table_modifier())
            {
                i += 1;
            }
            let Some((raw, next)) = self.name_chain(i) else {
                return i;
            };
            if functions && matches!(self.tokens.get(next), Some(Token::LParen)) {
                return i;
            }
            let parts = self.dialect.canonical_parts(&raw);
            i = next;
            let alias = match (self.tokens.get(i), self.tokens.get(i + 1)) {
                (Some(Token::Keyword(Keyword::As, _)), Some(Token::Identifier(alias))) => {
                    i += 2;
                    Some(self.dialect.canonicalize(alias))
                }
                (Some(Token::Identifier(alias)), _) => {
                    i += 1;
                    Some(self.dialect.canonicalize(alias))
                }
                _ => None,
            };
            self.scan.tables.push(TableRef { parts, alias });
            if list && matches!(self.tokens.get(i), Some(Token::Comma)) {
                i += 1;
            } else {
                return i;
            }
        }
    }

    fn column_reference(&mut self, start: usize) -> usize {
        let Some((raw, next)) = self.name_chain(start) else {
            return start + 1;
        };
        match (self.tokens.get(next), self.tokens.get(next + 1)) {
            // `o.*`
            (Some(Token::Dot), Some(Token::Star)) => return next + 2,
            // function call
            (Some(Token::LParen), _) => return next,
            _ => {}
        }
        // `expr AS name` introduces a name rather than using one
        if start > 0 && self.tokens[start - 1].is_keyword(Keyword::As) {
            return next;
        }
        let mut parts = self.dialect.canonical_parts(&raw);
        if let Some(column) = parts.pop() {
            self.scan.columns.push(ColumnRef {
                qualifier: parts,
                column,
            });
        }
        next
    }

    /// `a`, `a.b`, `a.b.c`, ... starting at `start`.
    fn name_chain(&self, start: usize) -> Option<(Vec<&'a str>, usize)> {
        let Some(Token::Identifier(first)) = self.tokens.get(start) else {
            return None;
        };
        let mut parts = vec![*first];
        let mut i = start + 1;
        while let (Some(Token::Dot), Some(part)) = (
            self.tokens.get(i),
            self.tokens.get(i + 1).and_then(Token::name_part),
        ) {
            parts.push(part);
            i += 2;
        }
        Some((parts, i))
    }
}

struct Extractor<'s> {
    info_schema: &'s InfoSchema,
    dialect: Dialect,
    database: Option<String>,
    schema: Option<String>,
}

impl<'s> Extractor<'s> {
    fn new(info_schema: &'s InfoSchema, dialect: Dialect, context: Option<&QueryContext>) -> Self {
        let canonical = |part: &Option<String>| part.as_deref().map(|p| dialect.canonicalize(p));
        Self {
            info_schema,
            dialect,
            database: context.and_then(|c| canonical(&c.database)),
            schema: context.and_then(|c| canonical(&c.schema)),
        }
    }

    fn extract(&self, query_text: &str) -> ReferenceSet {
        let tokens = tokenize(query_text, self.dialect);
        let scan = Scanner::new(&tokens, self.dialect).run();
        let mut references = ReferenceSet::default();
        let mut in_scope: Vec<(TableIdentifier, Option<String>)> = Vec::new();

        for table_ref in &scan.tables {
            let name = table_ref.parts.join(".");
            if let [bare] = table_ref.parts.as_slice() {
                if scan.ctes.contains(bare) {
                    trace!(reference = %name, "skipping common table expression");
                    continue;
                }
            }
            match self.resolve(&table_ref.parts) {
                Resolution::Resolved(table) => {
                    references.tables.insert(table.clone());
                    in_scope.push((table, table_ref.alias.clone()));
                }
                Resolution::Ambiguous(candidates) => {
                    debug!(
                        reference = %name,
                        candidates = candidates.len(),
                        "discarding ambiguous table reference"
                    );
                    references.ambiguous.push(AmbiguousReference {
                        kind: ReferenceKind::Table,
                        name,
                        candidates: candidates.iter().map(ToString::to_string).collect(),
                    });
                }
                Resolution::NotFound => {
                    trace!(reference = %name, "table reference not in info schema");
                }
            }
        }

        for column_ref in &scan.columns {
            self.resolve_column(column_ref, &in_scope, &mut references);
        }
        references
    }

    fn resolve(&self, parts: &[String]) -> Resolution {
        let resolution = self.info_schema.resolve_table(parts);
        if matches!(resolution, Resolution::Resolved(_)) {
            return resolution;
        }
        let qualified = match (parts, &self.database, &self.schema) {
            ([table], Some(database), Some(schema)) => {
                [database.clone(), schema.clone(), table.clone()]
            }
            ([schema, table], Some(database), _) => {
                [database.clone(), schema.clone(), table.clone()]
            }
            _ => return resolution,
        };
        match self.info_schema.resolve_table(&qualified) {
            Resolution::Resolved(table) => {
                debug!(reference = %parts.join("."), %table, "resolved through session context");
                Resolution::Resolved(table)
            }
            _ => resolution,
        }
    }

    fn resolve_column(
        &self,
        column_ref: &ColumnRef,
        in_scope: &[(TableIdentifier, Option<String>)],
        references: &mut ReferenceSet,
    ) {
        let column = &column_ref.column;
        let candidates: IndexSet<&TableIdentifier> = match column_ref.qualifier.as_slice() {
            [] => in_scope.iter().map(|(table, _)| table).collect(),
            [qualifier] => {
                let by_alias: IndexSet<&TableIdentifier> = in_scope
                    .iter()
                    .filter(|(_, alias)| alias.as_ref() == Some(qualifier))
                    .map(|(table, _)| table)
                    .collect();
                if by_alias.is_empty() {
                    in_scope
                        .iter()
                        .map(|(table, _)| table)
                        .filter(|table| table.table() == qualifier.as_str())
                        .collect()
                } else {
                    by_alias
                }
            }
            qualifier => match self.resolve(qualifier) {
                Resolution::Resolved(resolved) => in_scope
                    .iter()
                    .map(|(table, _)| table)
                    .filter(|table| **table == resolved)
                    .collect(),
                _ => IndexSet::new(),
            },
        };
        let owners = candidates
            .into_iter()
            .filter(|table| {
                self.info_schema
                    .read_table(table)
                    .map_or(false, |columns| columns.contains(column))
            })
            .collect::<Vec<_>>();
        match owners.as_slice() {
            [] => {}
            [table] => {
                references.columns.insert(table.column(column.clone()));
            }
            _ => {
                let mut name = column_ref.qualifier.join(".");
                if !name.is_empty() {
                    name.push('.');
                }
                name.push_str(column);
                debug!(
                    reference = %name,
                    candidates = owners.len(),
                    "discarding ambiguous column reference"
                );
                let candidates = owners
                    .iter()
                    .map(|table| table.column(column.clone()).to_string())
                    .collect();
                references.ambiguous.push(AmbiguousReference {
                    kind: ReferenceKind::Column,
                    name,
                    candidates,
                });
            }
        }
    }
}
