use crate::dialect::Dialect;
use crate::sql::keyword::Keyword;
use crate::sql::IResult;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while, take_while1};
use nom::character::complete::{
    anychar, char, digit0, digit1, multispace1, not_line_ending, satisfy,
};
use nom::combinator::{map, opt, recognize, rest};
use nom::error::{context, ErrorKind, ParseError, VerboseError};
use nom::multi::many0;
use nom::sequence::{delimited, pair, tuple};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Token<'a> {
    Keyword(Keyword, &'a str),
    /// Raw identifier text, quotes included.
    Identifier(&'a str),
    Literal(&'a str),
    Dot,
    Comma,
    LParen,
    RParen,
    Semicolon,
    Star,
    Other(char),
}

impl<'a> Token<'a> {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k, _) if *k == keyword)
    }

    /// Text usable as a part of a dotted name. Keywords qualify too, since
    /// `o.order` names a column.
    pub fn name_part(&self) -> Option<&'a str> {
        match self {
            Token::Identifier(raw) | Token::Keyword(_, raw) => Some(*raw),
            _ => None,
        }
    }
}

/// Split query text into tokens. Whitespace and comments are dropped.
///
/// Total: input the rules don't cover comes back as [`Token::Other`].
pub fn tokenize(input: &str, dialect: Dialect) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut i = input;
    let mut next = token(dialect);
    let mut skip = trivia(dialect);
    while !i.is_empty() {
        if let Ok((rest, _)) = skip(i) {
            i = rest;
            continue;
        }
        let Ok((rest, token)) = next(i) else {
            break;
        };
        tokens.push(token);
        i = rest;
    }
    tokens
}

fn token<'a>(dialect: Dialect) -> impl FnMut(&'a str) -> IResult<&'a str, Token<'a>> {
    let quote = dialect.quote_char();
    move |i| {
        context(
            "token",
            alt((
                map(literal(quote), Token::Literal),
                map(delimited_text(quote, false), Token::Identifier),
                map(word, |word| match Keyword::from_str(word) {
                    Some(keyword) => Token::Keyword(keyword, word),
                    None => Token::Identifier(word),
                }),
                punctuation,
                map(anychar, Token::Other),
            )),
        )(i)
    }
}

fn trivia<'a>(dialect: Dialect) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    let hash_comments = dialect.hash_comments();
    move |i| {
        alt((
            multispace1,
            line_comment,
            block_comment,
            |i: &'a str| -> IResult<&'a str, &'a str> {
                if hash_comments {
                    recognize(pair(char('#'), not_line_ending))(i)
                } else {
                    Err(nom::Err::Error(VerboseError::from_error_kind(
                        i,
                        ErrorKind::Char,
                    )))
                }
            },
        ))(i)
    }
}

fn line_comment(i: &str) -> IResult<&str, &str> {
    recognize(pair(alt((tag("--"), tag("//"))), not_line_ending))(i)
}

fn block_comment(i: &str) -> IResult<&str, &str> {
    recognize(tuple((
        tag("/*"),
        alt((take_until("*/"), rest)),
        opt(tag("*/")),
    )))(i)
}

/// String, dollar-quoted and numeric literals. Double-quoted text is a string
/// only in dialects that quote identifiers with something else.
fn literal<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |i| {
        alt((
            delimited_text('\'', true),
            dollar_quoted,
            number,
            |i: &'a str| -> IResult<&'a str, &'a str> {
                if quote == '"' {
                    Err(nom::Err::Error(VerboseError::from_error_kind(
                        i,
                        ErrorKind::Char,
                    )))
                } else {
                    delimited_text('"', true)(i)
                }
            },
        ))(i)
    }
}

/// Text between `delim` characters, where a doubled `delim` escapes itself.
fn delimited_text<'a>(
    delim: char,
    backslash_escapes: bool,
) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |i| {
        recognize(delimited(
            char(delim),
            many0(alt((
                recognize(pair(char(delim), char(delim))),
                |i: &'a str| -> IResult<&'a str, &'a str> {
                    if backslash_escapes {
                        recognize(pair(char('\\'), anychar))(i)
                    } else {
                        Err(nom::Err::Error(VerboseError::from_error_kind(
                            i,
                            ErrorKind::Char,
                        )))
                    }
                },
                take_while1(move |c: char| c != delim && !(backslash_escapes && c == '\\')),
            ))),
            char(delim),
        ))(i)
    }
}

fn dollar_quoted(i: &str) -> IResult<&str, &str> {
    recognize(tuple((
        tag("$$"),
        alt((take_until("$$"), rest)),
        opt(tag("$$")),
    )))(i)
}

fn number(i: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, opt(pair(char('.'), digit0))))(i)
}

fn word(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    ))(i)
}

fn punctuation(i: &str) -> IResult<&str, Token<'_>> {
    alt((
        map(char('.'), |_| Token::Dot),
        map(char(','), |_| Token::Comma),
        map(char('('), |_| Token::LParen),
        map(char(')'), |_| Token::RParen),
        map(char(';'), |_| Token::Semicolon),
        map(char('*'), |_| Token::Star),
    ))(i)
}
