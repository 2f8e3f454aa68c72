use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("malformed schema row {index}: {part} is missing")]
    MalformedRow { index: usize, part: &'static str },
    #[error("invalid identifier {0}")]
    InvalidIdentifier(String),
}
