use nom::error::VerboseError;

mod extract;
mod keyword;
mod lexer;

pub use extract::{
    extract_references, extract_references_in_context, AmbiguousReference, ReferenceKind,
    ReferenceSet,
};
pub use keyword::Keyword;
pub use lexer::{tokenize, Token};

pub(crate) type IResult<I, O> = nom::IResult<I, O, VerboseError<I>>;
