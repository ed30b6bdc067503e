/*!
The pattern front end: lexer, recursive descent parser and AST.

This module plays the role `regex-syntax` plays for a full regex engine,
scoped down to the grammar this crate supports. Parsing is the only step
that can fail; everything downstream (NFA construction, matching) operates
on a well-formed [`Ast`].
*/

pub use self::ast::{Ast, ClassSet};
pub use self::parser::{parse, Error, ErrorKind, Parser};

pub(crate) mod ast;
pub(crate) mod lexer;
mod parser;
