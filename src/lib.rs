//! Front end for the kaleidoscope toy language.
//!
//! Characters flow one way: [`lexer::Lexer`] pulls them from any
//! `Iterator<Item = char>` and yields tokens, [`parser::Parser`] turns tokens
//! into [`ast`] nodes, and [`driver::Driver`] runs the top-level read loop,
//! handing each finished node to a [`backend::Backend`] and recovering from
//! malformed input one construct at a time.

pub mod ast;
pub mod backend;
pub mod driver;
pub mod lexer;
pub mod parser;
pub mod source;

pub use driver::{Driver, Outcome, State, Summary};
pub use parser::{parse_str, ParserError};
