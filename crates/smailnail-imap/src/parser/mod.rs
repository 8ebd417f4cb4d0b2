//! Sans-I/O parser for server responses.
//!
//! The [`lexer`] turns bytes into tokens; [`response`] builds typed
//! responses from them.

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{
    Address, BodyPart, BodyStructure, Disposition, Envelope, FetchItem, Response, ResponseParser,
    SearchData, UntaggedResponse,
};
