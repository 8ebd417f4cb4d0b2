//! Lexer tokens.

/// A single lexical element of a server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Atom, borrowed from the input. Flags such as `\Seen` lex as atoms.
    Atom(&'a str),
    /// Quoted string with escapes resolved.
    QuotedString(String),
    /// Literal payload (`{n}\r\n` followed by n bytes).
    Literal(Vec<u8>),
    /// Unsigned number.
    Number(u32),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// A single space.
    Space,
    /// `*`
    Asterisk,
    /// `+`
    Plus,
    /// `NIL`, case-insensitive.
    Nil,
    /// End of line.
    Crlf,
    /// End of input.
    Eof,
}
