//! Parser helper functions shared by the response parsers.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{Capability, Flag, Flags, ResponseCode, SeqNum, Uid, UidValidity};
use crate::Result;

/// Parses a bracketed response code.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;

    let atom = lexer.read_atom_string()?;
    let code = match atom.to_ascii_uppercase().as_str() {
        "ALERT" => ResponseCode::Alert,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "UIDNEXT" => ResponseCode::UidNext(read_nonzero(lexer, Uid::new, "UIDNEXT")?),
        "UIDVALIDITY" => {
            ResponseCode::UidValidity(read_nonzero(lexer, UidValidity::new, "UIDVALIDITY")?)
        }
        "UNSEEN" => ResponseCode::Unseen(read_nonzero(lexer, SeqNum::new, "UNSEEN")?),
        "CAPABILITY" => ResponseCode::Capability(parse_capability_data(lexer)?),
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            ResponseCode::PermanentFlags(parse_flag_list(lexer)?.into_iter().collect())
        }
        _ => ResponseCode::Unknown(atom.to_string()),
    };

    // Arguments of unknown codes (and trailing junk of known ones) are
    // dropped up to the closing bracket.
    while lexer.peek().is_some_and(|b| b != b']') {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;

    Ok(code)
}

fn read_nonzero<T>(lexer: &mut Lexer<'_>, make: fn(u32) -> Option<T>, what: &str) -> Result<T> {
    lexer.expect_space()?;
    let n = lexer.read_number()?;
    make(n).ok_or_else(|| lexer.error(&format!("{what} must not be 0")))
}

/// Parses the space-separated capability atoms that follow `CAPABILITY`.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if let Token::Atom(s) = lexer.next_token()? {
            caps.push(Capability::parse(s));
        }
    }
    Ok(caps)
}

/// Parses a parenthesized flag list.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;

    let mut flags = Flags::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            // `\*` in PERMANENTFLAGS lexes as `\` followed by `*`.
            Token::Asterisk => {}
            token => return Err(lexer.error(&format!("unexpected {token:?} in flag list"))),
        }
    }
    Ok(flags)
}

/// Skips one value (atom, string, literal or nested list).
pub fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Token::Eof | Token::Crlf => return Err(lexer.error("unterminated value")),
            Token::RParen => return Err(lexer.error("unbalanced ')'")),
            _ if depth == 0 => return Ok(()),
            _ => {}
        }
    }
}

/// Consumes tokens up to and including the `)` closing the current list.
pub fn skip_to_close_paren(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 1usize;
    while depth > 0 {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen => depth -= 1,
            Token::Eof => return Err(lexer.error("missing ')'")),
            _ => {}
        }
    }
    Ok(())
}

/// Reads the rest of the line as text and consumes the line ending.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();
    let end = remaining
        .iter()
        .position(|b| *b == b'\r' || *b == b'\n')
        .unwrap_or(remaining.len());
    let text = String::from_utf8_lossy(&remaining[..end]).into_owned();
    lexer.skip(end);
    if lexer.peek() == Some(b'\r') {
        lexer.advance();
    }
    if lexer.peek() == Some(b'\n') {
        lexer.advance();
    }
    text
}
