//! SEARCH (RFC 3501) and ESEARCH (RFC 4731) result parsing.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{SeqNum, SequenceSet};
use crate::Result;

use super::helpers::{skip_to_close_paren, skip_value};

/// Result of a SEARCH command.
///
/// A plain SEARCH only fills `all`; ESEARCH fills whatever was asked for
/// in the RETURN options. A server that honours `RETURN (COUNT)` but not
/// `ALL` leaves `all` empty while reporting a count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchData {
    /// Numbers are UIDs rather than sequence numbers.
    pub uid: bool,
    /// Matching numbers, ascending.
    pub all: Vec<u32>,
    /// Number of matches reported by the server.
    pub count: Option<u32>,
    /// Lowest match.
    pub min: Option<u32>,
    /// Highest match.
    pub max: Option<u32>,
}

impl SearchData {
    /// Matching numbers as sequence numbers.
    #[must_use]
    pub fn seq_nums(&self) -> Vec<SeqNum> {
        self.all.iter().copied().filter_map(SeqNum::new).collect()
    }

    /// Folds another result for the same command into this one.
    pub fn merge(&mut self, other: Self) {
        self.uid |= other.uid;
        self.all.extend(other.all);
        self.all.sort_unstable();
        self.all.dedup();
        self.count = self.count.or(other.count);
        self.min = self.min.or(other.min);
        self.max = self.max.or(other.max);
    }
}

/// Parses the number list following `* SEARCH`.
pub fn parse_search(lexer: &mut Lexer<'_>) -> Result<SearchData> {
    let mut data = SearchData::default();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        match lexer.next_token()? {
            Token::Number(n) if n > 0 => data.all.push(n),
            // `(MODSEQ n)` trailer from CONDSTORE servers.
            Token::LParen => skip_to_close_paren(lexer)?,
            _ => {}
        }
    }
    data.all.sort_unstable();
    data.all.dedup();
    Ok(data)
}

/// Parses the data following `* ESEARCH`.
pub fn parse_esearch(lexer: &mut Lexer<'_>) -> Result<SearchData> {
    let mut data = SearchData::default();

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        let name = match lexer.next_token()? {
            // Search correlator: (TAG "A282")
            Token::LParen => {
                skip_to_close_paren(lexer)?;
                continue;
            }
            Token::Atom(name) => name.to_ascii_uppercase(),
            Token::Crlf | Token::Eof => break,
            token => return Err(lexer.error(&format!("unexpected {token:?} in ESEARCH"))),
        };

        if name == "UID" {
            data.uid = true;
            continue;
        }

        lexer.expect_space()?;
        match name.as_str() {
            "COUNT" => data.count = Some(lexer.read_number()?),
            "MIN" => data.min = Some(lexer.read_number()?),
            "MAX" => data.max = Some(lexer.read_number()?),
            "ALL" => data.all = read_number_set(lexer)?,
            _ => skip_value(lexer)?,
        }
    }

    data.all.sort_unstable();
    data.all.dedup();
    Ok(data)
}

fn read_number_set(lexer: &mut Lexer<'_>) -> Result<Vec<u32>> {
    let text = match lexer.next_token()? {
        Token::Number(n) => return Ok(vec![n]),
        Token::Atom(s) => s,
        token => return Err(lexer.error(&format!("expected sequence set, got {token:?}"))),
    };
    SequenceSet::parse(text)
        .and_then(|set| set.expand())
        .ok_or_else(|| lexer.error(&format!("invalid sequence set {text}")))
}
