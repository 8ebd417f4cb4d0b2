//! Response parser.
//!
//! Each call parses one complete response as delivered by
//! [`FramedStream`](crate::connection::FramedStream), literals included.

#![allow(clippy::missing_errors_doc)]

mod body;
mod fetch;
mod helpers;
mod search;
mod types;

pub use body::{BodyPart, BodyStructure, Disposition};
pub use search::SearchData;
pub use types::{Address, Envelope, FetchItem, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status};
use crate::Result;

use helpers::{parse_capability_data, parse_flag_list, parse_response_code, read_text_until_crlf};

/// A parsed server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Completion of a command.
    Tagged {
        /// The command tag.
        tag: String,
        /// Completion status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Server data.
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Optional text.
        text: Option<String>,
    },
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer),
            Token::Plus => {
                lexer.skip_spaces();
                let text = read_text_until_crlf(&mut lexer);
                Ok(Response::Continuation {
                    text: (!text.is_empty()).then_some(text),
                })
            }
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            token => Err(lexer.error(&format!("expected '*', '+' or a tag, got {token:?}"))),
        }
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag: &str) -> Result<Response> {
        lexer.expect_space()?;
        let status = Self::parse_status(lexer)?;
        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Response::Tagged {
            tag: tag.to_string(),
            status,
            code,
            text,
        })
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        let untagged = match lexer.next_token()? {
            Token::Atom(keyword) => {
                let upper = keyword.to_ascii_uppercase();
                match upper.as_str() {
                    "OK" | "NO" | "BAD" | "PREAUTH" | "BYE" => {
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        match upper.as_str() {
                            "OK" => UntaggedResponse::Ok { code, text },
                            "NO" => UntaggedResponse::No { code, text },
                            "BAD" => UntaggedResponse::Bad { code, text },
                            "PREAUTH" => UntaggedResponse::PreAuth { code, text },
                            _ => UntaggedResponse::Bye { code, text },
                        }
                    }
                    "CAPABILITY" => UntaggedResponse::Capability(parse_capability_data(lexer)?),
                    "FLAGS" => {
                        lexer.expect_space()?;
                        UntaggedResponse::Flags(parse_flag_list(lexer)?)
                    }
                    "SEARCH" => UntaggedResponse::Search(search::parse_search(lexer)?),
                    "ESEARCH" => UntaggedResponse::Search(search::parse_esearch(lexer)?),
                    _ => {
                        lexer.skip_spaces();
                        UntaggedResponse::Other {
                            name: upper,
                            text: read_text_until_crlf(lexer),
                        }
                    }
                }
            }
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?.to_ascii_uppercase();
                match keyword.as_str() {
                    "EXISTS" => UntaggedResponse::Exists(n),
                    "RECENT" => UntaggedResponse::Recent(n),
                    "EXPUNGE" => UntaggedResponse::Expunge(Self::seq(lexer, n)?),
                    "FETCH" => {
                        let seq = Self::seq(lexer, n)?;
                        lexer.expect_space()?;
                        let items = fetch::parse_fetch_response(lexer)?;
                        UntaggedResponse::Fetch { seq, items }
                    }
                    _ => {
                        lexer.skip_spaces();
                        UntaggedResponse::Other {
                            name: keyword,
                            text: read_text_until_crlf(lexer),
                        }
                    }
                }
            }
            token => {
                return Err(lexer.error(&format!("unexpected {token:?} in untagged response")));
            }
        };

        Ok(Response::Untagged(untagged))
    }

    fn seq(lexer: &Lexer<'_>, n: u32) -> Result<SeqNum> {
        SeqNum::new(n).ok_or_else(|| lexer.error("sequence number must not be 0"))
    }

    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let s = lexer.read_atom_string()?;
        match s.to_ascii_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            _ => Err(lexer.error(&format!("invalid status {s}"))),
        }
    }

    /// Parses `[code] text`; the space before it is optional in practice.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        lexer.skip_spaces();
        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };
        lexer.skip_spaces();
        Ok((code, read_text_until_crlf(lexer)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Capability, Flag, Uid};

    #[test]
    fn greeting() {
        let response = ResponseParser::parse(b"* OK [CAPABILITY IMAP4rev1 ESEARCH] ready\r\n").unwrap();
        let Response::Untagged(UntaggedResponse::Ok { code, text }) = response else {
            panic!("expected untagged OK");
        };
        assert_eq!(
            code,
            Some(ResponseCode::Capability(vec![
                Capability::Imap4Rev1,
                Capability::Esearch
            ]))
        );
        assert_eq!(text, "ready");
    }

    #[test]
    fn tagged_no() {
        let response = ResponseParser::parse(b"A0003 NO [TRYCREATE] no such mailbox\r\n").unwrap();
        assert_eq!(
            response,
            Response::Tagged {
                tag: "A0003".to_string(),
                status: Status::No,
                code: Some(ResponseCode::TryCreate),
                text: "no such mailbox".to_string(),
            }
        );
    }

    #[test]
    fn tagged_ok_without_text() {
        let response = ResponseParser::parse(b"A1 OK\r\n").unwrap();
        assert!(matches!(response, Response::Tagged { status: Status::Ok, .. }));
    }

    #[test]
    fn exists_and_expunge() {
        assert_eq!(
            ResponseParser::parse(b"* 23 EXISTS\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Exists(23))
        );
        assert_eq!(
            ResponseParser::parse(b"* 4 EXPUNGE\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Expunge(SeqNum::new(4).unwrap()))
        );
    }

    #[test]
    fn fetch_response() {
        let response =
            ResponseParser::parse(b"* 12 FETCH (UID 1012 FLAGS (\\Seen))\r\n").unwrap();
        let Response::Untagged(UntaggedResponse::Fetch { seq, items }) = response else {
            panic!("expected FETCH");
        };
        assert_eq!(seq.get(), 12);
        assert_eq!(items[0], FetchItem::Uid(Uid::new(1012).unwrap()));
        assert!(matches!(&items[1], FetchItem::Flags(f) if f.contains(&Flag::Seen)));
    }

    #[test]
    fn esearch_response() {
        let response =
            ResponseParser::parse(b"* ESEARCH (TAG \"A0004\") ALL 1:3 COUNT 3\r\n").unwrap();
        let Response::Untagged(UntaggedResponse::Search(data)) = response else {
            panic!("expected search data");
        };
        assert_eq!(data.all, vec![1, 2, 3]);
        assert_eq!(data.count, Some(3));
    }

    #[test]
    fn unknown_untagged_is_kept() {
        let response = ResponseParser::parse(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n").unwrap();
        assert!(matches!(
            response,
            Response::Untagged(UntaggedResponse::Other { ref name, .. }) if name == "LIST"
        ));
    }

    #[test]
    fn continuation() {
        assert_eq!(
            ResponseParser::parse(b"+ go ahead\r\n").unwrap(),
            Response::Continuation {
                text: Some("go ahead".to_string())
            }
        );
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(ResponseParser::parse(b")\r\n").is_err());
    }
}
