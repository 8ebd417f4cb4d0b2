//! BODYSTRUCTURE parsing and part addressing.
//!
//! Media types and parameter names are normalized to lowercase. Parts are
//! addressed with RFC 3501 section paths: children of a multipart are
//! numbered from 1 and nested multiparts join their numbers with `.`; a
//! message that is not multipart has the single part `1`.

use crate::parser::lexer::{Lexer, Token};
use crate::Result;

use super::fetch::parse_envelope;
use super::helpers::skip_to_close_paren;
use super::types::Envelope;

/// Body structure of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStructure {
    /// A leaf part.
    Single(Box<BodyPart>),
    /// A multipart container.
    Multipart {
        /// Multipart subtype (`mixed`, `alternative`, ...).
        subtype: String,
        /// Child parts in order.
        parts: Vec<Self>,
        /// Content-Type parameters (boundary, ...).
        params: Vec<(String, String)>,
    },
}

/// A non-multipart body part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyPart {
    /// Primary media type (`text`, `image`, ...).
    pub media_type: String,
    /// Media subtype (`plain`, `png`, ...).
    pub subtype: String,
    /// Content-Type parameters.
    pub params: Vec<(String, String)>,
    /// Content-ID.
    pub id: Option<String>,
    /// Content-Description.
    pub description: Option<String>,
    /// Content-Transfer-Encoding, lowercase.
    pub encoding: String,
    /// Encoded size in octets.
    pub size: u32,
    /// Line count for text and message parts.
    pub lines: Option<u32>,
    /// Content-Disposition.
    pub disposition: Option<Disposition>,
    /// Envelope and structure of an encapsulated `message/rfc822`.
    pub message: Option<Box<(Envelope, BodyStructure)>>,
}

/// Content-Disposition of a part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Disposition {
    /// `inline`, `attachment`, ...
    pub kind: String,
    /// Disposition parameters.
    pub params: Vec<(String, String)>,
}

impl BodyPart {
    /// `type/subtype`.
    #[must_use]
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.media_type, self.subtype)
    }

    /// Content-Type parameter by (lowercase) name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        lookup(&self.params, name)
    }

    /// Declared charset.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// File name from the disposition, falling back to the Content-Type
    /// `name` parameter. RFC 2231 extended values are decoded.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        let from_disposition = self.disposition.as_ref().and_then(|d| {
            lookup(&d.params, "filename")
                .map(str::to_string)
                .or_else(|| lookup(&d.params, "filename*").map(decode_extended_value))
        });
        from_disposition.or_else(|| {
            self.param("name")
                .map(str::to_string)
                .or_else(|| self.param("name*").map(decode_extended_value))
        })
    }
}

impl BodyStructure {
    /// Leaf parts in document order, each with its section path.
    #[must_use]
    pub fn leaves(&self) -> Vec<(String, &BodyPart)> {
        let mut out = Vec::new();
        match self {
            Self::Single(part) => out.push(("1".to_string(), part.as_ref())),
            Self::Multipart { parts, .. } => collect_leaves(parts, "", &mut out),
        }
        out
    }
}

fn collect_leaves<'a>(parts: &'a [BodyStructure], prefix: &str, out: &mut Vec<(String, &'a BodyPart)>) {
    for (i, part) in parts.iter().enumerate() {
        let path = if prefix.is_empty() {
            (i + 1).to_string()
        } else {
            format!("{prefix}.{}", i + 1)
        };
        match part {
            BodyStructure::Single(leaf) => out.push((path, leaf.as_ref())),
            BodyStructure::Multipart { parts, .. } => collect_leaves(parts, &path, out),
        }
    }
}

fn lookup<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Decodes an RFC 2231 value (`utf-8''na%C3%AFve.txt`).
fn decode_extended_value(value: &str) -> String {
    let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = bytes.get(i + 1..i + 3)
            && let Ok(b) = u8::from_str_radix(&String::from_utf8_lossy(hex), 16)
        {
            out.push(b);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses a parenthesized body structure.
pub fn parse_body_structure(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    lexer.expect(Token::LParen)?;
    if lexer.peek() == Some(b'(') {
        parse_multipart(lexer)
    } else {
        parse_single(lexer).map(|part| BodyStructure::Single(Box::new(part)))
    }
}

fn parse_multipart(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    let mut parts = Vec::new();
    while lexer.peek() == Some(b'(') {
        parts.push(parse_body_structure(lexer)?);
        lexer.skip_spaces();
    }
    let subtype = read_lower(lexer)?;

    let mut params = Vec::new();
    if lexer.peek() == Some(b' ') {
        lexer.advance();
        params = parse_params(lexer)?;
    }
    skip_to_close_paren(lexer)?;

    Ok(BodyStructure::Multipart {
        subtype,
        parts,
        params,
    })
}

fn parse_single(lexer: &mut Lexer<'_>) -> Result<BodyPart> {
    let media_type = read_lower(lexer)?;
    lexer.expect_space()?;
    let subtype = read_lower(lexer)?;
    lexer.expect_space()?;
    let params = parse_params(lexer)?;
    lexer.expect_space()?;
    let id = lexer.read_nstring()?;
    lexer.expect_space()?;
    let description = lexer.read_nstring()?;
    lexer.expect_space()?;
    let encoding = lexer
        .read_nstring()?
        .map_or_else(|| "7bit".to_string(), |e| e.to_ascii_lowercase());
    lexer.expect_space()?;
    let size = lexer.read_number()?;

    let mut part = BodyPart {
        media_type,
        subtype,
        params,
        id,
        description,
        encoding,
        size,
        ..BodyPart::default()
    };

    let is_message = part.media_type == "message"
        && matches!(part.subtype.as_str(), "rfc822" | "global");
    if is_message && lexer.peek() == Some(b' ') {
        lexer.advance();
        let envelope = parse_envelope(lexer)?;
        lexer.expect_space()?;
        let inner = parse_body_structure(lexer)?;
        lexer.expect_space()?;
        part.lines = Some(lexer.read_number()?);
        part.message = Some(Box::new((envelope, inner)));
    } else if part.media_type == "text" && lexer.peek() == Some(b' ') {
        lexer.advance();
        part.lines = Some(lexer.read_number()?);
    }

    // Extension data: md5, disposition, then language/location which are
    // skipped along with anything newer.
    if lexer.peek() == Some(b' ') {
        lexer.advance();
        let _md5 = lexer.read_nstring()?;
        if lexer.peek() == Some(b' ') {
            lexer.advance();
            part.disposition = parse_disposition(lexer)?;
        }
    }
    skip_to_close_paren(lexer)?;

    Ok(part)
}

fn parse_disposition(lexer: &mut Lexer<'_>) -> Result<Option<Disposition>> {
    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::LParen => {
            let kind = read_lower(lexer)?;
            let mut params = Vec::new();
            if lexer.peek() == Some(b' ') {
                lexer.advance();
                params = parse_params(lexer)?;
            }
            lexer.expect(Token::RParen)?;
            Ok(Some(Disposition { kind, params }))
        }
        // Seen from some servers: a bare string instead of a list.
        Token::QuotedString(kind) => Ok(Some(Disposition {
            kind: kind.to_ascii_lowercase(),
            params: Vec::new(),
        })),
        token => Err(lexer.error(&format!("expected disposition, got {token:?}"))),
    }
}

/// Parses `NIL` or `(key value key value ...)`.
fn parse_params(lexer: &mut Lexer<'_>) -> Result<Vec<(String, String)>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut params = Vec::new();
            loop {
                lexer.skip_spaces();
                if lexer.peek() == Some(b')') {
                    lexer.advance();
                    break;
                }
                let key = lexer.read_astring()?.to_ascii_lowercase();
                lexer.skip_spaces();
                let value = lexer.read_nstring()?.unwrap_or_default();
                params.push((key, value));
            }
            Ok(params)
        }
        token => Err(lexer.error(&format!("expected parameter list, got {token:?}"))),
    }
}

fn read_lower(lexer: &mut Lexer<'_>) -> Result<String> {
    Ok(lexer.read_nstring()?.unwrap_or_default().to_ascii_lowercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> BodyStructure {
        parse_body_structure(&mut Lexer::new(input)).unwrap()
    }

    #[test]
    fn single_text_part() {
        let body = parse(b"(\"TEXT\" \"PLAIN\" (\"CHARSET\" \"iso-8859-1\") NIL NIL \"QUOTED-PRINTABLE\" 1152 23)");
        let leaves = body.leaves();
        assert_eq!(leaves.len(), 1);
        let (path, part) = &leaves[0];
        assert_eq!(path, "1");
        assert_eq!(part.mime_type(), "text/plain");
        assert_eq!(part.charset(), Some("iso-8859-1"));
        assert_eq!(part.encoding, "quoted-printable");
        assert_eq!(part.size, 1152);
        assert_eq!(part.lines, Some(23));
    }

    #[test]
    fn nested_multipart_paths() {
        let body = parse(
            b"(((\"text\" \"plain\" (\"charset\" \"utf-8\") NIL NIL \"7bit\" 10 1)\
(\"text\" \"html\" (\"charset\" \"utf-8\") NIL NIL \"base64\" 200 3) \"alternative\")\
(\"application\" \"pdf\" (\"name\" \"a.pdf\") NIL NIL \"base64\" 4000 NIL (\"attachment\" (\"filename\" \"report.pdf\")) NIL) \
\"mixed\" (\"boundary\" \"xyz\") NIL NIL)",
        );
        let leaves = body.leaves();
        let paths: Vec<_> = leaves.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["1.1", "1.2", "2"]);
        assert_eq!(leaves[1].1.mime_type(), "text/html");
        assert_eq!(leaves[2].1.filename().as_deref(), Some("report.pdf"));
        let BodyStructure::Multipart { subtype, params, .. } = &body else {
            panic!("expected multipart");
        };
        assert_eq!(subtype, "mixed");
        assert_eq!(params[0], ("boundary".to_string(), "xyz".to_string()));
    }

    #[test]
    fn filename_falls_back_to_name_param() {
        let body = parse(b"(\"image\" \"png\" (\"name\" \"logo.png\") NIL NIL \"base64\" 512)");
        assert_eq!(body.leaves()[0].1.filename().as_deref(), Some("logo.png"));
    }

    #[test]
    fn rfc2231_filename() {
        let body = parse(
            b"(\"application\" \"octet-stream\" NIL NIL NIL \"base64\" 10 NIL (\"attachment\" (\"filename*\" \"utf-8''na%C3%AFve.txt\")) NIL NIL)",
        );
        assert_eq!(body.leaves()[0].1.filename().as_deref(), Some("naïve.txt"));
    }

    #[test]
    fn encapsulated_message_is_a_leaf() {
        let body = parse(
            b"((\"text\" \"plain\" NIL NIL NIL \"7bit\" 5 1)\
(\"message\" \"rfc822\" NIL NIL NIL \"7bit\" 300 \
(NIL \"Inner\" NIL NIL NIL NIL NIL NIL NIL NIL) \
(\"text\" \"plain\" NIL NIL NIL \"7bit\" 20 2) 12) \"mixed\")",
        );
        let leaves = body.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[1].0, "2");
        let (envelope, inner) = leaves[1].1.message.as_deref().unwrap();
        assert_eq!(envelope.subject.as_deref(), Some("Inner"));
        assert_eq!(inner.leaves()[0].1.size, 20);
        assert_eq!(leaves[1].1.lines, Some(12));
    }

    #[test]
    fn parts_separated_by_spaces() {
        let body = parse(b"((\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1) (\"text\" \"html\" NIL NIL NIL \"7bit\" 1 1) \"alternative\")");
        assert_eq!(body.leaves().len(), 2);
    }

    #[test]
    fn nil_encoding_defaults_to_7bit() {
        let body = parse(b"(\"application\" \"json\" NIL NIL NIL NIL 42)");
        assert_eq!(body.leaves()[0].1.encoding, "7bit");
    }
}
