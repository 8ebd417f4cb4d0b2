//! Content-Transfer-Encoding, charset and RFC 2047 decoding.
//!
//! Everything here is lenient: malformed input degrades to the raw bytes
//! instead of failing the message.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::Encoding;
use tracing::warn;

/// Undoes the transfer encoding named by BODYSTRUCTURE.
#[must_use]
pub fn decode_transfer(encoding: &str, raw: &[u8]) -> Vec<u8> {
    match encoding.to_ascii_lowercase().as_str() {
        "base64" => {
            let compact: Vec<u8> = raw
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            STANDARD.decode(&compact).unwrap_or_else(|e| {
                warn!(error = %e, "invalid base64 content, keeping raw bytes");
                raw.to_vec()
            })
        }
        "quoted-printable" => decode_quoted_printable(raw, false),
        _ => raw.to_vec(),
    }
}

/// Decodes quoted-printable bytes. With `underscores`, `_` means space
/// (the RFC 2047 `Q` form).
#[must_use]
pub fn decode_quoted_printable(raw: &[u8], underscores: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'=' => match (raw.get(i + 1), raw.get(i + 2)) {
                (Some(b'\r'), Some(b'\n')) => i += 3,
                (Some(b'\n'), _) => i += 2,
                (Some(&hi), Some(&lo)) => match (hex(hi), hex(lo)) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'=');
                        i += 1;
                    }
                },
                _ => {
                    out.push(b'=');
                    i += 1;
                }
            },
            b'_' if underscores => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

const fn hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Interprets `bytes` in `charset`; unknown or missing labels fall back to
/// lossy UTF-8.
#[must_use]
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    match charset.and_then(|c| Encoding::for_label(c.trim().as_bytes())) {
        Some(encoding) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decodes RFC 2047 encoded-words in a header value.
///
/// Whitespace between two adjacent encoded-words is dropped; malformed
/// words are left as written.
#[must_use]
pub fn decode_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        match encoded_word(candidate) {
            Some((text, len)) => {
                if !(after_word && before.trim().is_empty()) {
                    out.push_str(before);
                }
                out.push_str(&text);
                rest = &candidate[len..];
                after_word = true;
            }
            None => {
                out.push_str(before);
                out.push_str("=?");
                rest = &candidate[2..];
                after_word = false;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses `=?charset?enc?text?=` at the start of `s`, returning the decoded
/// text and the number of bytes consumed.
fn encoded_word(s: &str) -> Option<(String, usize)> {
    let body = s.strip_prefix("=?")?;
    let (charset, body) = body.split_once('?')?;
    let (encoding, body) = body.split_once('?')?;
    let end = body.find("?=")?;
    let text = &body[..end];
    if charset.is_empty() || text.contains(char::is_whitespace) {
        return None;
    }
    let bytes = match encoding {
        "B" | "b" => STANDARD.decode(text).ok()?,
        "Q" | "q" => decode_quoted_printable(text.as_bytes(), true),
        _ => return None,
    };
    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    // RFC 2231 language suffix: `utf-8*en`
    let charset = charset.split('*').next().unwrap_or(charset);
    Some((decode_text(&bytes, Some(charset)), consumed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base64_ignores_line_breaks() {
        assert_eq!(decode_transfer("BASE64", b"SGVs\r\nbG8=\r\n"), b"Hello");
    }

    #[test]
    fn invalid_base64_keeps_raw() {
        assert_eq!(decode_transfer("base64", b"!!!"), b"!!!");
    }

    #[test]
    fn quoted_printable() {
        assert_eq!(
            decode_transfer("quoted-printable", b"caf=C3=A9 =\r\nau lait=3D"),
            "café au lait=".as_bytes()
        );
        assert_eq!(decode_quoted_printable(b"a=ZZb=", false), b"a=ZZb=");
    }

    #[test]
    fn identity_encodings() {
        assert_eq!(decode_transfer("7bit", b"plain"), b"plain");
        assert_eq!(decode_transfer("binary", &[0, 159]), vec![0, 159]);
    }

    #[test]
    fn charsets() {
        assert_eq!(decode_text(&[0x63, 0x61, 0x66, 0xE9], Some("iso-8859-1")), "café");
        assert_eq!(decode_text("ok".as_bytes(), Some("x-unknown")), "ok");
        assert_eq!(decode_text(&[0xFF], None), "\u{FFFD}");
    }

    #[test]
    fn header_words() {
        assert_eq!(decode_header("=?UTF-8?B?SGVsbG8=?="), "Hello");
        assert_eq!(decode_header("=?iso-8859-1?Q?caf=E9_cr=E8me?="), "café crème");
        assert_eq!(
            decode_header("Re: =?UTF-8?Q?a?= =?UTF-8?Q?b?= done"),
            "Re: ab done"
        );
        assert_eq!(decode_header("plain subject"), "plain subject");
        assert_eq!(decode_header("broken =?x"), "broken =?x");
        assert_eq!(decode_header("=?UTF-8?X?abc?= tail"), "=?UTF-8?X?abc?= tail");
    }
}
