//! Assembled messages handed to renderers and actions.

use serde::Serialize;

/// One matched message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainMessage {
    /// Sequence number at fetch time.
    pub seq: u32,
    /// UID, when the server reported one.
    pub uid: Option<u32>,
    /// Decoded subject.
    pub subject: String,
    /// From addresses, `Name <user@host>` or bare.
    pub from: Vec<String>,
    /// To addresses.
    pub to: Vec<String>,
    /// Cc addresses.
    pub cc: Vec<String>,
    /// Bcc addresses.
    pub bcc: Vec<String>,
    /// Envelope date as sent, else INTERNALDATE.
    pub date: Option<String>,
    /// Flags in wire form.
    pub flags: Vec<String>,
    /// RFC822 size in bytes.
    pub size: u32,
    /// Matches before pagination.
    pub total_count: u32,
    /// Fetched parts in tree order.
    pub parts: Vec<MimePart>,
}

/// Decoded content of one MIME part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MimePart {
    /// Section path (`1`, `2.1`).
    pub path: String,
    /// `type/subtype`, lowercase.
    pub media_type: String,
    /// Text content; empty for binary parts that are not UTF-8.
    pub content: String,
    /// Bytes after transfer decoding.
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Size of the decoded content in bytes.
    pub size: usize,
    /// Declared charset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Attachment file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl MimePart {
    /// Major type (`text` for `text/plain`).
    #[must_use]
    pub fn major_type(&self) -> &str {
        self.media_type
            .split_once('/')
            .map_or(self.media_type.as_str(), |(major, _)| major)
    }

    /// True for `text/*` parts.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.major_type() == "text"
    }
}
