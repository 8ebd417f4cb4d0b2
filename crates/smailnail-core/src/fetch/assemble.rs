//! Structure records and decoded parts into [`DomainMessage`]s.

use smailnail_imap::Address;

use super::decode::{decode_header, decode_text, decode_transfer};
use super::parts::PartRequirement;
use super::session::StructureRecord;
use crate::message::{DomainMessage, MimePart};

/// Builds the message for `record` with its decoded `parts`.
#[must_use]
pub fn assemble(record: &StructureRecord, parts: Vec<MimePart>, total: u32) -> DomainMessage {
    let envelope = &record.envelope;
    DomainMessage {
        seq: record.seq,
        uid: record.uid.map(|u| u.get()),
        subject: envelope
            .subject
            .as_deref()
            .map(decode_header)
            .unwrap_or_default(),
        from: addresses(&envelope.from),
        to: addresses(&envelope.to),
        cc: addresses(&envelope.cc),
        bcc: addresses(&envelope.bcc),
        date: envelope
            .date
            .clone()
            .or_else(|| record.internal_date.clone()),
        flags: record.flags.iter().map(|f| f.as_str().to_string()).collect(),
        size: record.size,
        total_count: total,
        parts,
    }
}

/// Decodes the raw section bytes of `req`.
#[must_use]
pub fn decode_part(req: &PartRequirement, raw: &[u8]) -> MimePart {
    let data = decode_transfer(&req.encoding, raw);
    let is_text = req.media_type.starts_with("text/");
    let content = if is_text {
        decode_text(&data, req.charset.as_deref())
    } else {
        String::from_utf8(data.clone()).unwrap_or_default()
    };
    MimePart {
        path: req.path.clone(),
        media_type: req.media_type.clone(),
        size: if is_text { content.len() } else { data.len() },
        content,
        data,
        charset: req.charset.clone(),
        filename: req.filename.clone(),
    }
}

fn addresses(list: &[Address]) -> Vec<String> {
    list.iter().filter_map(format_address).collect()
}

fn format_address(addr: &Address) -> Option<String> {
    let name = addr
        .name
        .as_deref()
        .map(decode_header)
        .filter(|n| !n.is_empty());
    match (name, addr.email()) {
        (Some(name), Some(email)) => Some(format!("{name} <{email}>")),
        (None, Some(email)) => Some(email),
        (Some(name), None) => Some(name),
        (None, None) => addr.mailbox.clone(),
    }
}
