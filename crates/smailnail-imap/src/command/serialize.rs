//! Command serialization helpers.

use crate::types::{Flag, Mailbox};

use super::types::{FetchAttribute, FetchItems, SearchCriteria, SearchOptions, StoreAction};

/// Writes an astring: atom when possible, quoted string otherwise, and a
/// non-synchronizing literal for 8-bit data.
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if !s.is_ascii() {
        buf.extend_from_slice(format!("{{{}+}}\r\n", s.len()).as_bytes());
        buf.extend_from_slice(s.as_bytes());
    } else if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a mailbox name.
pub fn write_mailbox(buf: &mut Vec<u8>, mailbox: &Mailbox) {
    write_astring(buf, mailbox.as_str());
}

/// Returns true if the byte cannot appear in an atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

/// Writes a parenthesized flag list.
pub fn write_flag_list(buf: &mut Vec<u8>, flags: &[Flag]) {
    buf.push(b'(');
    for (i, flag) in flags.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(flag.as_str().as_bytes());
    }
    buf.push(b')');
}

/// Writes FETCH items.
pub fn write_fetch_items(buf: &mut Vec<u8>, items: &FetchItems) {
    match items {
        FetchItems::Fast => buf.extend_from_slice(b"FAST"),
        FetchItems::Items(attrs) => {
            if let [single] = attrs.as_slice() {
                write_fetch_attribute(buf, single);
            } else {
                buf.push(b'(');
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    write_fetch_attribute(buf, attr);
                }
                buf.push(b')');
            }
        }
    }
}

/// Writes a single FETCH attribute.
pub fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => buf.extend_from_slice(b"FLAGS"),
        FetchAttribute::InternalDate => buf.extend_from_slice(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => buf.extend_from_slice(b"RFC822.SIZE"),
        FetchAttribute::Envelope => buf.extend_from_slice(b"ENVELOPE"),
        FetchAttribute::BodyStructure => buf.extend_from_slice(b"BODYSTRUCTURE"),
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::Body {
            section,
            peek,
            partial,
        } => {
            buf.extend_from_slice(if *peek { &b"BODY.PEEK["[..] } else { &b"BODY["[..] });
            if let Some(s) = section {
                buf.extend_from_slice(s.as_bytes());
            }
            buf.push(b']');
            if let Some((start, len)) = partial {
                buf.extend_from_slice(format!("<{start}.{len}>").as_bytes());
            }
        }
    }
}

/// Writes a STORE action.
pub fn write_store_action(buf: &mut Vec<u8>, action: &StoreAction, silent: bool) {
    let (prefix, flags) = match action {
        StoreAction::SetFlags(f) => ("FLAGS", f),
        StoreAction::AddFlags(f) => ("+FLAGS", f),
        StoreAction::RemoveFlags(f) => ("-FLAGS", f),
    };
    buf.extend_from_slice(prefix.as_bytes());
    if silent {
        buf.extend_from_slice(b".SILENT");
    }
    buf.push(b' ');
    write_flag_list(buf, flags);
}

/// Writes `RETURN (...) ` when any option is set.
pub fn write_search_options(buf: &mut Vec<u8>, options: &SearchOptions) {
    if options.is_empty() {
        return;
    }
    let names = [
        (options.min, "MIN"),
        (options.max, "MAX"),
        (options.all, "ALL"),
        (options.count, "COUNT"),
    ];
    let selected: Vec<&str> = names
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
    buf.extend_from_slice(b"RETURN (");
    buf.extend_from_slice(selected.join(" ").as_bytes());
    buf.extend_from_slice(b") ");
}

/// Writes SEARCH criteria as a top-level key list.
pub fn write_search_criteria(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::And(items) if items.is_empty() => buf.extend_from_slice(b"ALL"),
        SearchCriteria::And(items) => {
            for (i, c) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_search_key(buf, c);
            }
        }
        other => write_search_key(buf, other),
    }
}

/// Writes one search key. A conjunction in operand position is
/// parenthesized so OR and NOT bind to the whole group.
fn write_search_key(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => buf.extend_from_slice(b"ALL"),
        SearchCriteria::HasFlag(flag) => write_flag_key(buf, flag, true),
        SearchCriteria::LacksFlag(flag) => write_flag_key(buf, flag, false),
        SearchCriteria::SequenceSet(set) => buf.extend_from_slice(set.to_string().as_bytes()),
        SearchCriteria::Uid(set) => {
            buf.extend_from_slice(b"UID ");
            buf.extend_from_slice(set.to_string().as_bytes());
        }
        SearchCriteria::Subject(s) => write_string_key(buf, "SUBJECT", s),
        SearchCriteria::From(s) => write_string_key(buf, "FROM", s),
        SearchCriteria::To(s) => write_string_key(buf, "TO", s),
        SearchCriteria::Cc(s) => write_string_key(buf, "CC", s),
        SearchCriteria::Bcc(s) => write_string_key(buf, "BCC", s),
        SearchCriteria::Body(s) => write_string_key(buf, "BODY", s),
        SearchCriteria::Text(s) => write_string_key(buf, "TEXT", s),
        SearchCriteria::Since(date) => write_date_key(buf, "SINCE", *date),
        SearchCriteria::Before(date) => write_date_key(buf, "BEFORE", *date),
        SearchCriteria::On(date) => write_date_key(buf, "ON", *date),
        SearchCriteria::Larger(size) => buf.extend_from_slice(format!("LARGER {size}").as_bytes()),
        SearchCriteria::Smaller(size) => {
            buf.extend_from_slice(format!("SMALLER {size}").as_bytes());
        }
        SearchCriteria::Header(name, value) => {
            buf.extend_from_slice(b"HEADER ");
            write_astring(buf, name);
            buf.push(b' ');
            write_astring(buf, value);
        }
        SearchCriteria::And(items) => match items.as_slice() {
            [] => buf.extend_from_slice(b"ALL"),
            [single] => write_search_key(buf, single),
            _ => {
                buf.push(b'(');
                write_search_criteria(buf, criteria);
                buf.push(b')');
            }
        },
        SearchCriteria::Or(a, b) => {
            buf.extend_from_slice(b"OR ");
            write_search_key(buf, a);
            buf.push(b' ');
            write_search_key(buf, b);
        }
        SearchCriteria::Not(c) => {
            buf.extend_from_slice(b"NOT ");
            write_search_key(buf, c);
        }
    }
}

fn write_string_key(buf: &mut Vec<u8>, key: &str, value: &str) {
    buf.extend_from_slice(key.as_bytes());
    buf.push(b' ');
    write_astring(buf, value);
}

fn write_date_key(buf: &mut Vec<u8>, key: &str, date: chrono::NaiveDate) {
    buf.extend_from_slice(key.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(date.format("%-d-%b-%Y").to_string().as_bytes());
}

fn write_flag_key(buf: &mut Vec<u8>, flag: &Flag, present: bool) {
    let key = match (flag, present) {
        (Flag::Seen, true) => "SEEN",
        (Flag::Seen, false) => "UNSEEN",
        (Flag::Answered, true) => "ANSWERED",
        (Flag::Answered, false) => "UNANSWERED",
        (Flag::Flagged, true) => "FLAGGED",
        (Flag::Flagged, false) => "UNFLAGGED",
        (Flag::Deleted, true) => "DELETED",
        (Flag::Deleted, false) => "UNDELETED",
        (Flag::Draft, true) => "DRAFT",
        (Flag::Draft, false) => "UNDRAFT",
        (Flag::Recent, true) => "RECENT",
        (Flag::Recent, false) => "OLD",
        (Flag::Keyword(keyword), present) => {
            buf.extend_from_slice(if present { &b"KEYWORD "[..] } else { &b"UNKEYWORD "[..] });
            buf.extend_from_slice(keyword.as_bytes());
            return;
        }
    };
    buf.extend_from_slice(key.as_bytes());
}
