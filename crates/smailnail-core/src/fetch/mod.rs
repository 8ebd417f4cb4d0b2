//! Search, paginate and fetch messages in two phases.
//!
//! Phase one fetches envelopes, flags and body structures for the whole
//! window in one FETCH. Phase two fetches the content of every needed part of
//! every message in a second, single FETCH and hands each section back to its
//! owner by `(sequence number, path)`.

pub mod assemble;
pub mod decode;
pub mod parts;
pub mod session;
pub mod window;

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use smailnail_imap::SequenceSet;
use tracing::{debug, info, warn};

use crate::compile::Compiler;
use crate::error::{Error, Result, Stage};
use crate::message::DomainMessage;
use crate::rule::{OutputConfig, OutputField, Rule, SearchPredicate};

use self::assemble::{assemble, decode_part};
use self::parts::{required_parts, PartRequirement};
use self::session::{MailboxSession, StructureRecord};
use self::window::{window, MessageWindow, WindowPlan};

/// Runs the search of `rule` and fetches the resulting window.
///
/// # Errors
///
/// Fails with a [`Stage`]-wrapped error if compilation, the search or either
/// fetch fails.
pub async fn fetch_messages<S: MailboxSession>(
    session: &mut S,
    rule: &Rule,
) -> Result<Vec<DomainMessage>> {
    let messages = search_and_fetch(
        session,
        &Compiler::new(Utc::now()),
        &rule.search,
        &rule.output,
    )
    .await?;
    info!(rule = %rule.name, fetched = messages.len(), "fetched messages");
    Ok(messages)
}

/// Compiles `search`, runs it and fetches the page described by `output`.
///
/// # Errors
///
/// As [`fetch_messages`].
pub async fn search_and_fetch<S: MailboxSession>(
    session: &mut S,
    compiler: &Compiler,
    search: &SearchPredicate,
    output: &OutputConfig,
) -> Result<Vec<DomainMessage>> {
    let pagination = output.pagination();
    let compiled = compiler
        .compile(search, Some(&pagination))
        .map_err(|e| Error::at(Stage::BuildCriteria, e))?;
    debug!(criteria = ?compiled.criteria, options = ?compiled.options, "compiled search");

    let found = session
        .search(compiled.criteria, compiled.options)
        .await
        .map_err(|e| Error::at(Stage::Search, e))?;
    debug!(matches = found.all.len(), count = ?found.count, "search returned");

    let window = match window(&found, &pagination) {
        WindowPlan::Empty => {
            debug!("no messages to fetch");
            return Ok(Vec::new());
        }
        WindowPlan::Ready(window) => window,
        WindowPlan::Reconstruct { first, last, total } => {
            reconstruct(session, first, last, total).await?
        }
    };
    fetch_window(session, &window, &output.fields).await
}

/// Learns the sequence numbers in `first..=last` when the server only
/// reported a count. The range is already the requested page.
async fn reconstruct<S: MailboxSession>(
    session: &mut S,
    first: u32,
    last: u32,
    total: u32,
) -> Result<MessageWindow> {
    let Some(range) = SequenceSet::range(first, last) else {
        return Ok(MessageWindow::new(Vec::new(), total));
    };
    debug!(first, last, total, "rebuilding window from count-only search");
    let pairs = session
        .fetch_uids(&range)
        .await
        .map_err(|e| Error::at(Stage::FetchUids, e))?;
    let mut seqs: Vec<u32> = pairs.into_iter().map(|(seq, _)| seq).collect();
    seqs.sort_unstable_by(|a, b| b.cmp(a));
    seqs.dedup();
    Ok(MessageWindow::new(seqs, total))
}

/// Fetches and assembles the messages of `window`, newest first.
///
/// # Errors
///
/// Fails if the structure fetch or the content fetch fails. Sections the
/// server leaves out of an otherwise successful content fetch become empty
/// parts.
pub async fn fetch_window<S: MailboxSession>(
    session: &mut S,
    window: &MessageWindow,
    fields: &[OutputField],
) -> Result<Vec<DomainMessage>> {
    let Some(set) = SequenceSet::from_numbers(window.seqs().iter().copied()) else {
        return Ok(Vec::new());
    };

    let records = session
        .fetch_structure(&set)
        .await
        .map_err(|e| Error::at(Stage::FetchMessages, e))?;
    let mut by_seq: HashMap<u32, StructureRecord> = HashMap::with_capacity(records.len());
    for record in records {
        match by_seq.entry(record.seq) {
            Entry::Occupied(mut earlier) => {
                debug!(seq = record.seq, "merging split FETCH response");
                earlier.get_mut().merge(record);
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }
    let mut ordered = Vec::with_capacity(window.len());
    for &seq in window.seqs() {
        match by_seq.remove(&seq) {
            Some(record) => ordered.push(record),
            None => warn!(seq, "server returned no data for message"),
        }
    }

    let requirements: Vec<Vec<PartRequirement>> = ordered
        .iter()
        .map(|record| {
            record
                .structure
                .as_ref()
                .map(|structure| required_parts(structure, fields))
                .unwrap_or_default()
        })
        .collect();
    let mut content = fetch_content(session, &ordered, &requirements).await?;

    Ok(ordered
        .iter()
        .zip(requirements)
        .map(|(record, reqs)| {
            let parts = reqs
                .iter()
                .map(|req| {
                    let raw = content
                        .remove(&(record.seq, req.path.clone()))
                        .unwrap_or_else(|| {
                            warn!(seq = record.seq, path = %req.path, "missing content for part");
                            Vec::new()
                        });
                    decode_part(req, &raw)
                })
                .collect();
            assemble(record, parts, window.total())
        })
        .collect())
}

/// One FETCH for the union of needed sections across all messages.
async fn fetch_content<S: MailboxSession>(
    session: &mut S,
    records: &[StructureRecord],
    requirements: &[Vec<PartRequirement>],
) -> Result<HashMap<(u32, String), Vec<u8>>> {
    let seqs: Vec<u32> = records
        .iter()
        .zip(requirements)
        .filter(|(_, reqs)| !reqs.is_empty())
        .map(|(record, _)| record.seq)
        .collect();
    let Some(set) = SequenceSet::from_numbers(seqs.iter().copied()) else {
        return Ok(HashMap::new());
    };
    let paths: Vec<String> = requirements
        .iter()
        .flatten()
        .map(|req| req.path.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    debug!(messages = seqs.len(), sections = paths.len(), "fetching part content");

    let sections = session
        .fetch_sections(&set, &paths)
        .await
        .map_err(|e| Error::at(Stage::FetchContent, e))?;
    Ok(sections
        .into_iter()
        .map(|section| ((section.seq, section.path), section.data))
        .collect())
}
