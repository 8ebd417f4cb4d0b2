//! Runs one rule end to end: search and fetch, render, then act.

use std::io::Write;

use tracing::{info, warn};

use crate::error::Result;
use crate::executor::execute_actions;
use crate::fetch::fetch_messages;
use crate::fetch::session::{MailboxActions, MailboxSession};
use crate::render::render;
use crate::rule::Rule;

/// Outcome of [`process_rule`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Messages fetched and rendered.
    pub fetched: usize,
    /// Total matches reported by the search, before pagination.
    pub total: u32,
    /// Whether the rule's actions ran.
    pub actions_run: bool,
}

/// Fetches the messages matching `rule`, renders them to `out` and, when
/// `run_actions` is set, executes the rule's actions on them.
///
/// # Errors
///
/// Returns the first pipeline, rendering or action failure. Output already
/// written stays written when an action fails.
pub async fn process_rule<S, W>(
    session: &mut S,
    rule: &Rule,
    out: &mut W,
    run_actions: bool,
) -> Result<RunReport>
where
    S: MailboxSession + MailboxActions,
    W: Write,
{
    let messages = fetch_messages(session, rule).await?;
    render(&messages, &rule.output, out)?;
    out.flush()?;

    let mut report = RunReport {
        fetched: messages.len(),
        total: messages.first().map_or(0, |m| m.total_count),
        actions_run: false,
    };

    match &rule.actions {
        Some(actions) if !actions.is_empty() => {
            if run_actions {
                execute_actions(session, &messages, actions).await?;
                report.actions_run = true;
            } else {
                warn!(rule = %rule.name, "actions skipped");
            }
        }
        _ => {}
    }
    info!(
        rule = %rule.name,
        fetched = report.fetched,
        total = report.total,
        actions = report.actions_run,
        "rule finished"
    );
    Ok(report)
}
