//! Executes rule actions against the matched messages.

use chrono::Utc;
use smailnail_imap::{Flag, StoreAction, Uid, UidSet};
use tracing::{debug, info, warn};

use crate::compile::flags::to_flag;
use crate::error::{Error, Result};
use crate::fetch::session::MailboxActions;
use crate::mailgen::{Context, render_plain};
use crate::message::DomainMessage;
use crate::rule::{ActionConfig, DeleteConfig, ExportConfig, ExportFormat};

/// Mailbox that `delete: {trash: true}` moves to.
pub const TRASH_MAILBOX: &str = "Trash";

/// Runs `actions` over `messages`: flags, copy, export, then move or
/// delete. A move ends the sequence.
///
/// # Errors
///
/// Returns [`Error::Action`] naming the first action that failed.
pub async fn execute_actions<M: MailboxActions>(
    session: &mut M,
    messages: &[DomainMessage],
    actions: &ActionConfig,
) -> Result<()> {
    let Some(uids) = UidSet::from_uids(messages.iter().filter_map(|m| m.uid.and_then(Uid::new)))
    else {
        debug!("no messages to act on");
        return Ok(());
    };
    info!(messages = messages.len(), "executing actions");

    if let Some(flags) = &actions.flags {
        if !flags.add.is_empty() {
            let add = parse_flags(&flags.add).map_err(|e| Error::in_action("flags", e))?;
            session
                .store(&uids, StoreAction::AddFlags(add))
                .await
                .map_err(|e| Error::in_action("flags", e))?;
        }
        if !flags.remove.is_empty() {
            let remove = parse_flags(&flags.remove).map_err(|e| Error::in_action("flags", e))?;
            session
                .store(&uids, StoreAction::RemoveFlags(remove))
                .await
                .map_err(|e| Error::in_action("flags", e))?;
        }
    }

    if let Some(target) = &actions.copy_to {
        debug!(mailbox = %target, "copying messages");
        session
            .copy(&uids, target)
            .await
            .map_err(|e| Error::in_action("copy", e))?;
    }

    if let Some(export) = &actions.export {
        let written = export_messages(session, messages, export)
            .await
            .map_err(|e| Error::in_action("export", e))?;
        info!(files = written, directory = %export.directory.display(), "exported messages");
    }

    if let Some(target) = &actions.move_to {
        debug!(mailbox = %target, "moving messages");
        return session
            .move_to(&uids, target)
            .await
            .map_err(|e| Error::in_action("move", e));
    }

    if let Some(delete) = actions.delete {
        delete_messages(session, &uids, delete)
            .await
            .map_err(|e| Error::in_action("delete", e))?;
    }
    Ok(())
}

fn parse_flags(names: &[String]) -> Result<Vec<Flag>> {
    names
        .iter()
        .map(|name| to_flag(name).map_err(Error::from))
        .collect()
}

async fn delete_messages<M: MailboxActions>(
    session: &mut M,
    uids: &UidSet,
    delete: DeleteConfig,
) -> Result<()> {
    if delete.uses_trash() {
        debug!(mailbox = TRASH_MAILBOX, "moving messages to trash");
        session.move_to(uids, TRASH_MAILBOX).await?;
        return Ok(());
    }
    debug!("deleting messages permanently");
    session
        .store(uids, StoreAction::AddFlags(vec![Flag::Deleted]))
        .await?;
    session.expunge().await?;
    Ok(())
}

/// Writes each message's raw source under `config.directory`; returns the
/// number of files written.
async fn export_messages<M: MailboxActions>(
    session: &mut M,
    messages: &[DomainMessage],
    config: &ExportConfig,
) -> Result<usize> {
    tokio::fs::create_dir_all(&config.directory).await?;
    let mut written = 0;
    for message in messages {
        let Some(uid) = message.uid.and_then(Uid::new) else {
            warn!(seq = message.seq, "message has no UID, skipping export");
            continue;
        };
        let Some(raw) = session.fetch_raw(uid).await?.filter(|raw| !raw.is_empty()) else {
            warn!(uid = uid.get(), "message body is empty, skipping export");
            continue;
        };
        let name = export_file_name(message, uid, config)?;
        let bytes = match config.format {
            ExportFormat::Eml => raw,
            ExportFormat::Mbox => mbox_entry(&raw),
        };
        tokio::fs::write(config.directory.join(&name), bytes).await?;
        debug!(uid = uid.get(), file = %name, "exported message");
        written += 1;
    }
    Ok(written)
}

/// `message-{uid}.{ext}`, or the rendered filename template followed by
/// `-{uid}.{ext}` with path separators replaced.
fn export_file_name(message: &DomainMessage, uid: Uid, config: &ExportConfig) -> Result<String> {
    let ext = config.format.extension();
    let Some(template) = &config.filename_template else {
        return Ok(format!("message-{}.{ext}", uid.get()));
    };
    let mut context = Context::new();
    context.insert("subject", message.subject.as_str());
    context.insert("uid", uid.get().to_string());
    context.insert("seq", message.seq.to_string());
    context.insert("date", message.date.clone().unwrap_or_default());
    context.insert("from", message.from.first().cloned().unwrap_or_default());
    let stem = render_plain(template, &context)?.replace(['/', '\\'], "_");
    Ok(format!("{}-{}.{ext}", stem.trim(), uid.get()))
}

/// mboxrd entry: a `From ` separator, `>`-escaped `From ` lines and a
/// trailing blank line.
fn mbox_entry(raw: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "From MAILER-DAEMON {}\n",
        Utc::now().format("%a %b %e %H:%M:%S %Y")
    )
    .into_bytes();
    for line in raw.split_inclusive(|&b| b == b'\n') {
        let unquoted = line.iter().position(|&b| b != b'>').unwrap_or(line.len());
        if line[unquoted..].starts_with(b"From ") {
            out.push(b'>');
        }
        out.extend_from_slice(line);
    }
    if !out.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.push(b'\n');
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rule::FlagActions;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Store(String, StoreAction),
        Copy(String, String),
        Move(String, String),
        Expunge,
        FetchRaw(u32),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        raw: HashMap<u32, Vec<u8>>,
        fail_copy: bool,
    }

    fn set(uids: &UidSet) -> String {
        format!("{:?}", uids.as_sequence_set())
    }

    impl MailboxActions for Recorder {
        async fn store(&mut self, uids: &UidSet, action: StoreAction) -> smailnail_imap::Result<()> {
            self.calls.push(Call::Store(set(uids), action));
            Ok(())
        }

        async fn copy(&mut self, uids: &UidSet, mailbox: &str) -> smailnail_imap::Result<()> {
            if self.fail_copy {
                return Err(smailnail_imap::Error::No("[TRYCREATE] no such mailbox".into()));
            }
            self.calls.push(Call::Copy(set(uids), mailbox.into()));
            Ok(())
        }

        async fn move_to(&mut self, uids: &UidSet, mailbox: &str) -> smailnail_imap::Result<()> {
            self.calls.push(Call::Move(set(uids), mailbox.into()));
            Ok(())
        }

        async fn expunge(&mut self) -> smailnail_imap::Result<()> {
            self.calls.push(Call::Expunge);
            Ok(())
        }

        async fn fetch_raw(&mut self, uid: Uid) -> smailnail_imap::Result<Option<Vec<u8>>> {
            self.calls.push(Call::FetchRaw(uid.get()));
            Ok(self.raw.get(&uid.get()).cloned())
        }
    }

    fn messages() -> Vec<DomainMessage> {
        [(1, 11, "First/one"), (2, 12, "Second")]
            .into_iter()
            .map(|(seq, uid, subject)| DomainMessage {
                seq,
                uid: Some(uid),
                subject: subject.into(),
                ..DomainMessage::default()
            })
            .collect()
    }

    fn both() -> String {
        set(&UidSet::from_uids([Uid::new(11).unwrap(), Uid::new(12).unwrap()]).unwrap())
    }

    #[tokio::test]
    async fn runs_in_order_and_move_ends_sequence() {
        let mut session = Recorder::default();
        let actions = ActionConfig {
            flags: Some(FlagActions {
                add: vec!["seen".into()],
                remove: vec!["flagged".into()],
            }),
            copy_to: Some("Backup".into()),
            move_to: Some("Archive".into()),
            delete: Some(DeleteConfig::Permanent),
            ..ActionConfig::default()
        };
        execute_actions(&mut session, &messages(), &actions).await.unwrap();
        assert_eq!(
            session.calls,
            vec![
                Call::Store(both(), StoreAction::AddFlags(vec![Flag::Seen])),
                Call::Store(both(), StoreAction::RemoveFlags(vec![Flag::Flagged])),
                Call::Copy(both(), "Backup".into()),
                Call::Move(both(), "Archive".into()),
            ]
        );
    }

    #[tokio::test]
    async fn delete_modes() {
        let mut permanent = Recorder::default();
        let actions = ActionConfig {
            delete: Some(DeleteConfig::MoveToTrash(false)),
            ..ActionConfig::default()
        };
        execute_actions(&mut permanent, &messages(), &actions).await.unwrap();
        assert_eq!(
            permanent.calls,
            vec![
                Call::Store(both(), StoreAction::AddFlags(vec![Flag::Deleted])),
                Call::Expunge,
            ]
        );

        let mut trash = Recorder::default();
        let actions = ActionConfig {
            delete: Some(DeleteConfig::MoveToTrash(true)),
            ..ActionConfig::default()
        };
        execute_actions(&mut trash, &messages(), &actions).await.unwrap();
        assert_eq!(trash.calls, vec![Call::Move(both(), "Trash".into())]);
    }

    #[tokio::test]
    async fn no_messages_is_a_no_op() {
        let mut session = Recorder::default();
        let actions = ActionConfig {
            delete: Some(DeleteConfig::Permanent),
            ..ActionConfig::default()
        };
        execute_actions(&mut session, &[], &actions).await.unwrap();
        assert!(session.calls.is_empty());
    }

    #[tokio::test]
    async fn failure_names_the_action() {
        let mut session = Recorder {
            fail_copy: true,
            ..Recorder::default()
        };
        let actions = ActionConfig {
            copy_to: Some("Nowhere".into()),
            ..ActionConfig::default()
        };
        let err = execute_actions(&mut session, &messages(), &actions)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("copy action failed: "));
    }

    #[tokio::test]
    async fn exports_eml_and_skips_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Recorder::default();
        session.raw.insert(11, b"Subject: First\r\n\r\nbody\r\n".to_vec());
        session.raw.insert(12, Vec::new());
        let actions = ActionConfig {
            export: Some(ExportConfig {
                directory: dir.path().join("export"),
                ..ExportConfig::default()
            }),
            ..ActionConfig::default()
        };
        execute_actions(&mut session, &messages(), &actions).await.unwrap();
        let written = std::fs::read(dir.path().join("export/message-11.eml")).unwrap();
        assert_eq!(written, b"Subject: First\r\n\r\nbody\r\n");
        assert!(!dir.path().join("export/message-12.eml").exists());
    }

    #[tokio::test]
    async fn exports_mbox_with_template_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Recorder::default();
        session.raw.insert(11, b"Subject: x\n\nFrom here\n>From there\n".to_vec());
        session.raw.insert(12, b"Subject: y\n\nok".to_vec());
        let actions = ActionConfig {
            export: Some(ExportConfig {
                format: ExportFormat::Mbox,
                directory: PathBuf::from(dir.path()),
                filename_template: Some("{{ .subject }}".into()),
            }),
            ..ActionConfig::default()
        };
        execute_actions(&mut session, &messages(), &actions).await.unwrap();
        let first = std::fs::read_to_string(dir.path().join("First_one-11.mbox")).unwrap();
        assert!(first.starts_with("From MAILER-DAEMON "));
        assert!(first.ends_with("\n>From here\n>>From there\n\n"));
        let second = std::fs::read_to_string(dir.path().join("Second-12.mbox")).unwrap();
        assert!(second.ends_with("\n\nok\n\n"));
    }

    #[tokio::test]
    async fn export_names_cannot_be_random() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Recorder::default();
        session.raw.insert(11, b"Subject: x\n\nbody".to_vec());
        let actions = ActionConfig {
            export: Some(ExportConfig {
                format: ExportFormat::Eml,
                directory: PathBuf::from(dir.path()),
                filename_template: Some("{{ pickRandom .subject }}".into()),
            }),
            ..ActionConfig::default()
        };
        let err = execute_actions(&mut session, &messages(), &actions)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Action { action: "export", .. }));
        assert!(err.to_string().contains("export"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
