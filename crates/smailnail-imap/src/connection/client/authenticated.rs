//! SELECT and EXAMINE.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::{Authenticated, Selected};
use crate::command::Command;
use crate::parser::UntaggedResponse;
use crate::types::{Mailbox, MailboxStatus, ResponseCode};
use crate::{Error, Result};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Opens `mailbox` read-write.
    pub async fn select(self, mailbox: &str) -> Result<Client<S, Selected>> {
        let command = Command::Select {
            mailbox: Mailbox::new(mailbox),
        };
        self.open(mailbox, command).await
    }

    /// Opens `mailbox` read-only.
    pub async fn examine(self, mailbox: &str) -> Result<Client<S, Selected>> {
        let command = Command::Examine {
            mailbox: Mailbox::new(mailbox),
        };
        self.open(mailbox, command).await
    }

    async fn open(mut self, mailbox: &str, command: Command) -> Result<Client<S, Selected>> {
        let read_only = matches!(command, Command::Examine { .. });
        let responses = self.run(command).await?;
        let mut status = mailbox_status(&responses);
        status.read_only |= read_only;
        debug!(mailbox, exists = status.exists, read_only = status.read_only, "mailbox opened");
        Ok(self.transition(Selected::new(mailbox, status)))
    }

    /// Ends the session.
    pub async fn logout(mut self) -> Result<()> {
        match self.run(Command::Logout).await {
            Ok(_) | Err(Error::Bye(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Folds SELECT/EXAMINE untagged data into a status snapshot.
pub(super) fn mailbox_status(responses: &[UntaggedResponse]) -> MailboxStatus {
    let mut status = MailboxStatus::default();
    for response in responses {
        match response {
            UntaggedResponse::Exists(n) => status.exists = *n,
            UntaggedResponse::Recent(n) => status.recent = *n,
            UntaggedResponse::Flags(flags) => status.flags = flags.clone(),
            UntaggedResponse::Ok {
                code: Some(code), ..
            } => match code {
                ResponseCode::UidValidity(v) => status.uid_validity = Some(*v),
                ResponseCode::UidNext(v) => status.uid_next = Some(*v),
                ResponseCode::Unseen(v) => status.unseen = Some(*v),
                ResponseCode::PermanentFlags(flags) => {
                    status.permanent_flags = flags.iter().cloned().collect();
                }
                ResponseCode::ReadOnly => status.read_only = true,
                _ => {}
            },
            _ => {}
        }
    }
    status
}
