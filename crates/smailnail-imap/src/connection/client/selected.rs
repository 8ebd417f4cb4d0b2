//! Commands available once a mailbox is open.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::Selected;
use crate::command::{Command, FetchItems, SearchCriteria, SearchOptions, StoreAction};
use crate::parser::{FetchItem, SearchData, UntaggedResponse};
use crate::types::{Flag, Mailbox, MailboxStatus, SeqNum, SequenceSet, UidSet};
use crate::{Error, Result};

/// One message's FETCH data.
pub type FetchRecord = (SeqNum, Vec<FetchItem>);

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Name of the open mailbox.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        self.state.mailbox()
    }

    /// Status reported when the mailbox was opened.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        self.state.status()
    }

    /// SEARCH returning sequence numbers.
    ///
    /// `options` are dropped when the server cannot answer `RETURN (...)`;
    /// the result then carries the plain match list and no count.
    pub async fn search(
        &mut self,
        criteria: SearchCriteria,
        mut options: SearchOptions,
    ) -> Result<SearchData> {
        if !options.is_empty() && !self.supports_esearch() {
            debug!("server lacks ESEARCH; sending plain SEARCH");
            options = SearchOptions::default();
        }
        let responses = self
            .run(Command::Search {
                criteria,
                options,
                uid: false,
            })
            .await?;

        let mut data = SearchData::default();
        for response in responses {
            if let UntaggedResponse::Search(part) = response {
                data.merge(part);
            }
        }
        Ok(data)
    }

    /// FETCH by sequence numbers.
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: FetchItems,
    ) -> Result<Vec<FetchRecord>> {
        self.fetch_inner(sequence.clone(), items, false).await
    }

    /// UID FETCH.
    pub async fn uid_fetch(&mut self, uids: &UidSet, items: FetchItems) -> Result<Vec<FetchRecord>> {
        self.fetch_inner(uids.as_sequence_set(), items, true).await
    }

    async fn fetch_inner(
        &mut self,
        sequence: SequenceSet,
        items: FetchItems,
        uid: bool,
    ) -> Result<Vec<FetchRecord>> {
        let responses = self
            .run(Command::Fetch {
                sequence,
                items,
                uid,
            })
            .await?;
        Ok(responses
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Fetch { seq, items } => Some((seq, items)),
                _ => None,
            })
            .collect())
    }

    /// UID STORE with `.SILENT`.
    pub async fn uid_store(&mut self, uids: &UidSet, action: StoreAction) -> Result<()> {
        self.run(Command::Store {
            sequence: uids.as_sequence_set(),
            action,
            uid: true,
            silent: true,
        })
        .await
        .map(drop)
    }

    /// UID COPY into `mailbox`.
    pub async fn uid_copy(&mut self, uids: &UidSet, mailbox: &str) -> Result<()> {
        self.run(Command::Copy {
            sequence: uids.as_sequence_set(),
            mailbox: Mailbox::new(mailbox),
            uid: true,
        })
        .await
        .map(drop)
    }

    /// UID MOVE into `mailbox`.
    ///
    /// Without the MOVE extension this falls back to COPY, `+FLAGS
    /// (\Deleted)` and EXPUNGE, which also expunges any other message
    /// already flagged deleted.
    pub async fn uid_move(&mut self, uids: &UidSet, mailbox: &str) -> Result<()> {
        if self.supports_move() {
            return self
                .run(Command::Move {
                    sequence: uids.as_sequence_set(),
                    mailbox: Mailbox::new(mailbox),
                    uid: true,
                })
                .await
                .map(drop);
        }
        debug!(mailbox, "server lacks MOVE; using COPY and EXPUNGE");
        self.uid_copy(uids, mailbox).await?;
        self.uid_store(uids, StoreAction::AddFlags(vec![Flag::Deleted]))
            .await?;
        self.expunge().await.map(drop)
    }

    /// EXPUNGE; returns the expunged sequence numbers in server order.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let responses = self.run(Command::Expunge).await?;
        Ok(responses
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Expunge(seq) => Some(seq),
                _ => None,
            })
            .collect())
    }

    /// Ends the session.
    pub async fn logout(mut self) -> Result<()> {
        match self.run(Command::Logout).await {
            Ok(_) | Err(Error::Bye(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
