//! The mailbox operations the pipeline and actions need, as traits.
//!
//! [`Client<S, Selected>`] implements both; tests substitute in-memory
//! fakes.

use smailnail_imap::{
    BodyStructure, Client, Envelope, FetchAttribute, FetchItem, FetchItems, Flags,
    SearchCriteria, SearchData, SearchOptions, Selected, SeqNum, SequenceSet, StoreAction, Uid,
    UidSet,
};
use tokio::io::{AsyncRead, AsyncWrite};

/// Phase-one FETCH data for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureRecord {
    /// Sequence number.
    pub seq: u32,
    /// UID.
    pub uid: Option<Uid>,
    /// Flags.
    pub flags: Flags,
    /// Envelope; empty if the server sent none.
    pub envelope: Envelope,
    /// RFC822 size.
    pub size: u32,
    /// INTERNALDATE as sent.
    pub internal_date: Option<String>,
    /// BODYSTRUCTURE.
    pub structure: Option<BodyStructure>,
}

impl StructureRecord {
    /// Collects the items of one FETCH response.
    #[must_use]
    pub fn from_items(seq: SeqNum, items: Vec<FetchItem>) -> Self {
        let mut record = Self {
            seq: seq.get(),
            ..Self::default()
        };
        record.absorb(items);
        record
    }

    /// Applies the items of another FETCH response for the same message.
    /// Items it does not carry keep their current value.
    pub fn absorb(&mut self, items: Vec<FetchItem>) {
        for item in items {
            match item {
                FetchItem::Uid(uid) => self.uid = Some(uid),
                FetchItem::Flags(flags) => self.flags = flags,
                FetchItem::Envelope(envelope) => self.envelope = *envelope,
                FetchItem::Rfc822Size(size) => self.size = size,
                FetchItem::InternalDate(date) => self.internal_date = Some(date),
                FetchItem::BodyStructure(structure) => self.structure = Some(structure),
                FetchItem::Body { .. } => {}
            }
        }
    }

    /// Folds a later record for the same message into this one. Fields
    /// `later` leaves at their default keep the current value.
    pub fn merge(&mut self, later: Self) {
        if later.uid.is_some() {
            self.uid = later.uid;
        }
        if !later.flags.is_empty() {
            self.flags = later.flags;
        }
        if later.envelope != Envelope::default() {
            self.envelope = later.envelope;
        }
        if later.size != 0 {
            self.size = later.size;
        }
        if later.internal_date.is_some() {
            self.internal_date = later.internal_date;
        }
        if later.structure.is_some() {
            self.structure = later.structure;
        }
    }
}

/// One section returned by the batched content fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionData {
    /// Owning message.
    pub seq: u32,
    /// Section path as reported by the server.
    pub path: String,
    /// Raw, still transfer-encoded bytes.
    pub data: Vec<u8>,
}

/// Read access to a selected mailbox.
#[allow(async_fn_in_trait)]
pub trait MailboxSession {
    /// SEARCH by sequence number.
    async fn search(
        &mut self,
        criteria: SearchCriteria,
        options: SearchOptions,
    ) -> smailnail_imap::Result<SearchData>;

    /// Envelope, flags, size and structure of every message in `set`, in
    /// server order.
    async fn fetch_structure(
        &mut self,
        set: &SequenceSet,
    ) -> smailnail_imap::Result<Vec<StructureRecord>>;

    /// `BODY.PEEK[path]` for every path and message in one round trip.
    async fn fetch_sections(
        &mut self,
        set: &SequenceSet,
        paths: &[String],
    ) -> smailnail_imap::Result<Vec<SectionData>>;

    /// `(seq, uid)` pairs for `set`.
    async fn fetch_uids(&mut self, set: &SequenceSet) -> smailnail_imap::Result<Vec<(u32, Uid)>>;
}

/// Mutations used by rule actions.
#[allow(async_fn_in_trait)]
pub trait MailboxActions {
    /// UID STORE.
    async fn store(&mut self, uids: &UidSet, action: StoreAction) -> smailnail_imap::Result<()>;

    /// UID COPY.
    async fn copy(&mut self, uids: &UidSet, mailbox: &str) -> smailnail_imap::Result<()>;

    /// UID MOVE.
    async fn move_to(&mut self, uids: &UidSet, mailbox: &str) -> smailnail_imap::Result<()>;

    /// EXPUNGE.
    async fn expunge(&mut self) -> smailnail_imap::Result<()>;

    /// Whole message by UID; `None` if the server returned nothing.
    async fn fetch_raw(&mut self, uid: Uid) -> smailnail_imap::Result<Option<Vec<u8>>>;
}

impl<S> MailboxSession for Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn search(
        &mut self,
        criteria: SearchCriteria,
        options: SearchOptions,
    ) -> smailnail_imap::Result<SearchData> {
        Self::search(self, criteria, options).await
    }

    async fn fetch_structure(
        &mut self,
        set: &SequenceSet,
    ) -> smailnail_imap::Result<Vec<StructureRecord>> {
        let items = FetchItems::Items(vec![
            FetchAttribute::Uid,
            FetchAttribute::Flags,
            FetchAttribute::Envelope,
            FetchAttribute::Rfc822Size,
            FetchAttribute::BodyStructure,
            FetchAttribute::InternalDate,
        ]);
        let mut records: Vec<StructureRecord> = Vec::new();
        for (seq, items) in self.fetch(set, items).await? {
            match records.iter_mut().find(|r| r.seq == seq.get()) {
                Some(record) => record.absorb(items),
                None => records.push(StructureRecord::from_items(seq, items)),
            }
        }
        Ok(records)
    }

    async fn fetch_sections(
        &mut self,
        set: &SequenceSet,
        paths: &[String],
    ) -> smailnail_imap::Result<Vec<SectionData>> {
        let items = FetchItems::Items(
            paths
                .iter()
                .map(|p| FetchAttribute::peek_section(p.as_str()))
                .collect(),
        );
        let records = self.fetch(set, items).await?;
        let mut sections = Vec::new();
        for (seq, items) in records {
            for item in items {
                if let FetchItem::Body {
                    section: Some(path),
                    origin: None,
                    data: Some(data),
                } = item
                {
                    sections.push(SectionData {
                        seq: seq.get(),
                        path,
                        data,
                    });
                }
            }
        }
        Ok(sections)
    }

    async fn fetch_uids(&mut self, set: &SequenceSet) -> smailnail_imap::Result<Vec<(u32, Uid)>> {
        let records = self
            .fetch(set, FetchItems::Items(vec![FetchAttribute::Uid]))
            .await?;
        Ok(records
            .into_iter()
            .filter_map(|(seq, items)| {
                items.into_iter().find_map(|item| match item {
                    FetchItem::Uid(uid) => Some((seq.get(), uid)),
                    _ => None,
                })
            })
            .collect())
    }
}

impl<S> MailboxActions for Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn store(&mut self, uids: &UidSet, action: StoreAction) -> smailnail_imap::Result<()> {
        self.uid_store(uids, action).await
    }

    async fn copy(&mut self, uids: &UidSet, mailbox: &str) -> smailnail_imap::Result<()> {
        self.uid_copy(uids, mailbox).await
    }

    async fn move_to(&mut self, uids: &UidSet, mailbox: &str) -> smailnail_imap::Result<()> {
        self.uid_move(uids, mailbox).await
    }

    async fn expunge(&mut self) -> smailnail_imap::Result<()> {
        Self::expunge(self).await.map(drop)
    }

    async fn fetch_raw(&mut self, uid: Uid) -> smailnail_imap::Result<Option<Vec<u8>>> {
        let records = self
            .uid_fetch(
                &UidSet::single(uid),
                FetchItems::Items(vec![FetchAttribute::peek_message()]),
            )
            .await?;
        Ok(records.into_iter().flat_map(|(_, items)| items).find_map(|item| match item {
            FetchItem::Body {
                section: None,
                data,
                ..
            } => data,
            _ => None,
        }))
    }
}
