//! # smailnail-imap
//!
//! The IMAP subset smailnail needs to run rules against a mailbox:
//! LOGIN, SELECT/EXAMINE, SEARCH with ESEARCH return options,
//! FETCH of envelopes, body structures and body sections, UID STORE,
//! UID COPY, UID MOVE and EXPUNGE.
//!
//! ## Quick start
//!
//! ```ignore
//! use smailnail_imap::{Client, Config, FetchItems, SearchCriteria, SearchOptions, Security};
//!
//! # async fn run() -> smailnail_imap::Result<()> {
//! let config = Config::builder("imap.example.com").security(Security::Implicit).build();
//! let client = Client::connect(&config).await?;
//! let client = client.login("user@example.com", "secret").await?;
//! let mut inbox = client.select("INBOX").await?;
//!
//! let found = inbox
//!     .search(SearchCriteria::Subject("invoice".into()), SearchOptions::all_and_count())
//!     .await?;
//! println!("{} matches", found.count.unwrap_or(0));
//! inbox.logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Connection states
//!
//! ```text
//! NotAuthenticated ── login() ──▶ Authenticated ── select()/examine() ──▶ Selected
//! ```
//!
//! The parser in [`parser`] is sans-I/O; [`connection`] owns the socket.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{
    Command, FetchAttribute, FetchItems, SearchCriteria, SearchOptions, StoreAction, TagGenerator,
};
pub use connection::{
    Authenticated, Client, Config, ConfigBuilder, FetchRecord, ImapStream, NotAuthenticated,
    Security, Selected,
};
pub use error::{Error, Result};
pub use parser::{
    Address, BodyPart, BodyStructure, Envelope, FetchItem, Response, ResponseParser, SearchData,
    UntaggedResponse,
};
pub use types::{
    Capability, Flag, Flags, Mailbox, MailboxStatus, SeqNum, SequenceSet, Status, Uid, UidSet,
    UidValidity,
};
