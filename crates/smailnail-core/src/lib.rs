//! # smailnail-core
//!
//! Rule processing for smailnail.
//!
//! A rule is a YAML document with a search tree, an output projection and
//! optional actions:
//!
//! ```yaml
//! name: unread invoices
//! search:
//!   operator: and
//!   conditions:
//!     - subject_contains: invoice
//!     - flags: { not_has: [seen] }
//! output:
//!   format: table
//!   limit: 20
//!   fields: [uid, date, from, subject]
//! actions:
//!   flags: { add: [seen] }
//! ```
//!
//! This crate provides:
//! - Rule parsing and validation ([`rule`])
//! - Compilation of the search tree into IMAP criteria ([`compile`])
//! - Pagination over search results and two-phase, structure-aware
//!   fetching ([`fetch`])
//! - Rendering in text, JSON, YAML, table and CSV ([`render`])
//! - Flag, copy, move, delete and export actions ([`executor`])
//! - Template-driven test mail generation ([`mailgen`])
//!
//! The mailbox is reached through the [`MailboxSession`] and
//! [`MailboxActions`] traits, implemented for a selected
//! [`smailnail_imap::Client`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod compile;
mod error;
pub mod executor;
pub mod fetch;
pub mod mailgen;
mod message;
pub mod processor;
pub mod render;
pub mod rule;

pub use compile::{CompiledSearch, Compiler, compile};
pub use error::{Error, Result, Stage, ValidationError};
pub use executor::execute_actions;
pub use fetch::session::{MailboxActions, MailboxSession, SectionData, StructureRecord};
pub use fetch::window::{MessageWindow, WindowPlan, paginate, window};
pub use fetch::{fetch_messages, fetch_window, search_and_fetch};
pub use mailgen::{
    Batch, DataFormat, GeneratedEmail, MailGenerator, TemplateConfig, write_message_files,
};
pub use message::{DomainMessage, MimePart};
pub use processor::{RunReport, process_rule};
pub use render::render;
pub use rule::{
    ActionConfig, DeleteConfig, ExportConfig, ExportFormat, OutputConfig, OutputField,
    OutputFormat, Pagination, Rule, SearchPredicate, load_rule, parse_rule,
};
