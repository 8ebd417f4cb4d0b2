//! Type-state IMAP client.
//!
//! The connection moves through `NotAuthenticated`, `Authenticated` and
//! `Selected`; each state only exposes the commands valid in it, and the
//! transitions consume the previous client.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

pub use self::selected::FetchRecord;
pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::{FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, Status};
use crate::{Error, Result};

/// IMAP client in connection state `State`.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("capabilities", &self.capabilities)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Capabilities last announced by the server.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Whether the server announced `cap`.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Whether `SEARCH RETURN (...)` is understood (ESEARCH or `IMAP4rev2`).
    #[must_use]
    pub fn supports_esearch(&self) -> bool {
        self.has_capability(&Capability::Esearch) || self.has_capability(&Capability::Imap4Rev2)
    }

    /// Whether UID MOVE is available (MOVE or `IMAP4rev2`).
    #[must_use]
    pub fn supports_move(&self) -> bool {
        self.has_capability(&Capability::Move) || self.has_capability(&Capability::Imap4Rev2)
    }

    /// Sends NOOP.
    pub async fn noop(&mut self) -> Result<()> {
        self.run(Command::Noop).await.map(drop)
    }

    /// Refreshes the capability list.
    pub async fn capability(&mut self) -> Result<&[Capability]> {
        let responses = self.run(Command::Capability).await?;
        self.absorb_capabilities(&responses);
        Ok(&self.capabilities)
    }

    fn absorb_capabilities(&mut self, responses: &[UntaggedResponse]) {
        for response in responses {
            if let UntaggedResponse::Capability(caps) = response {
                self.capabilities.clone_from(caps);
            }
        }
    }

    /// Sends `command` and collects its untagged responses.
    ///
    /// Fails with the tagged completion status when it is not OK.
    pub(crate) async fn run(&mut self, command: Command) -> Result<Vec<UntaggedResponse>> {
        let tag = self.tag_gen.next();
        let bytes = command.serialize(&tag);
        trace!(%tag, len = bytes.len(), "sending command");
        self.stream.write_command(&bytes).await?;

        let raw = ResponseAccumulator::new(tag.as_str())
            .read_until_tagged(&mut self.stream)
            .await?;

        let mut untagged = Vec::with_capacity(raw.len());
        let mut completion = None;
        for bytes in &raw {
            match ResponseParser::parse(bytes)? {
                Response::Untagged(response) => untagged.push(response),
                Response::Tagged {
                    tag: got,
                    status,
                    text,
                    ..
                } if got == tag => completion = Some((status, text)),
                Response::Tagged { .. } | Response::Continuation { .. } => {}
            }
        }

        match completion {
            Some((status, text)) => check_status(status, text).map(|()| untagged),
            None => Err(Error::Protocol(format!("no completion for tag {tag}"))),
        }
    }

    /// Moves the connection into another state.
    pub(crate) fn transition<Next>(self, state: Next) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            state,
        }
    }
}

fn check_status(status: Status, text: String) -> Result<()> {
    match status {
        Status::Ok | Status::PreAuth => Ok(()),
        Status::No => Err(Error::No(text)),
        Status::Bad => Err(Error::Bad(text)),
        Status::Bye => Err(Error::Bye(text)),
    }
}
