//! Error types for the IMAP client.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while talking to an IMAP server.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or record layer failure.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Host name could not be used as a TLS server name.
    #[error("invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A server response could not be parsed.
    #[error("parse error at byte {position}: {message}")]
    Parse {
        /// Byte offset into the response.
        position: usize,
        /// What the parser expected.
        message: String,
    },

    /// LOGIN was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Tagged NO completion.
    #[error("server returned NO: {0}")]
    No(String),

    /// Tagged BAD completion.
    #[error("server returned BAD: {0}")]
    Bad(String),

    /// Server closed the session with BYE.
    #[error("server sent BYE: {0}")]
    Bye(String),

    /// Connect or read exceeded the configured deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Unexpected or oversized protocol data.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// True when the server refused the command rather than the transport failing.
    #[must_use]
    pub const fn is_server_refusal(&self) -> bool {
        matches!(self, Self::No(_) | Self::Bad(_))
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
