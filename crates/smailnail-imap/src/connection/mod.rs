//! Connection handling: settings, sockets, framing and the type-state client.

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authenticated, Client, FetchRecord, NotAuthenticated, Selected};
pub use config::{Config, ConfigBuilder, Security};
pub use framed::{FramedStream, ResponseAccumulator};
pub use stream::{ImapStream, connect, tls_connector};
