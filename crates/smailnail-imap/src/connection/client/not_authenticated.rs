//! Greeting, STARTTLS and LOGIN.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::config::{Config, Security};
use crate::connection::framed::FramedStream;
use crate::connection::stream::{self, ImapStream};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::ResponseCode;
use crate::{Error, Result};

impl Client<ImapStream, NotAuthenticated> {
    /// Connects per `config`, reads the greeting and negotiates STARTTLS
    /// when the configuration asks for it.
    pub async fn connect(config: &Config) -> Result<Self> {
        let socket = stream::connect(config).await?;
        let client = Self::from_stream_with_timeout(socket, config.io_timeout).await?;
        match config.security {
            Security::StartTls => client.starttls(&config.host).await,
            Security::Implicit | Security::None => Ok(client),
        }
    }

    /// Upgrades a plaintext session with STARTTLS and refreshes capabilities.
    pub async fn starttls(mut self, host: &str) -> Result<Self> {
        self.run(Command::StartTls).await?;
        let timeout = self.stream.read_timeout();
        let upgraded = self.stream.into_inner().upgrade_to_tls(host).await?;
        debug!(host, "TLS negotiated via STARTTLS");

        let mut client = Self {
            stream: FramedStream::new(upgraded).with_read_timeout(timeout),
            tag_gen: self.tag_gen,
            capabilities: Vec::new(),
            state: NotAuthenticated,
        };
        client.capability().await?;
        Ok(client)
    }
}

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream and reads the server greeting.
    pub async fn from_stream(stream: S) -> Result<Self> {
        Self::from_stream_with_timeout(stream, None).await
    }

    /// Like [`Client::from_stream`] with a per-response read deadline.
    pub async fn from_stream_with_timeout(
        stream: S,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        let mut framed = FramedStream::new(stream).with_read_timeout(timeout);
        let greeting = framed.read_response().await?;

        let mut capabilities = Vec::new();
        match ResponseParser::parse(&greeting)? {
            Response::Untagged(
                UntaggedResponse::Ok { code, .. } | UntaggedResponse::PreAuth { code, .. },
            ) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    capabilities = caps;
                }
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => return Err(Error::Bye(text)),
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            state: NotAuthenticated,
        })
    }

    /// Logs in with a user name and password.
    ///
    /// A NO completion is reported as [`Error::Auth`].
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let responses = match self.run(command).await {
            Ok(responses) => responses,
            Err(Error::No(text)) => return Err(Error::Auth(text)),
            Err(e) => return Err(e),
        };
        self.absorb_capabilities(&responses);
        info!(user = username, "logged in");

        // Servers may omit post-login capabilities; the pre-login list can be stale.
        if !responses
            .iter()
            .any(|r| matches!(r, UntaggedResponse::Capability(_)))
        {
            self.capability().await?;
        }
        Ok(self.transition(Authenticated))
    }

    /// Ends the session before logging in.
    pub async fn logout(mut self) -> Result<()> {
        match self.run(Command::Logout).await {
            Ok(_) | Err(Error::Bye(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
