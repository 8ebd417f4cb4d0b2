//! CRLF framing with literal support.
//!
//! A single IMAP response may span several lines when it carries
//! `{n}` literals; [`FramedStream::read_response`] returns the whole
//! thing, literal bytes included, so the parser sees one buffer.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const READ_BUFFER: usize = 16 * 1024;

/// Longest line accepted outside of literals.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Largest literal accepted from the server.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// Buffered IMAP transport.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    out: BytesMut,
    read_timeout: Option<Duration>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER, stream),
            out: BytesMut::with_capacity(1024),
            read_timeout: None,
        }
    }

    /// Sets a deadline applied to each complete response read.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Reads one full response, following any literals it announces.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_framed())
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => self.read_framed().await,
        }
    }

    async fn read_framed(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();
        loop {
            let line = self.read_line().await?;
            response.extend_from_slice(&line);

            let Some(len) = literal_length(&line) else {
                break;
            };
            if len > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            let start = response.len();
            response.resize(start + len, 0);
            self.reader.read_exact(&mut response[start..]).await?;
        }
        Ok(response)
    }

    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )));
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..=pos]);
                self.reader.consume(pos + 1);
                return Ok(line);
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);
            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }
    }

    /// Writes a serialized command and flushes it.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.out.clear();
        self.out.extend_from_slice(data);
        let stream = self.reader.get_mut();
        stream.write_all(&self.out).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Returns the inner stream, dropping anything still buffered.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }

    /// Read deadline currently in force.
    pub const fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }
}

/// Length of a `{n}` or `{n+}` literal announced at the end of `line`.
fn literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\n")?;
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let line = line.strip_suffix(b"}")?;
    let line = line.strip_suffix(b"+").unwrap_or(line);
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Collects responses until the completion for one tag arrives.
pub struct ResponseAccumulator {
    tag: String,
}

impl ResponseAccumulator {
    /// Creates an accumulator waiting on `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Reads until the tagged completion; the completion is the last element.
    pub async fn read_until_tagged<S>(&self, framed: &mut FramedStream<S>) -> Result<Vec<Vec<u8>>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut responses = Vec::new();
        loop {
            let response = framed.read_response().await?;
            let done = self.is_completion(&response);
            responses.push(response);
            if done {
                return Ok(responses);
            }
        }
    }

    fn is_completion(&self, response: &[u8]) -> bool {
        response
            .strip_prefix(self.tag.as_bytes())
            .is_some_and(|rest| rest.first() == Some(&b' '))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;

    #[test]
    fn literal_length_forms() {
        assert_eq!(literal_length(b"BODY[1] {42}\r\n"), Some(42));
        assert_eq!(literal_length(b"{7+}\r\n"), Some(7));
        assert_eq!(literal_length(b"{0}\n"), Some(0));
        assert_eq!(literal_length(b"* OK done\r\n"), None);
        assert_eq!(literal_length(b"{}\r\n"), None);
        assert_eq!(literal_length(b"{12x}\r\n"), None);
        assert_eq!(literal_length(b"partial {12"), None);
    }

    #[tokio::test]
    async fn reads_literal_spanning_reads() {
        let mock = Builder::new()
            .read(b"* 3 FETCH (BODY[1] {11}\r\n")
            .read(b"hello ")
            .read(b"world)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);
        let response = framed.read_response().await.unwrap();
        assert_eq!(response, b"* 3 FETCH (BODY[1] {11}\r\nhello world)\r\n");
    }

    #[tokio::test]
    async fn accumulates_until_matching_tag() {
        let mock = Builder::new()
            .read(b"* 2 EXISTS\r\n")
            .read(b"A0011 OK other tag\r\n")
            .read(b"A001 OK SELECT completed\r\n")
            .build();
        let mut framed = FramedStream::new(mock);
        let responses = ResponseAccumulator::new("A001")
            .read_until_tagged(&mut framed)
            .await
            .unwrap();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[2], b"A001 OK SELECT completed\r\n");
    }

    #[tokio::test]
    async fn rejects_oversized_literal() {
        let header = format!("* 1 FETCH (BODY[] {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mock = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedStream::new(mock);
        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn eof_is_an_io_error() {
        let mock = Builder::new().read(b"* OK partial").build();
        let mut framed = FramedStream::new(mock);
        assert!(matches!(framed.read_response().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn writes_command_bytes() {
        let mock = Builder::new().write(b"A001 NOOP\r\n").build();
        let mut framed = FramedStream::new(mock);
        framed.write_command(b"A001 NOOP\r\n").await.unwrap();
    }
}
