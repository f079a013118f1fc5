//! Outbound HTTP transport for the push publisher
//!
//! Every send opens a fresh TCP connection, writes one `POST` with
//! `Connection: close` and shuts the socket down once the bytes are flushed.
//! The server's response is never read.

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid server address '{0}'")]
    InvalidAddress(String),

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write request: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Delivers one JSON document to the configured server.
#[async_trait]
pub trait Transport: Send {
    async fn post_json(&mut self, body: &str) -> Result<(), TransportError>;
}

pub struct HttpPostTransport {
    server: String,
    path: String,
}

impl HttpPostTransport {
    /// `server` is an `ip:port` string. It is parsed on every send, so a bad
    /// value only fails the sends, never construction.
    pub fn new(server: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            path: path.into(),
        }
    }

    fn server_addr(&self) -> Result<SocketAddr, TransportError> {
        self.server
            .parse()
            .map_err(|_| TransportError::InvalidAddress(self.server.clone()))
    }
}

#[async_trait]
impl Transport for HttpPostTransport {
    async fn post_json(&mut self, body: &str) -> Result<(), TransportError> {
        let addr = self.server_addr()?;
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|source| TransportError::Connect { addr, source })?;

        let request = post_request(&self.path, addr, body);
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(TransportError::Write)?;
        stream.flush().await.map_err(TransportError::Write)?;
        stream.shutdown().await.map_err(TransportError::Write)?;

        debug!("Posted {} bytes to {}{}", body.len(), addr, self.path);
        Ok(())
    }
}

fn post_request(path: &str, addr: SocketAddr, body: &str) -> String {
    format!(
        "POST {path} HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    )
}
