use thiserror::Error;

use crate::endpoint::Endpoint;

#[derive(Debug, Error)]
pub enum Error {
    /// TCP/TLS connect was actively refused by the peer.
    #[error("connection refused")]
    ConnectionRefused,

    /// A read or write failed mid-stream on an already-established
    /// connection.
    #[error("connection lost: {0}")]
    ConnectionLost(#[source] std::io::Error),

    #[error("CBE codec error: {0}")]
    Codec(#[from] dax_codec::Error),

    #[error("protocol framing error: {0}")]
    Protocol(#[from] dax_protocol::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("peer closed the connection")]
    ConnectionClosed,

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("I/O operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("no endpoints are configured")]
    NoEndpoints,

    #[error("connection pool for {0} is at capacity")]
    PoolExhausted(Endpoint),

    #[error("connection pool is closed")]
    PoolClosed,

    #[error("endpoint url is invalid: {0}")]
    InvalidEndpoint(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::ConnectionRefused {
            Error::ConnectionRefused
        } else {
            Error::ConnectionLost(err)
        }
    }
}
