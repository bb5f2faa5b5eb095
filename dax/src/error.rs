use thiserror::Error;

/// Top-level error surfaced by every [`crate::Client`] operation.
#[derive(Debug, Error)]
pub enum Error {
    /// A request was rejected before touching a connection: a missing or
    /// unexpected parameter key. Carries no connection side effect.
    #[error("request validation failed: {0}")]
    Validation(#[from] dax_protocol::Error),

    /// The request reached a cluster node but failed — a transport error,
    /// a failed handshake, or a server-reported error reply.
    #[error("request failed: {0}")]
    RequestFailed(#[source] dax_network::Error),

    #[error("invalid endpoint configuration: {0}")]
    InvalidEndpoint(String),

    /// The client has been closed; no further requests are accepted.
    #[error("client is closed")]
    Closed,
}

impl From<dax_network::Error> for Error {
    fn from(err: dax_network::Error) -> Self {
        match err {
            dax_network::Error::PoolClosed => Error::Closed,
            other => Error::RequestFailed(other),
        }
    }
}
