//! Connection lifecycle, pooling and server-assisted metadata caches for
//! talking to a DAX cluster: the handshake and re-authentication protocol
//! ([`handshake`]), a single connection ([`connection`]), a round-robin
//! pool of them ([`pool`]), and the key-schema/attribute-list metadata
//! caches ([`cache`]).

pub mod bearer;
pub mod cache;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod handshake;
pub mod pool;
pub mod signer;

pub use cache::{AttributeListCache, KeySchemaCache};
pub use connection::Connection;
pub use endpoint::{Endpoint, EndpointList};
pub use error::Error;
pub use pool::{Pool, PooledConnection};
pub use signer::Signer;
