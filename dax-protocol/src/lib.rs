//! DAX wire protocol: the method ids and tag numbers of the protocol
//! ([`wire`]), the bridge between DynamoDB attribute values and the raw CBE
//! value domain ([`attribute`]), table key-schema validation
//! ([`key_schema`]), and request/reply framing ([`request`]).

pub mod attribute;
pub mod error;
pub mod key_schema;
pub mod request;
pub mod wire;

pub use attribute::AttributeValue;
pub use error::Error;
pub use key_schema::{KeyElement, KeySchema};
pub use request::{Reply, Request};
pub use wire::Operation;
