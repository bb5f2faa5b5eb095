use thiserror::Error;

/// Failures that can occur translating between the wire-level CBE stream and
/// the protocol's typed request/reply/attribute domain.
///
/// These are *validation* failures: they never touch a connection and carry
/// no side effect, unlike the connection/transport failures that live in
/// `dax-network`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed CBE payload: {0}")]
    Codec(#[from] dax_codec::Error),

    #[error("attribute value map has no recognized discriminator key")]
    UnrecognizedAttribute,

    #[error("request is missing required key {0:?}")]
    MissingKey(String),

    #[error("request contains key {0:?} that is not valid for this operation")]
    ExtraKey(String),

    #[error("reply is missing required field {0:?}")]
    MissingRequiredField(&'static str),

    #[error("unrecognized method id {0}")]
    UnknownMethod(u64),

    #[error("reply carried a server-side error: status {status}: {message}")]
    ServerError {
        status: u64,
        message: String,
        request_id: Option<String>,
    },
}
