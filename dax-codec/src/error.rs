use thiserror::Error;

/// Failure modes for decoding a compact binary encoding (CBE) stream.
///
/// Encoding is total for the [`Value`](crate::Value) domain and never fails;
/// only `decode` can fail, on a truncated stream, a reserved prefix byte, a
/// non-UTF-8 text string, or an indefinite-length container (CBE never
/// produces these, so receiving one from a peer is a protocol violation).
#[derive(Debug, Error)]
pub enum Error {
    /// The buffer ends before a complete value could be decoded. Callers
    /// reading from a socket should treat this as "read more and retry", not
    /// as a malformed stream.
    #[error("CBE value is incomplete")]
    Incomplete,

    #[error("malformed CBE encoding: {0}")]
    MalformedEncoding(String),
}

impl Error {
    pub(crate) fn from_minicbor_decode(err: minicbor::decode::Error) -> Self {
        if err.is_end_of_input() {
            Error::Incomplete
        } else {
            Error::MalformedEncoding(err.to_string())
        }
    }

    /// True if decoding failed only because the buffer was too short, i.e.
    /// more bytes from the peer would let a retry succeed.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Error::Incomplete)
    }
}
