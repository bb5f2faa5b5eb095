/// The material produced by signing the fixed `authorizeConnection` payload:
/// an empty-body POST to `/` against canonical host `dax.amazonaws.com`,
/// service `dax`, content-type `application/x-amz-cbor-1.1`. Producing this
/// material — SigV4 canonicalisation, credential sourcing — is entirely the
/// signer's concern; this crate only carries the result onto the wire.
#[derive(Debug, Clone)]
pub struct SignedAuth {
    pub access_key: String,
    /// Hex-encoded signature.
    pub signature: String,
    pub string_to_sign: Vec<u8>,
    /// Present only for temporary/STS-issued credentials.
    pub token: Option<String>,
}

/// External collaborator that produces the signed material for the
/// `authorizeConnection` frame (e.g. AWS Signature V4). Supplied by the
/// caller; this crate has no opinion on credential sourcing.
///
/// Modeled `Send`-bound via `trait-variant`, the same way an async trait
/// boundary crossing a `tokio::spawn` needs to be `Send` without forcing
/// every implementation to write the bound out by hand.
#[trait_variant::make(Signer: Send)]
pub trait LocalSigner {
    async fn sign(&self) -> Result<SignedAuth, crate::error::Error>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{LocalSigner, SignedAuth};

    #[derive(Clone)]
    pub struct NullSigner;

    impl LocalSigner for NullSigner {
        async fn sign(&self) -> Result<SignedAuth, crate::error::Error> {
            Ok(SignedAuth {
                access_key: "AKIATEST".to_string(),
                signature: "00".to_string(),
                string_to_sign: b"test".to_vec(),
                token: None,
            })
        }
    }
}
