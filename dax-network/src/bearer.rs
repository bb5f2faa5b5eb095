use std::sync::Arc;

use dax_codec::Value;
use rustls_pki_types::ServerName;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::trace;

use crate::error::Error;

const BUFFER_LEN: usize = 1024 * 10;

/// The underlying byte transport to a cluster node: plain TCP for `dax://`,
/// TLS over TCP for `daxs://`.
pub enum Bearer {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl Bearer {
    pub async fn connect_plain(addr: &str) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Bearer::Plain(stream))
    }

    pub async fn connect_tls(
        addr: &str,
        host: &str,
        connector: &tokio_rustls::TlsConnector,
    ) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr).await?;
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| Error::Tls(format!("invalid server name {host:?}")))?;
        let tls = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;
        Ok(Bearer::Tls(Box::new(tls)))
    }

    pub async fn readable(&self) -> std::io::Result<()> {
        match self {
            Bearer::Plain(s) => s.readable().await,
            Bearer::Tls(s) => s.get_ref().0.readable().await,
        }
    }

    fn try_read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        use std::io::Read;
        match self {
            Bearer::Plain(s) => s.try_read(buf),
            // rustls buffers application data behind its own record layer;
            // a readable-but-would-block TCP socket can still have decrypted
            // bytes sitting in the TLS stream, so we read through a
            // synchronous `Read` rather than `try_read`.
            Bearer::Tls(s) => s.get_mut().1.reader().read(buf).or_else(|e| {
                if e.kind() == std::io::ErrorKind::WouldBlock {
                    Ok(0)
                } else {
                    Err(e)
                }
            }),
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Bearer::Plain(s) => s.write_all(buf).await,
            Bearer::Tls(s) => s.write_all(buf).await,
        }
    }

    async fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Bearer::Plain(s) => s.flush().await,
            Bearer::Tls(s) => s.flush().await,
        }
    }
}

/// Builds a `rustls` `ClientConfig` trusting the platform's native roots,
/// optionally skipping hostname verification for `skip_hostname_verification`.
pub fn tls_connector(skip_hostname_verification: bool) -> Result<tokio_rustls::TlsConnector, Error> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(
        rustls_native_certs::load_native_certs()
            .certs
            .into_iter(),
    );

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let config = if skip_hostname_verification {
        let mut config = config;
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(AcceptAnyServerName));
        config
    } else {
        config
    };

    Ok(tokio_rustls::TlsConnector::from(Arc::new(config)))
}

#[derive(Debug)]
struct AcceptAnyServerName;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyServerName {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls_pki_types::CertificateDer<'_>,
        _intermediates: &[rustls_pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls_pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls_pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls_pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Accumulates bytes read from a [`Bearer`] and decodes one self-delimiting
/// CBE value at a time.
///
/// Unlike the segment-bearer framing this technique is adapted from, DAX's
/// wire format has no length-prefixed frame header: the buffer simply grows
/// until `dax_codec::decode` stops reporting
/// [`dax_codec::Error::is_incomplete`] and succeeds.
pub struct FrameBuffer(Bearer, Vec<u8>);

impl FrameBuffer {
    pub fn new(bearer: Bearer) -> Self {
        Self(bearer, Vec::with_capacity(BUFFER_LEN))
    }

    /// Cancel-safe: reads at least one chunk of bytes into the internal
    /// buffer, blocking only on readiness, never on a fixed byte count.
    async fn fill(&mut self) -> Result<(), Error> {
        loop {
            self.0.readable().await?;
            trace!("bearer is readable");

            let mut chunk = vec![0u8; BUFFER_LEN];

            match self.0.try_read(&mut chunk) {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(n) => {
                    trace!(n, "read bytes from bearer");
                    self.1.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(Error::from(e)),
            }
        }
    }

    /// Reads and decodes the next CBE value, reading more bytes from the
    /// bearer as needed.
    pub async fn read_value(&mut self) -> Result<Value, Error> {
        loop {
            match dax_codec::decode(&self.1) {
                Ok((value, remaining)) => {
                    let consumed = self.1.len() - remaining.len();
                    self.1.drain(..consumed);
                    return Ok(value);
                }
                Err(e) if e.is_incomplete() => self.fill().await?,
                Err(e) => return Err(Error::Codec(e)),
            }
        }
    }

    pub async fn write_value(&mut self, value: &Value) -> Result<(), Error> {
        self.write_bytes(&dax_codec::encode(value)).await
    }

    pub async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.0.write_all(bytes).await?;
        self.0.flush().await?;
        Ok(())
    }
}
