use std::time::{Duration, Instant};

use dax_codec::Value;
use dax_protocol::{Reply, Request};
use tracing::debug;

use crate::bearer::{Bearer, FrameBuffer};
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::handshake;
use crate::signer::Signer;

/// One authenticated, single-request-at-a-time connection to a cluster
/// node. DAX never pipelines within a connection, so `send_request` takes
/// `&mut self`: a caller needing concurrency checks out more than one
/// connection from the pool instead.
pub struct Connection {
    frame: FrameBuffer,
    endpoint: Endpoint,
    user_agent: String,
    created_at: Instant,
    last_used: Instant,
    last_authenticated: Instant,
    request_timeout: Duration,
    idle_timeout: Duration,
}

impl Connection {
    #[allow(clippy::too_many_arguments)]
    pub async fn open(
        endpoint: &Endpoint,
        user_agent: &str,
        signer: &impl Signer,
        tls_connector: Option<&tokio_rustls::TlsConnector>,
        connect_timeout: Duration,
        request_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, Error> {
        let connect = async {
            if endpoint.tls {
                let connector = tls_connector.ok_or_else(|| {
                    Error::Tls("daxs:// endpoint with no TLS connector configured".into())
                })?;
                Bearer::connect_tls(&endpoint.socket_addr(), &endpoint.host, connector).await
            } else {
                Bearer::connect_plain(&endpoint.socket_addr()).await
            }
        };

        let bearer = tokio::time::timeout(connect_timeout, connect)
            .await
            .map_err(|_| Error::Timeout(connect_timeout))??;

        let mut frame = FrameBuffer::new(bearer);

        tokio::time::timeout(
            request_timeout,
            handshake::perform(&mut frame, endpoint, user_agent, signer),
        )
        .await
        .map_err(|_| Error::Timeout(request_timeout))??;

        let now = Instant::now();
        debug!(%endpoint, "connection established");

        Ok(Connection {
            frame,
            endpoint: endpoint.clone(),
            user_agent: user_agent.to_string(),
            created_at: now,
            last_used: now,
            last_authenticated: now,
            request_timeout,
            idle_timeout,
        })
    }

    /// Re-sends the `authorizeConnection` frame if `interval` has elapsed
    /// since the last successful authentication on this connection.
    pub async fn reauthenticate_if_due(
        &mut self,
        interval: Duration,
        signer: &impl Signer,
    ) -> Result<(), Error> {
        if self.last_authenticated.elapsed() >= interval {
            let user_agent = self.user_agent.clone();
            tokio::time::timeout(
                self.request_timeout,
                handshake::authorize(&mut self.frame, &user_agent, signer),
            )
            .await
            .map_err(|_| Error::Timeout(self.request_timeout))??;

            self.last_authenticated = Instant::now();
            debug!(endpoint = %self.endpoint, "re-authenticated connection");
        }

        Ok(())
    }

    pub async fn send_request(&mut self, request: &Request) -> Result<Reply, Error> {
        self.frame.write_bytes(&request.encode()).await?;

        let descriptor = tokio::time::timeout(self.request_timeout, self.frame.read_value())
            .await
            .map_err(|_| Error::Timeout(self.request_timeout))??;
        self.last_used = Instant::now();

        let reply = if Reply::descriptor_is_error(&descriptor) {
            // a non-zero status short-circuits: the body value is never
            // read off the wire for an error reply.
            Reply::from_parts(descriptor, Value::Null)?
        } else {
            let body = tokio::time::timeout(self.request_timeout, self.frame.read_value())
                .await
                .map_err(|_| Error::Timeout(self.request_timeout))??;
            self.last_used = Instant::now();
            Reply::from_parts(descriptor, body)?
        };

        Ok(reply)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn idle_for(&self) -> Duration {
        self.last_used.elapsed()
    }

    /// True once [`Connection::idle_for`] exceeds the configured
    /// `idle_timeout`.
    pub fn is_idle(&self) -> bool {
        self.idle_for() > self.idle_timeout
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("age", &self.age())
            .field("idle_for", &self.idle_for())
            .finish()
    }
}
