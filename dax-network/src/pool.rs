use std::collections::{HashMap, VecDeque};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::connection::Connection;
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::signer::Signer;

/// How long a marked-bad endpoint is skipped by round-robin selection before
/// it becomes eligible for reprobing.
const BAD_ENDPOINT_COOLDOWN: Duration = Duration::from_secs(30);

struct HostState {
    idle: VecDeque<Connection>,
    total: usize,
}

impl Default for HostState {
    fn default() -> Self {
        HostState {
            idle: VecDeque::new(),
            total: 0,
        }
    }
}

struct Inner<S> {
    endpoints: Vec<Endpoint>,
    cursor: AtomicUsize,
    hosts: Mutex<HashMap<Endpoint, HostState>>,
    bad_until: Mutex<HashMap<Endpoint, Instant>>,
    max_pending_connections_per_host: usize,
    reauth_interval: Duration,
    connect_timeout: Duration,
    request_timeout: Duration,
    idle_timeout: Duration,
    user_agent: String,
    signer: S,
    tls_connector: Option<tokio_rustls::TlsConnector>,
    closed: AtomicBool,
}

/// A round-robin pool of connections, capped at
/// `max_pending_connections_per_host` connections per endpoint, with a
/// 30-second cooldown for endpoints marked bad.
pub struct Pool<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for Pool<S> {
    fn clone(&self) -> Self {
        Pool {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Signer + Clone + Send + Sync + 'static> Pool<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        endpoints: Vec<Endpoint>,
        max_pending_connections_per_host: usize,
        reauth_interval: Duration,
        connect_timeout: Duration,
        request_timeout: Duration,
        idle_timeout: Duration,
        user_agent: String,
        signer: S,
        tls_connector: Option<tokio_rustls::TlsConnector>,
    ) -> Self {
        Pool {
            inner: Arc::new(Inner {
                endpoints,
                cursor: AtomicUsize::new(0),
                hosts: Mutex::new(HashMap::new()),
                bad_until: Mutex::new(HashMap::new()),
                max_pending_connections_per_host,
                reauth_interval,
                connect_timeout,
                request_timeout,
                idle_timeout,
                user_agent,
                signer,
                tls_connector,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Marks `endpoint` as bad for [`BAD_ENDPOINT_COOLDOWN`]; round-robin
    /// selection skips it until the cooldown elapses.
    pub fn mark_bad(&self, endpoint: &Endpoint) {
        let mut bad = self.inner.bad_until.lock().unwrap();
        bad.insert(endpoint.clone(), Instant::now() + BAD_ENDPOINT_COOLDOWN);
        warn!(%endpoint, "marked endpoint bad for 30s");
    }

    fn is_healthy(&self, endpoint: &Endpoint) -> bool {
        let bad = self.inner.bad_until.lock().unwrap();
        match bad.get(endpoint) {
            Some(until) => Instant::now() >= *until,
            None => true,
        }
    }

    /// Closes the pool: every idle connection is dropped and future
    /// `checkout` calls fail with [`Error::PoolClosed`]. In-flight
    /// [`PooledConnection`]s already checked out are left alone; dropping
    /// them after close simply discards them instead of returning them to
    /// an (emptied) idle set.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.hosts.lock().unwrap().clear();
        debug!("connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Checks out a connection, trying each endpoint in round-robin order
    /// (skipping endpoints on cooldown) until one yields a connection or all
    /// have been tried.
    pub async fn checkout(&self) -> Result<PooledConnection<S>, Error> {
        if self.is_closed() {
            return Err(Error::PoolClosed);
        }

        let endpoint_count = self.inner.endpoints.len();
        if endpoint_count == 0 {
            return Err(Error::NoEndpoints);
        }

        // Tracks the last `PoolExhausted` seen so that endpoint exhaustion
        // (the only failure §4.5 names besides `NoEndpoints`/`PoolClosed`)
        // is what the caller sees, rather than a synthesized "no healthy
        // endpoint" variant outside the spec's error taxonomy.
        let mut last_exhausted = None;

        for _ in 0..endpoint_count {
            let index = self.inner.cursor.fetch_add(1, Ordering::Relaxed) % endpoint_count;
            let endpoint = &self.inner.endpoints[index];

            if !self.is_healthy(endpoint) {
                last_exhausted = Some(endpoint.clone());
                continue;
            }

            match self.checkout_from(endpoint).await {
                Ok(conn) => return Ok(conn),
                Err(Error::PoolExhausted(e)) => {
                    last_exhausted = Some(e);
                    continue;
                }
                Err(e) => {
                    self.mark_bad(endpoint);
                    return Err(e);
                }
            }
        }

        Err(Error::PoolExhausted(last_exhausted.unwrap_or_else(|| {
            self.inner.endpoints[self.inner.cursor.load(Ordering::Relaxed) % endpoint_count].clone()
        })))
    }

    async fn checkout_from(&self, endpoint: &Endpoint) -> Result<PooledConnection<S>, Error> {
        let existing = {
            let mut hosts = self.inner.hosts.lock().unwrap();
            let state = hosts.entry(endpoint.clone()).or_default();
            match state.idle.pop_front() {
                // An idle connection that has sat past `idle_timeout` is
                // dropped here, not reused; its slot in `total` must be
                // freed the same way `PooledConnection::discard` frees it,
                // or the per-host cap leaks a permanent slot every time an
                // idle connection is replaced.
                Some(conn) if conn.is_idle() => {
                    state.total = state.total.saturating_sub(1);
                    None
                }
                other => other,
            }
        };

        let mut conn = match existing {
            Some(conn) => conn,
            None => {
                {
                    let mut hosts = self.inner.hosts.lock().unwrap();
                    let state = hosts.entry(endpoint.clone()).or_default();
                    if state.total >= self.inner.max_pending_connections_per_host {
                        return Err(Error::PoolExhausted(endpoint.clone()));
                    }
                    state.total += 1;
                }

                match Connection::open(
                    endpoint,
                    &self.inner.user_agent,
                    &self.inner.signer,
                    self.inner.tls_connector.as_ref(),
                    self.inner.connect_timeout,
                    self.inner.request_timeout,
                    self.inner.idle_timeout,
                )
                .await
                {
                    Ok(conn) => conn,
                    Err(e) => {
                        let mut hosts = self.inner.hosts.lock().unwrap();
                        hosts.entry(endpoint.clone()).or_default().total -= 1;
                        return Err(e);
                    }
                }
            }
        };

        conn.reauthenticate_if_due(self.inner.reauth_interval, &self.inner.signer)
            .await?;

        debug!(%endpoint, "checked out connection");

        Ok(PooledConnection {
            pool: self.clone(),
            conn: Some(conn),
        })
    }
}

/// An RAII guard over a checked-out [`Connection`]. Dropping it returns the
/// connection to its endpoint's idle set; call [`PooledConnection::discard`]
/// instead when the connection is known to be broken.
pub struct PooledConnection<S> {
    pool: Pool<S>,
    conn: Option<Connection>,
}

impl<S: Signer + Clone + Send + Sync + 'static> PooledConnection<S> {
    /// Closes the connection instead of returning it to the pool, and frees
    /// its slot in the per-host capacity count.
    pub fn discard(mut self) {
        let endpoint = self.conn.as_ref().map(|c| c.endpoint().clone());
        self.conn = None;

        if let Some(endpoint) = endpoint {
            let mut hosts = self.pool.inner.hosts.lock().unwrap();
            if let Some(state) = hosts.get_mut(&endpoint) {
                state.total = state.total.saturating_sub(1);
            }
        }
    }
}

impl<S> Deref for PooledConnection<S> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection taken before drop")
    }
}

impl<S> DerefMut for PooledConnection<S> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection taken before drop")
    }
}

impl<S> Drop for PooledConnection<S> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.pool.is_closed() {
                return;
            }
            let mut hosts = self.pool.inner.hosts.lock().unwrap();
            hosts
                .entry(conn.endpoint().clone())
                .or_default()
                .idle
                .push_back(conn);
        }
    }
}
