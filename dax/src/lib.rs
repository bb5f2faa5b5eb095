//! A thin client for a DynamoDB-accelerator (DAX) style in-region cache
//! cluster: point reads/writes, batch reads/writes, range queries and
//! full-table scans, each translated into a binary request over a
//! long-lived authenticated connection to a cluster node.
//!
//! [`Client`] is explicitly glue: the protocol engine lives in
//! [`dax_protocol`] and [`dax_network`], and this facade composes them
//! without itself carrying any protocol logic.

mod config;
mod error;
mod operations;

pub use config::Config;
pub use dax_network::Signer;
pub use dax_protocol::AttributeValue;
pub use error::Error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dax_network::{AttributeListCache, KeySchemaCache, Pool};

pub struct Client<S: Signer + Clone + Send + Sync + 'static> {
    pool: Pool<S>,
    key_schema_cache: Arc<KeySchemaCache>,
    attribute_list_cache: Arc<AttributeListCache>,
    config: Config,
    closed: Arc<AtomicBool>,
}

impl<S: Signer + Clone + Send + Sync + 'static> Client<S> {
    pub fn new(config: Config, signer: S) -> Result<Self, Error> {
        if config.debug_logging {
            tracing::debug!("debug_logging enabled for this client");
        }

        let needs_tls = config.endpoints.as_slice().iter().any(|e| e.tls);

        let tls_connector = if needs_tls {
            Some(
                dax_network::bearer::tls_connector(config.skip_hostname_verification)
                    .map_err(Error::from)?,
            )
        } else {
            None
        };

        let pool = Pool::new(
            config.endpoints.as_slice().to_vec(),
            config.max_pending_connections_per_host,
            config.reauth_interval,
            config.connect_timeout,
            config.request_timeout,
            config.idle_timeout,
            config.user_agent.clone(),
            signer,
            tls_connector,
        );

        Ok(Client {
            pool,
            key_schema_cache: Arc::new(KeySchemaCache::new(
                config.key_schema_cache_ttl,
                config.key_schema_cache_capacity,
            )),
            attribute_list_cache: Arc::new(AttributeListCache::new(
                config.attribute_list_cache_capacity,
            )),
            config,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn key_schema_cache(&self) -> &KeySchemaCache {
        &self.key_schema_cache
    }

    pub fn attribute_list_cache(&self) -> &AttributeListCache {
        &self.attribute_list_cache
    }

    pub fn mark_endpoint_bad(&self, endpoint: &dax_network::Endpoint) {
        self.pool.mark_bad(endpoint);
    }

    /// Closes the underlying connection pool. Every subsequent operation on
    /// this client (and any clone sharing its pool) fails with
    /// [`Error::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.pool.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
