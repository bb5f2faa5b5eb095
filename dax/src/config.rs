use std::time::Duration;

use dax_network::EndpointList;

/// Client configuration. `user_agent` is the one field added beyond the
/// wire-facing configuration keys — the opening handshake needs a concrete
/// string to announce, and nothing else in this configuration set supplies
/// one. `credentials` is not a field here: it is the `S: Signer`
/// implementation the caller passes to `Client::new`, not configuration
/// data this struct holds.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints: EndpointList,
    /// The AWS region the cluster lives in. Carried here for completeness
    /// with §6's closed configuration-key set; the signer itself (not this
    /// crate) is what actually scopes a SigV4 signature to a region, since
    /// `credentials` is supplied as the external `Signer` implementation
    /// rather than as a field on `Config`.
    pub region: String,
    pub max_pending_connections_per_host: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub idle_timeout: Duration,
    /// Re-authentication interval; the wire re-sends `authorizeConnection`
    /// once `now - last_auth_time` reaches this value. 300 s, per the
    /// re-auth cadence of the source the signature scheme is drawn from.
    pub reauth_interval: Duration,
    pub key_schema_cache_ttl: Duration,
    pub key_schema_cache_capacity: usize,
    pub attribute_list_cache_capacity: usize,
    pub skip_hostname_verification: bool,
    /// Stored and validated but not enforced: DAX connections never
    /// pipeline more than one in-flight request, so this exists purely for
    /// forward compatibility with a future multiplexed transport.
    pub max_concurrent_requests_per_connection: usize,
    /// Raises `tracing`'s connection/pool instrumentation to `debug` even
    /// when the host application's subscriber is configured more quietly;
    /// does not change what is logged, only the level it's logged at.
    pub debug_logging: bool,
    pub user_agent: String,
}

impl Config {
    pub fn new(endpoints: EndpointList) -> Self {
        Config {
            endpoints,
            ..Config::default_without_endpoints()
        }
    }

    fn default_without_endpoints() -> Self {
        Config {
            endpoints: EndpointList::parse("dax://localhost:8111")
                .expect("the placeholder default endpoint always parses"),
            region: "us-east-1".to_string(),
            max_pending_connections_per_host: 10,
            connect_timeout: Duration::from_millis(1000),
            request_timeout: Duration::from_millis(60_000),
            idle_timeout: Duration::from_millis(30_000),
            reauth_interval: Duration::from_secs(300),
            key_schema_cache_ttl: Duration::from_millis(60_000),
            key_schema_cache_capacity: 1000,
            attribute_list_cache_capacity: 1000,
            skip_hostname_verification: false,
            max_concurrent_requests_per_connection: 1000,
            debug_logging: false,
            user_agent: format!("dax-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_overrides_only_the_endpoint_list() {
        let endpoints = EndpointList::parse("dax://node-a:8111,node-b:8111").unwrap();
        let config = Config::new(endpoints.clone());
        assert_eq!(config.endpoints, endpoints);
        assert_eq!(config.max_pending_connections_per_host, 10);
    }

    #[test]
    fn defaults_match_the_closed_configuration_key_set() {
        let config = Config::default_without_endpoints();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.connect_timeout, Duration::from_millis(1000));
        assert_eq!(config.request_timeout, Duration::from_millis(60_000));
        assert_eq!(config.idle_timeout, Duration::from_millis(30_000));
        assert_eq!(config.reauth_interval, Duration::from_secs(300));
        assert_eq!(config.key_schema_cache_ttl, Duration::from_millis(60_000));
        assert_eq!(config.max_concurrent_requests_per_connection, 1000);
        assert!(!config.debug_logging);
    }
}
