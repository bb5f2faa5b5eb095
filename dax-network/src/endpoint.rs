use std::fmt;

use crate::error::Error;

/// One cluster node, as named in a `dax://`/`daxs://` endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

/// Default port for plaintext `dax://` endpoints that omit one.
pub const DEFAULT_PLAIN_PORT: u16 = 8111;
/// Default port for TLS `daxs://` endpoints that omit one.
pub const DEFAULT_TLS_PORT: u16 = 9111;

impl Endpoint {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls { "daxs" } else { "dax" };
        write!(f, "{scheme}://{}:{}", self.host, self.port)
    }
}

/// A parsed, ordered list of cluster endpoints, as configured by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointList(Vec<Endpoint>);

impl EndpointList {
    pub fn as_slice(&self) -> &[Endpoint] {
        &self.0
    }

    /// Parses a `dax://host:port,host2:port2` or `daxs://...` URL, where the
    /// scheme determines TLS for every endpoint in the comma-separated list.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| Error::InvalidEndpoint(url.to_string()))?;

        let tls = match scheme {
            "dax" => false,
            "daxs" => true,
            other => {
                return Err(Error::InvalidEndpoint(format!(
                    "unsupported scheme {other:?}, expected dax or daxs"
                )))
            }
        };

        let endpoints = rest
            .split(',')
            .map(|part| parse_host_port(part, tls))
            .collect::<Result<Vec<_>, _>>()?;

        if endpoints.is_empty() {
            return Err(Error::InvalidEndpoint(url.to_string()));
        }

        Ok(EndpointList(endpoints))
    }
}

fn parse_host_port(part: &str, tls: bool) -> Result<Endpoint, Error> {
    let default_port = if tls {
        DEFAULT_TLS_PORT
    } else {
        DEFAULT_PLAIN_PORT
    };

    let (host, port) = match part.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            let port: u16 = port
                .parse()
                .map_err(|_| Error::InvalidEndpoint(part.to_string()))?;
            (host, port)
        }
        Some((_, _)) => return Err(Error::InvalidEndpoint(part.to_string())),
        None => (part, default_port),
    };

    if host.is_empty() {
        return Err(Error::InvalidEndpoint(part.to_string()));
    }

    Ok(Endpoint {
        host: host.to_string(),
        port,
        tls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_plaintext_endpoint() {
        let list = EndpointList::parse("dax://node-1.example.com:8111").unwrap();
        assert_eq!(list.as_slice().len(), 1);
        assert!(!list.as_slice()[0].tls);
        assert_eq!(list.as_slice()[0].port, 8111);
    }

    #[test]
    fn parses_multiple_tls_endpoints() {
        let list = EndpointList::parse("daxs://a:1,b:2,c:3").unwrap();
        assert_eq!(list.as_slice().len(), 3);
        assert!(list.as_slice().iter().all(|e| e.tls));
        assert_eq!(list.as_slice()[1].host, "b");
    }

    #[test]
    fn rejects_an_unknown_scheme() {
        assert!(EndpointList::parse("http://a:1").is_err());
    }

    #[test]
    fn a_missing_port_defaults_by_scheme() {
        let plain = EndpointList::parse("dax://a").unwrap();
        assert_eq!(plain.as_slice()[0].port, 8111);

        let tls = EndpointList::parse("daxs://a").unwrap();
        assert_eq!(tls.as_slice()[0].port, 9111);
    }

    #[test]
    fn rejects_an_empty_host() {
        assert!(EndpointList::parse("dax://:8111").is_err());
    }
}
