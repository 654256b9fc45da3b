use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// TCP address shared by the bridge listener and its connectors.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or IP literal.
    pub host: String,
    /// TCP port. Zero asks the operating system for an ephemeral port.
    pub port: u16,
}

impl Endpoint {
    /// Builds a TCP endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Resolves the endpoint to the first IPv4 or IPv6 socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when name resolution fails or yields nothing.
    pub fn resolve(&self) -> Result<SocketAddr, ResolveError> {
        let mut addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| ResolveError::Lookup {
                endpoint: self.to_string(),
                source,
            })?;
        addrs.next().ok_or_else(|| ResolveError::Empty {
                endpoint: self.to_string(),
            })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "tcp://{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        if url.scheme() != "tcp" {
            return Err(EndpointParseError::UnsupportedScheme(
                url.scheme().to_owned(),
            ));
        }
        let host = url
            .host_str()
            .ok_or_else(|| EndpointParseError::MissingHost(input.to_owned()))?;
        let port = url
            .port()
            .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
        Ok(Self::new(host, port))
    }
}

/// Errors encountered while parsing an [`Endpoint`] from text.
#[derive(Debug, Error)]
pub enum EndpointParseError {
    /// Scheme was not `tcp`.
    #[error("unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// TCP port was missing from the address.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised while resolving an [`Endpoint`] to a socket address.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The resolver reported a failure.
    #[error("failed to resolve {endpoint}: {source}")]
    Lookup {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// The resolver succeeded but produced no usable address.
    #[error("no addresses resolved for {endpoint}")]
    Empty { endpoint: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_tcp_endpoint() {
        let endpoint = Endpoint::new("127.0.0.1", 9877);
        assert_eq!(endpoint.to_string(), "tcp://127.0.0.1:9877");
    }

    #[test]
    fn parse_tcp_endpoint() {
        let endpoint: Endpoint = "tcp://localhost:9000".parse().expect("parse endpoint");
        assert_eq!(endpoint, Endpoint::new("localhost", 9000));
    }

    #[test]
    fn rejects_other_schemes() {
        let error = "unix:///tmp/live.sock"
            .parse::<Endpoint>()
            .expect_err("unix scheme should be rejected");
        assert!(matches!(error, EndpointParseError::UnsupportedScheme(_)));
    }

    #[test]
    fn rejects_missing_port() {
        let error = "tcp://localhost"
            .parse::<Endpoint>()
            .expect_err("missing port should be rejected");
        assert!(matches!(error, EndpointParseError::MissingPort(_)));
    }

    #[test]
    fn resolves_loopback() {
        let addr = Endpoint::new("127.0.0.1", 4000)
            .resolve()
            .expect("loopback should resolve");
        assert_eq!(addr.port(), 4000);
        assert!(addr.ip().is_loopback());
    }
}
