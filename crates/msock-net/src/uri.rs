use std::io;

use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UriError {
    #[error("invalid URI: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("tcp:// URI is missing a host")]
    MissingHost(),

    #[error("tcp:// URI is missing a port")]
    MissingPort(),

    #[error("unix:// URI is missing a path")]
    MissingPath(),

    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

/// A parsed `tcp://host:port` or `unix://path` endpoint, mirroring the
/// scheme dispatch the source performed with `urllib.parse.urlparse(uri,
/// 'tcp')` (scheme defaults to `tcp` when none is given).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix { path: String },
}

impl Endpoint {
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let normalized = if uri.contains("://") { uri.to_string() } else { format!("tcp://{uri}") };
        let url = Url::parse(&normalized)?;

        match url.scheme() {
            "tcp" => {
                let host = url.host_str().ok_or_else(UriError::MissingHost)?.to_string();
                let port = url.port().ok_or_else(UriError::MissingPort)?;
                Ok(Self::Tcp { host, port })
            }
            "unix" => {
                let path = url.path();
                if path.is_empty() {
                    return Err(UriError::MissingPath());
                }
                Ok(Self::Unix { path: path.to_string() })
            }
            other => Err(UriError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_uri() {
        let endpoint = Endpoint::parse("tcp://localhost:4500").unwrap();
        assert_eq!(endpoint, Endpoint::Tcp { host: "localhost".to_string(), port: 4500 });
    }

    #[test]
    fn defaults_to_tcp_scheme_when_none_given() {
        let endpoint = Endpoint::parse("localhost:4500").unwrap();
        assert_eq!(endpoint, Endpoint::Tcp { host: "localhost".to_string(), port: 4500 });
    }

    #[test]
    fn parses_unix_uri_with_full_path() {
        let endpoint = Endpoint::parse("unix:///var/run/msock/example.sock").unwrap();
        assert_eq!(endpoint, Endpoint::Unix { path: "/var/run/msock/example.sock".to_string() });
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let err = Endpoint::parse("http://localhost:80").unwrap_err();
        assert!(matches!(err, UriError::UnsupportedScheme(s) if s == "http"));
    }

    #[test]
    fn rejects_tcp_uri_without_port() {
        let err = Endpoint::parse("tcp://localhost").unwrap_err();
        assert!(matches!(err, UriError::MissingPort()));
    }
}
