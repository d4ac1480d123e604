//! Routable backend servers.
//!
//! # Responsibilities
//! - Represent configured/API-created backends
//! - Resolve the default server, servers by name and by host
//! - Build per-server HTTPS clients for backends with their own TLS identity
//!
//! # Design Decisions
//! - `transport` is `None` for backends served by the process default client;
//!   a dedicated client exists only when the config carries TLS material
//! - Name lookups are case-insensitive; names are unique across the store

use std::fmt;

use bytes::Bytes;
use http_body_util::Full;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyServerConf;
use crate::net::tls::{self, TlsError};

/// HTTP client capable of plain and TLS upstream connections.
pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Conversion failures from raw server configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to parse proxy server address `{address}`: {source}")]
    BadAddress {
        address: String,
        source: url::ParseError,
    },
    #[error("failed to build transport for server `{name}`: {source}")]
    Transport { name: String, source: TlsError },
}

/// A backend the proxy can route to.
#[derive(Clone)]
pub struct ProxyServer {
    pub id: i64,
    pub name: String,
    pub address: Url,
    pub is_default: bool,
    pub read_only: bool,
    /// Dedicated client for this backend's TLS identity, if any.
    pub transport: Option<HttpsClient>,
}

impl fmt::Debug for ProxyServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyServer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address.as_str())
            .field("is_default", &self.is_default)
            .field("read_only", &self.read_only)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

impl ProxyServer {
    /// Host (and explicit port, if any) requests to this backend carry.
    ///
    /// Also the key the transport switch resolves dedicated clients by, so
    /// outbound URIs and lookups always agree.
    pub fn authority(&self) -> String {
        let host = self.address.host_str().unwrap_or_default();
        match self.address.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    pub fn scheme(&self) -> &str {
        self.address.scheme()
    }
}

/// Convert raw server configuration into domain servers.
///
/// Config-seeded servers receive ids 1..N in config order: they seed the
/// immutable partition of the server store.
pub fn convert_servers(confs: &[ProxyServerConf]) -> Result<Vec<ProxyServer>, ServerError> {
    let mut result = Vec::with_capacity(confs.len());
    for (i, conf) in confs.iter().enumerate() {
        let mut server = convert_server(conf)?;
        server.id = i as i64 + 1;
        result.push(server);
    }
    Ok(result)
}

fn convert_server(conf: &ProxyServerConf) -> Result<ProxyServer, ServerError> {
    let address = Url::parse(&conf.address).map_err(|source| ServerError::BadAddress {
        address: conf.address.clone(),
        source,
    })?;

    let transport = match &conf.tls {
        Some(tls_conf) if !tls_conf.use_system_transport && !tls_conf.cert_file.is_empty() => {
            let config =
                tls::client_config_from_files(tls_conf).map_err(|source| ServerError::Transport {
                    name: conf.name.clone(),
                    source,
                })?;
            Some(tls::https_client(config))
        }
        _ => None,
    };

    Ok(ProxyServer {
        id: 0,
        name: conf.name.clone(),
        address,
        is_default: conf.is_default,
        read_only: conf.read_only.unwrap_or(true),
        transport,
    })
}

/// An owned snapshot of servers with the lookups the pipeline needs.
#[derive(Debug, Clone, Default)]
pub struct ProxyServers(Vec<ProxyServer>);

impl ProxyServers {
    pub fn new(servers: Vec<ProxyServer>) -> Self {
        Self(servers)
    }

    /// The fallback route for unmatched/unparseable traffic.
    pub fn default_server(&self) -> Option<&ProxyServer> {
        self.0.iter().find(|s| s.is_default)
    }

    pub fn find(&self, name: &str) -> Option<&ProxyServer> {
        self.0.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn find_by_host(&self, authority: &str) -> Option<&ProxyServer> {
        self.0.iter().find(|s| s.authority() == authority)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProxyServer> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ProxyServer> {
        self.0
    }
}
