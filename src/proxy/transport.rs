//! Per-destination transport selection.
//!
//! # Responsibilities
//! - Resolve which backend owns a destination host
//! - Hand the round-trip to that backend's dedicated TLS client, or to the
//!   process default client
//!
//! # Design Decisions
//! - Needed when one backend demands certificate authentication while
//!   another is a plain HTTPS (or HTTP) server: a single proxy process
//!   fronts both with heterogeneous trust requirements
//! - Clients are cheap to clone (shared pools underneath), so the switch
//!   hands out owned handles

use std::sync::Arc;

use crate::domain::server::HttpsClient;
use crate::store::ServerStore;

pub struct TransportSwitch {
    servers: Arc<ServerStore>,
    default_client: HttpsClient,
}

impl TransportSwitch {
    pub fn new(servers: Arc<ServerStore>, default_client: HttpsClient) -> Self {
        Self {
            servers,
            default_client,
        }
    }

    /// Client to use for a request headed to `authority` (`host[:port]`).
    pub fn client_for(&self, request_id: Option<&str>, authority: &str) -> HttpsClient {
        if let Some(server) = self.servers.find_by_host(authority) {
            if let Some(client) = server.transport {
                tracing::info!(
                    request_id = request_id.unwrap_or(""),
                    host = %authority,
                    server = %server.name,
                    "using dedicated transport"
                );
                return client;
            }
        }
        self.default_client.clone()
    }
}
