//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConf {
    /// Proxy listener configuration.
    pub server: ServerConf,

    /// Administrative API listener configuration.
    pub api: ApiConf,

    /// Bounds for the dynamic rule partition and the exchange cache.
    pub storage: StorageConf,

    /// Backend servers and routing rules.
    pub routes: RoutesConf,

    /// Logging and metrics settings.
    pub observability: ObservabilityConf,
}

/// Proxy listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConf {
    /// Bind address (e.g. "0.0.0.0:8080").
    pub address: String,

    /// Path the proxy endpoint is served on; empty means the conventional
    /// X-Road consumer path.
    pub context_path: String,

    /// Read timeout in seconds.
    pub read_timeout_seconds: u64,

    /// Write timeout in seconds; bounds the whole proxied exchange.
    pub write_timeout_seconds: u64,

    /// Optional TLS for the listener itself.
    pub tls: Option<ListenerTlsConf>,
}

impl Default for ServerConf {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
            context_path: String::new(),
            read_timeout_seconds: 60,
            write_timeout_seconds: 60,
            tls: None,
        }
    }
}

/// Administrative API listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConf {
    /// Enable the administrative API listener.
    pub enabled: bool,

    /// Bind address for the API listener.
    pub address: String,
}

impl Default for ApiConf {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// TLS configuration for a listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerTlsConf {
    /// Path to certificate file (PEM).
    pub cert_file: String,

    /// Path to private key file (PEM).
    pub key_file: String,
}

/// Per-store cache bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConf {
    /// Maximum number of cached entries; 0 picks the store default.
    pub size: usize,

    /// Entry time-to-live in minutes; 0 means no TTL (or the store default
    /// where one exists).
    pub expiration_minutes: u64,
}

impl Default for CacheConf {
    fn default() -> Self {
        Self {
            size: 0,
            expiration_minutes: 0,
        }
    }
}

/// Storage bounds per cached collection.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StorageConf {
    /// Exchange cache (inspected requests).
    pub requests: CacheConf,

    /// Dynamic rule partition.
    pub rules: CacheConf,
}

/// Routing configuration: all servers and the rules that select them.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutesConf {
    pub servers: Vec<ProxyServerConf>,
    pub rules: Vec<RuleConf>,
}

/// A backend server requests can be proxied to.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyServerConf {
    /// Unique server name; rules reference it.
    pub name: String,

    /// Backend base URL (e.g. "https://security-server.example.com:5500").
    pub address: String,

    /// Fallback route for unmatched traffic. Exactly one server must carry
    /// this flag.
    pub is_default: bool,

    /// Should the entry be changeable via the API (defaults to true).
    pub read_only: Option<bool>,

    /// TLS identity used towards this backend.
    pub tls: Option<TlsConf>,
}

/// Client TLS material for one backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConf {
    /// Skip the dedicated transport and use the process default client.
    pub use_system_transport: bool,

    pub ca_file: String,
    pub cert_file: String,
    pub key_file: String,
    pub key_password: String,
}

/// A routing/rewrite rule.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RuleConf {
    /// Server name where matched requests are directed. Must have a matching
    /// entry in `routes.servers`.
    pub server: String,

    /// Full service name to match, `subsystemCode.serviceCode.serviceVersion`
    /// (for example `rr.rr456.v1`). Empty matches every service.
    pub service: String,

    /// Rules are matched in priority order; higher is matched sooner.
    pub priority: i64,

    /// Remote address prefixes that may use this rule.
    pub request_matcher_remote_addr: Vec<String>,

    /// Regexes run on the request body to decide if the rule applies.
    pub request_matcher_regexes: Vec<String>,

    /// Regex replacements applied to the request before it is proxied.
    pub request_replacements: Vec<ReplacementConf>,

    /// Regex replacements applied to the proxied response.
    pub response_replacements: Vec<ReplacementConf>,

    /// Should the rule be changeable via the API (defaults to true).
    pub read_only: Option<bool>,
}

/// One regex rewrite.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ReplacementConf {
    pub regex: String,
    pub value: String,
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConf {
    /// Log filter used when RUST_LOG is not set.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConf {
    fn default() -> Self {
        Self {
            log_level: "xroad_proxy=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
