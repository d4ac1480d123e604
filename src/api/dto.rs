//! Transfer objects for the administrative API.
//!
//! # Design Decisions
//! - Compiled regexes travel as their source strings; conversion back into
//!   domain objects revalidates them
//! - Exchange bodies are base64 in the full view and omitted from listings
//! - Server payloads may inline PEM TLS material, from which a dedicated
//!   transport is built at save time

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::exchange::Exchange;
use crate::domain::rule::{Replacement, Rule};
use crate::domain::server::ProxyServer;
use crate::net::tls;

/// Standard success wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            success: true,
        }
    }
}

/// Standard failure wrapper.
#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub error: String,
    pub success: bool,
}

impl ApiFailure {
    pub fn new(error: String) -> Self {
        Self {
            error,
            success: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReplacementDto {
    pub regex: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleDto {
    pub id: i64,
    pub server: String,
    pub service: String,
    pub priority: i64,
    pub matcher_remote_addr: Vec<String>,
    pub matcher_regexes: Vec<String>,
    pub request_replacements: Vec<ReplacementDto>,
    pub response_replacements: Vec<ReplacementDto>,
    /// API-created rules stay read-only unless explicitly flagged mutable.
    pub read_only: bool,
}

impl Default for RuleDto {
    fn default() -> Self {
        Self {
            id: 0,
            server: String::new(),
            service: String::new(),
            priority: 0,
            matcher_remote_addr: Vec::new(),
            matcher_regexes: Vec::new(),
            request_replacements: Vec::new(),
            response_replacements: Vec::new(),
            read_only: true,
        }
    }
}

impl RuleDto {
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            id: rule.id,
            server: rule.server.clone(),
            service: rule.service.clone(),
            priority: rule.priority,
            matcher_remote_addr: rule.matcher_remote_addr.clone(),
            matcher_regexes: rule.matcher_regex.iter().map(|r| r.to_string()).collect(),
            request_replacements: replacements_to_dto(&rule.request_replacements),
            response_replacements: replacements_to_dto(&rule.response_replacements),
            read_only: rule.read_only,
        }
    }

    /// Validate and convert into a domain rule.
    pub fn into_rule(self) -> Result<Rule, String> {
        if self.server.is_empty() {
            return Err("server can not be empty".to_string());
        }
        if self.service.is_empty()
            && self.matcher_remote_addr.is_empty()
            && self.matcher_regexes.is_empty()
        {
            return Err("at least one matcher must be set".to_string());
        }

        let matcher_regex = self
            .matcher_regexes
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|e| format!("failed to compile matcher regex `{pattern}`: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Rule {
            id: self.id,
            server: self.server.to_lowercase(),
            service: self.service,
            priority: self.priority,
            matcher_remote_addr: self.matcher_remote_addr,
            matcher_regex,
            request_replacements: replacements_from_dto(&self.request_replacements)?,
            response_replacements: replacements_from_dto(&self.response_replacements)?,
            read_only: self.read_only,
        })
    }
}

fn replacements_to_dto(replacements: &[Replacement]) -> Vec<ReplacementDto> {
    replacements
        .iter()
        .map(|r| ReplacementDto {
            regex: r.regex.to_string(),
            value: r.value.clone(),
        })
        .collect()
}

fn replacements_from_dto(dtos: &[ReplacementDto]) -> Result<Vec<Replacement>, String> {
    dtos.iter()
        .map(|dto| {
            Regex::new(&dto.regex)
                .map(|regex| Replacement {
                    regex,
                    value: dto.value.clone(),
                })
                .map_err(|e| format!("failed to compile replacement regex `{}`: {e}", dto.regex))
        })
        .collect()
}

/// Inline TLS material for an API-created server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TlsDto {
    pub use_system_transport: bool,
    pub ca_cert: String,
    pub cert: String,
    pub key: String,
    pub key_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerDto {
    pub id: i64,
    pub name: String,
    pub address: String,
    /// API-created servers stay read-only unless explicitly flagged mutable.
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsDto>,
}

impl Default for ServerDto {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            address: String::new(),
            read_only: true,
            tls: None,
        }
    }
}

impl ServerDto {
    /// TLS material never leaves the process; listings carry metadata only.
    pub fn from_server(server: &ProxyServer) -> Self {
        Self {
            id: server.id,
            name: server.name.clone(),
            address: server.address.to_string(),
            read_only: server.read_only,
            tls: None,
        }
    }

    /// Validate and convert into a domain server, building its dedicated
    /// transport from the inline PEM material when present.
    pub fn into_server(self) -> Result<ProxyServer, String> {
        if self.name.is_empty() {
            return Err("name can not be empty".to_string());
        }
        let address = Url::parse(&self.address)
            .map_err(|e| format!("failed to parse address to url: {e}"))?;

        let transport = match &self.tls {
            Some(tls_dto) if !tls_dto.use_system_transport && !tls_dto.cert.is_empty() => {
                let config = tls::client_config_from_pem(
                    tls_dto.ca_cert.as_bytes(),
                    tls_dto.cert.as_bytes(),
                    tls_dto.key.as_bytes(),
                )
                .map_err(|e| format!("failed to build server transport: {e}"))?;
                Some(tls::https_client(config))
            }
            _ => None,
        };

        Ok(ProxyServer {
            id: self.id,
            name: self.name.to_lowercase(),
            address,
            // the fallback route is fixed at startup; API entries never take it over
            is_default: false,
            read_only: self.read_only,
            transport,
        })
    }
}

/// Exchange listing entry; bodies only in the full view.
#[derive(Debug, Serialize)]
pub struct ExchangeDto {
    pub id: String,
    pub service: String,
    pub request_time: DateTime<Utc>,
    pub request_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<DateTime<Utc>>,
    pub response_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

impl ExchangeDto {
    pub fn summary(exchange: &Exchange) -> Self {
        Self::convert(exchange, false)
    }

    pub fn full(exchange: &Exchange) -> Self {
        Self::convert(exchange, true)
    }

    fn convert(exchange: &Exchange, with_bodies: bool) -> Self {
        Self {
            id: exchange.id.clone(),
            service: exchange.service.clone(),
            request_time: exchange.request_time,
            request_size: exchange.request_size,
            response_time: exchange.response_time,
            response_size: exchange.response_size,
            request_body: with_bodies.then(|| BASE64.encode(&exchange.request)),
            response_body: with_bodies.then(|| BASE64.encode(&exchange.response)),
        }
    }
}
