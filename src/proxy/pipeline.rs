//! Two-phase proxy pipeline: request director and response modifier.
//!
//! # Responsibilities
//! - Extract the service identity from the SOAP envelope
//! - Match rules (remote address → service → body regex) and pick the
//!   destination server
//! - Create/complete exchange records around the upstream round-trip
//! - Apply per-rule request/response body replacements
//!
//! # Design Decisions
//! - Degenerate paths (parse failure, no match, unknown destination) route
//!   the unmodified body to the default server; they are logged, never
//!   surfaced to the caller
//! - The matched rule id travels in a header of its own because the exchange
//!   cache may have evicted the record by the time the response arrives, and
//!   response rewrites still need the rule

use std::sync::Arc;

use axum::http::HeaderMap;
use bytes::Bytes;

use crate::domain::exchange::Exchange;
use crate::domain::server::ProxyServer;
use crate::soap;
use crate::store::hybrid::IdSource;
use crate::store::{ExchangeCache, RuleStore, ServerStore};

/// Default path where X-Road consumers reach a security server.
pub const DEFAULT_CONTEXT_PATH: &str = "/cgi-bin/consumer_proxy";

/// Correlation id of the exchange record, carried across the round-trip.
pub const REQUEST_ID_HEADER: &str = "x-xroad-proxy-request-id";

/// Id of the matched rule, carried for response-phase rewrites.
pub const RULE_ID_HEADER: &str = "x-xroad-proxy-rule-id";

/// Cross-phase state attached to the outgoing request as headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    pub request_id: String,
    pub rule_id: i64,
}

/// Outcome of the director phase.
#[derive(Debug)]
pub struct RoutePlan {
    /// Destination server (the default one on every degenerate path).
    pub server: ProxyServer,
    /// Body to forward; rewritten only when the matched rule asks for it.
    pub body: Bytes,
    /// Present only when a rule matched.
    pub correlation: Option<Correlation>,
}

/// Startup failure: the pipeline cannot exist without its fallback route.
#[derive(Debug, thiserror::Error)]
#[error("failed to find default proxy server configuration")]
pub struct NoDefaultServer;

pub struct Pipeline {
    rules: Arc<RuleStore>,
    servers: Arc<ServerStore>,
    exchanges: Arc<ExchangeCache>,
    ids: Arc<dyn IdSource>,
    default_server: ProxyServer,
}

impl Pipeline {
    pub fn new(
        rules: Arc<RuleStore>,
        servers: Arc<ServerStore>,
        exchanges: Arc<ExchangeCache>,
        ids: Arc<dyn IdSource>,
    ) -> Result<Self, NoDefaultServer> {
        let default_server = servers.default_server().ok_or(NoDefaultServer)?;
        Ok(Self {
            rules,
            servers,
            exchanges,
            ids,
            default_server,
        })
    }

    pub fn default_server(&self) -> &ProxyServer {
        &self.default_server
    }

    /// Director phase: decide where the request goes and with what body.
    ///
    /// Never fails; anything the rule engine cannot handle degrades to the
    /// default route with the body passed through unmodified.
    pub fn plan_request(&self, remote_addr: &str, body: Bytes) -> RoutePlan {
        let envelope = match soap::from_request_body(&body) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::error!(error = %err, "unable to extract service info from request");
                return self.default_plan(body);
            }
        };
        let service = envelope.service();

        let matched = self
            .rules
            .get_all()
            .match_remote_addr(remote_addr)
            .match_service(&service)
            .match_regex(&body);
        let rule = match matched {
            Some(rule) => rule,
            None => {
                tracing::info!(service = %service, "received SOAP message without matching rule");
                return self.default_plan(body);
            }
        };

        let server = match self.servers.find(&rule.server) {
            Some(server) => server,
            None => {
                tracing::error!(
                    rule_id = rule.id,
                    server = %rule.server,
                    "failed to find server matching rule"
                );
                return self.default_plan(body);
            }
        };

        let request_id = self.ids.correlation_id();
        self.exchanges.set(Exchange::for_request(
            request_id.clone(),
            rule.id,
            service.clone(),
            body.to_vec(),
        ));

        let body = if rule.request_replacements.is_empty() {
            body
        } else {
            Bytes::from(rule.apply_request_replacements(&body))
        };

        tracing::info!(
            service = %service,
            request_id = %request_id,
            rule_id = rule.id,
            server = %server.name,
            "matched to rule"
        );

        RoutePlan {
            server,
            body,
            correlation: Some(Correlation {
                request_id,
                rule_id: rule.id,
            }),
        }
    }

    fn default_plan(&self, body: Bytes) -> RoutePlan {
        RoutePlan {
            server: self.default_server.clone(),
            body,
            correlation: None,
        }
    }

    /// Response-modifier phase.
    ///
    /// `outbound_headers` are the headers the upstream request carried; the
    /// correlation values in them are the only state shared with the
    /// director. Returns the body to hand back to the caller.
    pub fn apply_response(&self, outbound_headers: &HeaderMap, body: Bytes) -> Bytes {
        let request_id = header_str(outbound_headers, REQUEST_ID_HEADER);
        let rule_id_raw = header_str(outbound_headers, RULE_ID_HEADER);
        if request_id.is_none() && rule_id_raw.is_none() {
            // default-routed traffic passes through untouched
            return body;
        }

        let mut body = body;
        if let Some(raw) = rule_id_raw {
            match raw.parse::<i64>() {
                Ok(rule_id) if rule_id != 0 => {
                    // resolved via the store, not the exchange cache: the
                    // cache entry may already be gone
                    if let Some(rule) = self.rules.get(rule_id) {
                        if !rule.response_replacements.is_empty() {
                            body = Bytes::from(rule.apply_response_replacements(&body));
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(rule_id = %raw, error = %err, "failed to parse rule id header");
                }
            }
        }

        if let Some(request_id) = request_id {
            if let Some(mut cached) = self.exchanges.get(request_id) {
                cached.complete(body.to_vec());
                self.exchanges.set(cached);
            }
            // a miss is expected under cache pressure; nothing to do
        }

        body
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
