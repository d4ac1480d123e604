//! Proxy HTTP endpoint.
//!
//! # Responsibilities
//! - Expose the proxy entry point on the configured context path
//! - Buffer the request body, run the director, forward upstream, run the
//!   response modifier
//! - Wire middleware (timeout, tracing) the same way for every listener
//!
//! # Design Decisions
//! - Bodies are fully buffered: the rule engine regex-matches and rewrites
//!   whole bodies, so streaming would buy nothing
//! - An upstream I/O failure is the only path that fails the exchange (502);
//!   rule-engine failures degraded to the default route long before this

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, uri::Uri, HeaderValue, Request, Response, StatusCode},
    response::IntoResponse,
    routing::{any, post},
    Router,
};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::observability::metrics;
use crate::proxy::pipeline::{Pipeline, RoutePlan, REQUEST_ID_HEADER, RULE_ID_HEADER};
use crate::proxy::transport::TransportSwitch;
use crate::store::{ExchangeCache, RuleStore, ServerStore};

/// Hard cap on buffered inbound bodies.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Application state injected into handlers on both listeners.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub switch: Arc<TransportSwitch>,
    pub rules: Arc<RuleStore>,
    pub servers: Arc<ServerStore>,
    pub exchanges: Arc<ExchangeCache>,
}

/// Build the proxy router: the consumer endpoint plus a liveness root.
///
/// An empty `context_path` falls back to the conventional X-Road consumer
/// path.
pub fn build_proxy_router(state: AppState, context_path: &str, request_timeout: Duration) -> Router {
    let context_path = if context_path.is_empty() {
        crate::proxy::pipeline::DEFAULT_CONTEXT_PATH
    } else {
        context_path
    };
    Router::new()
        .route("/", any(root_handler))
        .route(context_path, post(proxy_handler))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

async fn root_handler() -> impl IntoResponse {
    tracing::info!("received request");
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"), "\n")
}

/// Main proxy handler: director → upstream round-trip → response modifier.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response<Body> {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "failed to buffer request body");
            return plain_response(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
        }
    };

    let plan = state.pipeline.plan_request(&remote_addr.to_string(), body);
    let authority = plan.server.authority();

    let outbound = match build_upstream_request(&parts, &plan, &authority) {
        Ok(outbound) => outbound,
        Err(err) => {
            tracing::error!(error = %err, server = %plan.server.name, "failed to build upstream request");
            return plain_response(StatusCode::BAD_GATEWAY, "upstream request failed");
        }
    };

    // the headers are the only state shared with the response phase
    let outbound_headers = outbound.headers().clone();
    let request_id = plan
        .correlation
        .as_ref()
        .map(|c| c.request_id.clone());

    let client = state.switch.client_for(request_id.as_deref(), &authority);
    let upstream = match client.request(outbound).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, server = %plan.server.name, "upstream request failed");
            metrics::record_request(&method, 502, &authority, start);
            return plain_response(StatusCode::BAD_GATEWAY, "upstream request failed");
        }
    };

    let (mut upstream_parts, upstream_body) = upstream.into_parts();
    let response_body = match upstream_body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::error!(error = %err, server = %plan.server.name, "failed to read upstream response");
            metrics::record_request(&method, 502, &authority, start);
            return plain_response(StatusCode::BAD_GATEWAY, "upstream response failed");
        }
    };

    let final_body = state
        .pipeline
        .apply_response(&outbound_headers, response_body);

    // the body is fully buffered, so the framing headers must agree
    upstream_parts.headers.remove(header::TRANSFER_ENCODING);
    upstream_parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(final_body.len()));

    metrics::record_request(&method, upstream_parts.status.as_u16(), &authority, start);
    Response::from_parts(upstream_parts, Body::from(final_body))
}

/// Rebuild the buffered request for the destination chosen by the director.
fn build_upstream_request(
    parts: &axum::http::request::Parts,
    plan: &RoutePlan,
    authority: &str,
) -> Result<Request<Full<Bytes>>, axum::http::Error> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri = Uri::builder()
        .scheme(plan.server.scheme())
        .authority(authority)
        .path_and_query(path_and_query)
        .build()?;

    let mut builder = Request::builder().method(parts.method.clone()).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            // append: multi-valued headers survive the copy
            headers.append(name.clone(), value.clone());
        }
        // the target server only accepts requests addressed to itself
        headers.insert(header::HOST, HeaderValue::from_str(authority)?);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(plan.body.len()));
        if let Some(correlation) = &plan.correlation {
            headers.insert(
                REQUEST_ID_HEADER,
                HeaderValue::from_str(&correlation.request_id)?,
            );
            headers.insert(
                RULE_ID_HEADER,
                HeaderValue::from_str(&correlation.rule_id.to_string())?,
            );
        }
    }

    builder.body(Full::new(plan.body.clone()))
}

fn plain_response(status: StatusCode, message: &'static str) -> Response<Body> {
    (status, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::server::ProxyServer;
    use crate::proxy::pipeline::Correlation;
    use url::Url;

    fn plan(body: &'static [u8], correlation: Option<Correlation>) -> RoutePlan {
        RoutePlan {
            server: ProxyServer {
                id: 1,
                name: "xroad".to_string(),
                address: Url::parse("https://xroad.example.com:5500").unwrap(),
                is_default: false,
                read_only: true,
                transport: None,
            },
            body: Bytes::from_static(body),
            correlation,
        }
    }

    fn inbound_parts() -> axum::http::request::Parts {
        let (parts, _) = Request::builder()
            .method("POST")
            .uri("http://proxy.local/cgi-bin/consumer_proxy?x=1")
            .header(header::HOST, "proxy.local")
            .header(header::CONTENT_TYPE, "text/xml")
            .header(header::CONTENT_LENGTH, "999")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_upstream_request_readdressed_to_destination() {
        let plan = plan(b"<x/>", None);
        let req = build_upstream_request(&inbound_parts(), &plan, "xroad.example.com:5500").unwrap();

        assert_eq!(
            req.uri().to_string(),
            "https://xroad.example.com:5500/cgi-bin/consumer_proxy?x=1"
        );
        assert_eq!(
            req.headers().get(header::HOST).unwrap(),
            "xroad.example.com:5500"
        );
        // recomputed for the forwarded body, not copied from the inbound value
        assert_eq!(req.headers().get(header::CONTENT_LENGTH).unwrap(), "4");
        assert_eq!(req.headers().get(header::CONTENT_TYPE).unwrap(), "text/xml");
        assert!(req.headers().get(REQUEST_ID_HEADER).is_none());
    }

    #[test]
    fn test_correlation_headers_attached_when_matched() {
        let plan = plan(
            b"<x/>",
            Some(Correlation {
                request_id: "12345".to_string(),
                rule_id: 7,
            }),
        );
        let req = build_upstream_request(&inbound_parts(), &plan, "xroad.example.com:5500").unwrap();

        assert_eq!(req.headers().get(REQUEST_ID_HEADER).unwrap(), "12345");
        assert_eq!(req.headers().get(RULE_ID_HEADER).unwrap(), "7");
    }
}
