//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use xroad_proxy::api::build_api_router;
use xroad_proxy::config::schema::{ProxyServerConf, RuleConf};
use xroad_proxy::domain::{rule, server};
use xroad_proxy::net::tls::default_https_client;
use xroad_proxy::proxy::{build_proxy_router, AppState, Pipeline, TransportSwitch};
use xroad_proxy::store::{ExchangeCache, RandomIds, RuleStore, ServerStore};

/// SOAP request for service `rr.rr456.v1` carrying a personal-code query.
pub const SOAP_REQUEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
                   xmlns:xrd="http://x-road.eu/xsd/xroad.xsd"
                   xmlns:id="http://x-road.eu/xsd/identifiers">
  <SOAP-ENV:Header>
    <xrd:service id:objectType="SERVICE">
      <id:subsystemCode>rr</id:subsystemCode>
      <id:serviceCode>rr456</id:serviceCode>
      <id:serviceVersion>v1</id:serviceVersion>
    </xrd:service>
  </SOAP-ENV:Header>
  <SOAP-ENV:Body>
    <ns:paring xmlns:ns="http://rr.x-road.eu/producer">
      <isikukood>38211020380</isikukood>
    </ns:paring>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

/// SOAP response body the mock backends reply with.
pub const SOAP_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Body>
    <ns:paringResponse xmlns:ns="http://rr.x-road.eu/producer">
      <Isik.Isikukood>38211020380</Isik.Isikukood>
    </ns:paringResponse>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

/// A captured upstream request: the raw head and the body bytes.
#[derive(Debug)]
pub struct CapturedRequest {
    pub head: String,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.head
            .lines()
            .find(|line| line.to_ascii_lowercase().starts_with(&prefix))
            .map(|line| line[prefix.len()..].trim().to_string())
    }
}

/// Start a mock backend that captures each request and answers with a fixed
/// XML body. Returns its address and a channel of captured requests.
pub async fn start_capturing_backend(
    response_body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let Some(captured) = read_http_request(&mut socket).await else {
                    return;
                };
                let _ = tx.send(captured);

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/xml;charset=UTF-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response_body.len(),
                    response_body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// Read one HTTP/1.1 request off the socket: head until CRLFCRLF, then a
/// Content-Length-delimited body.
async fn read_http_request(socket: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&chunk[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if raw.len() > 64 * 1024 {
            return None;
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);

    let mut body = raw[head_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Some(CapturedRequest { head, body })
}

/// Everything a test needs to drive one proxy instance.
pub struct TestProxy {
    pub proxy_url: String,
    pub api_url: String,
    pub exchanges: Arc<ExchangeCache>,
}

/// Build the full stack from raw route config and serve it on ephemeral
/// ports.
pub async fn start_proxy(
    server_confs: Vec<ProxyServerConf>,
    rule_confs: Vec<RuleConf>,
) -> TestProxy {
    let servers = server::convert_servers(&server_confs).unwrap();
    let rules = rule::convert_rules(&rule_confs).unwrap();

    let ids = Arc::new(RandomIds);
    let rule_store = Arc::new(RuleStore::new(rules, 0, None, ids.clone()));
    let server_store = Arc::new(ServerStore::new(servers, None, ids.clone()));
    let exchanges = Arc::new(ExchangeCache::default());

    let pipeline = Arc::new(
        Pipeline::new(
            rule_store.clone(),
            server_store.clone(),
            exchanges.clone(),
            ids,
        )
        .unwrap(),
    );
    let switch = Arc::new(TransportSwitch::new(
        server_store.clone(),
        default_https_client(),
    ));

    let state = AppState {
        pipeline,
        switch,
        rules: rule_store,
        servers: server_store,
        exchanges: exchanges.clone(),
    };

    let proxy_router = build_proxy_router(state.clone(), "", Duration::from_secs(10));
    let proxy_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = proxy_listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            proxy_listener,
            proxy_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let api_router = build_api_router(state);
    let api_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let api_addr = api_listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            api_listener,
            api_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestProxy {
        proxy_url: format!("http://{proxy_addr}/cgi-bin/consumer_proxy"),
        api_url: format!("http://{api_addr}"),
        exchanges,
    }
}

/// Server config entry for a plain-HTTP backend.
pub fn server_conf(name: &str, addr: SocketAddr, is_default: bool) -> ProxyServerConf {
    ProxyServerConf {
        name: name.to_string(),
        address: format!("http://{addr}"),
        is_default,
        ..ProxyServerConf::default()
    }
}

/// Rule config entry matching one service towards one server.
pub fn rule_conf(service: &str, server: &str, priority: i64) -> RuleConf {
    RuleConf {
        server: server.to_string(),
        service: service.to_string(),
        priority,
        ..RuleConf::default()
    }
}
