//! X-Road SOAP reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  XROAD PROXY                     │
//!                      │                                                  │
//!   SOAP Request       │  ┌────────┐   ┌──────────┐   ┌───────────────┐  │
//!   ──────────────────▶│  │ proxy  │──▶│   soap   │──▶│ rule matching │  │
//!                      │  │ server │   │ envelope │   │ (store union) │  │
//!                      │  └────────┘   └──────────┘   └───────┬───────┘  │
//!                      │                                      ▼          │
//!                      │                              ┌───────────────┐  │
//!                      │                              │  transport    │  │
//!                      │                              │  switch (TLS) │  │
//!                      │                              └───────┬───────┘  │
//!   SOAP Response      │  ┌──────────┐   ┌──────────┐         │          │
//!   ◀──────────────────┼──│ response │◀──│ exchange │◀────────┴──────────┼──▶ Backends
//!                      │  │ rewrite  │   │  cache   │                    │
//!                      │  └──────────┘   └──────────┘                    │
//!                      │                                                  │
//!                      │  admin API: /rules /servers /requests            │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use xroad_proxy::api::build_api_router;
use xroad_proxy::config::load_config;
use xroad_proxy::domain::{rule, server};
use xroad_proxy::lifecycle::{signals, Shutdown};
use xroad_proxy::net::tls;
use xroad_proxy::observability::{logging, metrics};
use xroad_proxy::proxy::{build_proxy_router, AppState, Pipeline, TransportSwitch};
use xroad_proxy::store::{ExchangeCache, RandomIds, RuleStore, ServerStore};

#[derive(Debug, Parser)]
#[command(name = "xroad-proxy", version, about = "Rule-based reverse proxy for X-Road SOAP services")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability.log_level);
    tracing::info!(config = %cli.config.display(), "configuration loaded");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init(addr),
            Err(err) => tracing::error!(
                address = %config.observability.metrics_address,
                error = %err,
                "failed to parse metrics address"
            ),
        }
    }

    // domain conversion: compile regexes, build per-server transports
    let servers = server::convert_servers(&config.routes.servers)?;
    let rules = rule::convert_rules(&config.routes.rules)?;
    tracing::info!(
        servers = servers.len(),
        rules = rules.len(),
        "routes configured"
    );

    let ids = Arc::new(RandomIds);
    let rule_store = Arc::new(RuleStore::new(
        rules,
        config.storage.rules.size,
        expiration(config.storage.rules.expiration_minutes),
        ids.clone(),
    ));
    let server_store = Arc::new(ServerStore::new(servers, None, ids.clone()));
    let exchanges = Arc::new(ExchangeCache::new(
        config.storage.requests.size,
        expiration(config.storage.requests.expiration_minutes).unwrap_or_default(),
    ));

    // fatal without a fallback route
    let pipeline = Arc::new(Pipeline::new(
        rule_store.clone(),
        server_store.clone(),
        exchanges.clone(),
        ids,
    )?);
    let switch = Arc::new(TransportSwitch::new(
        server_store.clone(),
        tls::default_https_client(),
    ));

    let state = AppState {
        pipeline,
        switch,
        rules: rule_store,
        servers: server_store,
        exchanges,
    };

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signals::shutdown_requested().await;
            shutdown.trigger();
        }
    });

    if config.api.enabled {
        let api_router = build_api_router(state.clone());
        let api_listener = TcpListener::bind(&config.api.address).await?;
        tracing::info!(address = %config.api.address, "administrative API listening");
        let mut api_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let result = axum::serve(
                api_listener,
                api_router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = api_shutdown.recv().await;
            })
            .await;
            if let Err(err) = result {
                tracing::error!(error = %err, "administrative API server failed");
            }
        });
    }

    let request_timeout = Duration::from_secs(config.server.write_timeout_seconds);
    let proxy_router = build_proxy_router(state, &config.server.context_path, request_timeout);

    match &config.server.tls {
        Some(tls_conf) => {
            let rustls_config = tls::load_listener_tls(
                tls_conf.cert_file.as_ref(),
                tls_conf.key_file.as_ref(),
            )
            .await?;
            let addr: SocketAddr = config.server.address.parse()?;
            tracing::info!(address = %addr, "proxy listening (TLS)");

            let handle = axum_server::Handle::new();
            let mut rx = shutdown.subscribe();
            let drain_handle = handle.clone();
            tokio::spawn(async move {
                let _ = rx.recv().await;
                drain_handle.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            axum_server::bind_rustls(addr, rustls_config)
                .handle(handle)
                .serve(proxy_router.into_make_service_with_connect_info::<SocketAddr>())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&config.server.address).await?;
            tracing::info!(address = %config.server.address, "proxy listening");
            let mut rx = shutdown.subscribe();
            axum::serve(
                listener,
                proxy_router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await?;
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}

fn expiration(minutes: u64) -> Option<Duration> {
    if minutes == 0 {
        None
    } else {
        Some(Duration::from_secs(minutes * 60))
    }
}
