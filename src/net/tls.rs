//! TLS configuration and certificate loading.

use std::fs;
use std::io::{self, BufReader};
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;

use crate::config::schema::TlsConf;
use crate::domain::server::HttpsClient;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read TLS material: {0}")]
    Io(#[from] io::Error),
    #[error("no private key found in key input")]
    MissingKey,
    #[error("invalid TLS configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Client configuration for a backend with its own trust anchors and client
/// certificate, from PEM files.
pub fn client_config_from_files(conf: &TlsConf) -> Result<ClientConfig, TlsError> {
    let ca = fs::read(&conf.ca_file)?;
    let cert = fs::read(&conf.cert_file)?;
    let key = fs::read(&conf.key_file)?;
    client_config_from_pem(&ca, &cert, &key)
}

/// Same as [`client_config_from_files`], from in-memory PEM (administrative
/// API payloads carry the material inline).
pub fn client_config_from_pem(
    ca: &[u8],
    cert: &[u8],
    key: &[u8],
) -> Result<ClientConfig, TlsError> {
    let mut roots = RootCertStore::empty();
    for ca_cert in rustls_pemfile::certs(&mut BufReader::new(ca)) {
        roots.add(ca_cert?)?;
    }

    let cert_chain: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut BufReader::new(cert)).collect::<Result<_, _>>()?;
    let key: PrivateKeyDer<'static> =
        rustls_pemfile::private_key(&mut BufReader::new(key))?.ok_or(TlsError::MissingKey)?;

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_client_auth_cert(cert_chain, key)?;
    Ok(config)
}

/// Build a hyper client on top of a rustls client configuration.
pub fn https_client(config: ClientConfig) -> HttpsClient {
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(config)
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Process default client: public roots, no client auth. Serves every
/// backend without a dedicated transport.
pub fn default_https_client() -> HttpsClient {
    let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    https_client(config)
}

/// Load listener TLS configuration from certificate and key files.
pub async fn load_listener_tls(
    cert_path: &Path,
    key_path: &Path,
) -> Result<RustlsConfig, io::Error> {
    if !cert_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("certificate file not found: {cert_path:?}"),
        ));
    }
    if !key_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("private key file not found: {key_path:?}"),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_builds() {
        let _client = default_https_client();
    }

    #[test]
    fn test_client_config_rejects_garbage_pem() {
        let err = client_config_from_pem(b"not pem", b"not pem", b"not pem").unwrap_err();
        assert!(matches!(err, TlsError::MissingKey | TlsError::Io(_)));
    }
}
