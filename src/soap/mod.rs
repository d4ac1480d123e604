//! SOAP envelope extraction.
//!
//! # Responsibilities
//! - Pull the service identification triple out of an X-Road SOAP header
//! - Form the dotted service identity used as the primary match key
//!
//! # Design Decisions
//! - Namespace-agnostic: elements are matched by local name, so
//!   `xrd:service` and `service` are equivalent
//! - Extraction failures are reported to the caller and are non-fatal to
//!   the proxy pipeline (the request degrades to the default route)

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SoapError {
    #[error("failed to parse SOAP envelope: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("SOAP header is missing service identification")]
    MissingServiceInfo,
}

/// Service identification carried in the envelope header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub subsystem_code: String,
    pub service_code: String,
    pub service_version: String,
}

impl Envelope {
    /// Dotted service identity, e.g. `rr.rr456.v1`.
    pub fn service(&self) -> String {
        format!(
            "{}.{}.{}",
            self.subsystem_code, self.service_code, self.service_version
        )
    }
}

/// Extract service identification from raw request body bytes.
///
/// Expects `Envelope > Header > service > {subsystemCode, serviceCode,
/// serviceVersion}`; anything else (malformed XML, a multipart or binary
/// body, a header without the service block) is an error.
pub fn from_request_body(body: &[u8]) -> Result<Envelope, SoapError> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    // stack of element local names from the root down to the current element
    let mut path: Vec<Vec<u8>> = Vec::new();

    let mut subsystem_code = None;
    let mut service_code = None;
    let mut service_version = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => path.push(e.local_name().as_ref().to_vec()),
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) => {
                if let Some(field) = service_field(&path) {
                    let text = t.unescape()?.trim().to_string();
                    capture(field, text, &mut subsystem_code, &mut service_code, &mut service_version);
                }
            }
            Event::CData(t) => {
                if let Some(field) = service_field(&path) {
                    let text = String::from_utf8_lossy(&t).trim().to_string();
                    capture(field, text, &mut subsystem_code, &mut service_code, &mut service_version);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match (subsystem_code, service_code, service_version) {
        (Some(subsystem_code), Some(service_code), Some(service_version))
            if !subsystem_code.is_empty()
                && !service_code.is_empty()
                && !service_version.is_empty() =>
        {
            Ok(Envelope {
                subsystem_code,
                service_code,
                service_version,
            })
        }
        _ => Err(SoapError::MissingServiceInfo),
    }
}

enum ServiceField {
    SubsystemCode,
    ServiceCode,
    ServiceVersion,
}

fn capture(
    field: ServiceField,
    text: String,
    subsystem_code: &mut Option<String>,
    service_code: &mut Option<String>,
    service_version: &mut Option<String>,
) {
    match field {
        ServiceField::SubsystemCode => *subsystem_code = Some(text),
        ServiceField::ServiceCode => *service_code = Some(text),
        ServiceField::ServiceVersion => *service_version = Some(text),
    }
}

/// Which service field, if any, the current element path points at.
fn service_field(path: &[Vec<u8>]) -> Option<ServiceField> {
    let len = path.len();
    if len < 3 || path[len - 2] != b"service" || path[len - 3] != b"Header" {
        return None;
    }
    match path[len - 1].as_slice() {
        b"subsystemCode" => Some(ServiceField::SubsystemCode),
        b"serviceCode" => Some(ServiceField::ServiceCode),
        b"serviceVersion" => Some(ServiceField::ServiceVersion),
        _ => None,
    }
}
