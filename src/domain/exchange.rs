//! Cached request/response pairs of proxied exchanges.

use chrono::{DateTime, Utc};

/// A proxied request and, once the response phase has run, its response.
///
/// Created at match time with only the request fields populated; the
/// response phase fills in the rest exactly once. The exchange cache may
/// evict the record at any point in between.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Correlation id generated for the matched request.
    pub id: String,
    /// Rule the request matched.
    pub rule_id: i64,
    /// Service identity extracted from the envelope.
    pub service: String,
    pub request: Vec<u8>,
    pub request_time: DateTime<Utc>,
    pub request_size: i64,
    pub response: Vec<u8>,
    pub response_time: Option<DateTime<Utc>>,
    pub response_size: i64,
}

impl Exchange {
    /// New record for a just-matched request; response fields stay empty
    /// until the response phase completes.
    pub fn for_request(id: String, rule_id: i64, service: String, request: Vec<u8>) -> Self {
        let request_size = request.len() as i64;
        Self {
            id,
            rule_id,
            service,
            request,
            request_time: Utc::now(),
            request_size,
            response: Vec::new(),
            response_time: None,
            response_size: 0,
        }
    }

    /// Fill in the response half of the record.
    pub fn complete(&mut self, response: Vec<u8>) {
        self.response_size = response.len() as i64;
        self.response = response;
        self.response_time = Some(Utc::now());
    }
}
