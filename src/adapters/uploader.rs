//! HTTP batch uploader (optional, off by default).
//!
//! Implements [`UploadPort`] against the backend's batch endpoint:
//!
//! ```text
//!   POST /emg/records
//!   [{"timestamp": 5000, "rawValue": 100}, ...]
//!   → 201 {"status": "Data Saved", "count": 2}
//! ```
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client::EspHttpConnection`
//!   with the configured timeout as the only bound on blocking.
//! - **all other targets**: payloads are kept in memory and answered
//!   with a configurable status, for host tests.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::UploadPort;
use crate::error::UploadError;
use crate::sample_buffer::Sample;

#[derive(Serialize)]
struct RecordOut {
    timestamp: u64,
    #[serde(rename = "rawValue")]
    raw_value: i16,
}

#[derive(Deserialize)]
struct Ack {
    count: Option<usize>,
}

/// JSON body for one batch.
pub fn encode_batch(batch: &[Sample]) -> Result<Vec<u8>, UploadError> {
    let records: Vec<RecordOut> = batch
        .iter()
        .map(|s| RecordOut {
            timestamp: s.timestamp,
            raw_value: s.value,
        })
        .collect();
    serde_json::to_vec(&records).map_err(|_| UploadError::Encode)
}

/// Interpret the backend's answer.  A 2xx without a readable count is
/// taken as the whole batch.
pub fn parse_ack(status: u16, body: &[u8], sent: usize) -> Result<usize, UploadError> {
    if !(200..300).contains(&status) {
        return Err(UploadError::Rejected(status));
    }
    let count = serde_json::from_slice::<Ack>(body)
        .ok()
        .and_then(|a| a.count)
        .unwrap_or(sent);
    Ok(count)
}

pub struct HttpUploader {
    endpoint: heapless::String<96>,
    timeout_ms: u32,
    batches: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_status: u16,
    #[cfg(not(target_os = "espidf"))]
    sim_sent: Vec<Vec<u8>>,
}

impl HttpUploader {
    pub fn new(endpoint: &str, timeout_ms: u32) -> Self {
        let mut ep = heapless::String::new();
        for ch in endpoint.chars() {
            if ep.push(ch).is_err() {
                warn!("Upload: endpoint truncated to {} bytes", ep.len());
                break;
            }
        }
        Self {
            endpoint: ep,
            timeout_ms,
            batches: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_status: 201,
            #[cfg(not(target_os = "espidf"))]
            sim_sent: Vec::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Batches handed to the transport since boot.
    pub fn batches(&self) -> u32 {
        self.batches
    }

    /// Status the simulated backend answers with.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_status(&mut self, status: u16) {
        self.sim_status = status;
    }

    /// Bodies the simulated backend has received.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> &[Vec<u8>] {
        &self.sim_sent
    }

    #[cfg(target_os = "espidf")]
    fn post(&mut self, body: &[u8]) -> Result<(u16, Vec<u8>), UploadError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(core::time::Duration::from_millis(u64::from(self.timeout_ms))),
            ..Default::default()
        })
        .map_err(|_| UploadError::Transport)?;

        let len = body.len().to_string();
        let headers = [("Content-Type", "application/json"), ("Content-Length", len.as_str())];
        conn.initiate_request(Method::Post, &self.endpoint, &headers)
            .map_err(|_| UploadError::Transport)?;

        let mut written = 0;
        while written < body.len() {
            written += conn
                .write(&body[written..])
                .map_err(|_| UploadError::Transport)?;
        }

        conn.initiate_response().map_err(|_| UploadError::Transport)?;
        let status = conn.status();

        let mut reply = Vec::new();
        let mut chunk = [0u8; 128];
        loop {
            let n = conn.read(&mut chunk).map_err(|_| UploadError::Transport)?;
            if n == 0 || reply.len() > 1024 {
                break;
            }
            reply.extend_from_slice(&chunk[..n]);
        }
        Ok((status, reply))
    }

    #[cfg(not(target_os = "espidf"))]
    fn post(&mut self, body: &[u8]) -> Result<(u16, Vec<u8>), UploadError> {
        debug!("Upload(sim): POST {} ({} bytes, timeout {}ms)", self.endpoint, body.len(), self.timeout_ms);
        self.sim_sent.push(body.to_vec());
        let count = serde_json::from_slice::<Vec<serde_json::Value>>(body)
            .map(|v| v.len())
            .map_err(|_| UploadError::Encode)?;
        let reply = format!("{{\"status\":\"Data Saved\",\"count\":{}}}", count);
        Ok((self.sim_status, reply.into_bytes()))
    }
}

impl UploadPort for HttpUploader {
    fn submit(&mut self, batch: &[Sample]) -> Result<usize, UploadError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let body = encode_batch(batch)?;
        self.batches = self.batches.saturating_add(1);
        let (status, reply) = self.post(&body)?;
        let accepted = parse_ack(status, &reply, batch.len())?;
        info!("Upload: {} records accepted (HTTP {})", accepted, status);
        Ok(accepted)
    }
}
