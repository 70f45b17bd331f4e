//! # KHQR Status-Check Client
//!
//! Thin client for the KHQR gateway's transaction status endpoint.
//!
//! The gateway is a black box to this system: given a payment reference
//! hash it answers success/failure plus gateway-specific data. This core
//! deliberately does NOT re-validate amount/currency from the response -
//! that reconciliation belongs to the gateway relationship, not the till.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Gateway's answer for one payment reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KhqrStatus {
    /// Whether the gateway confirms the payment.
    pub success: bool,
    /// Gateway message (e.g. "Success", "Transaction not found").
    pub message: String,
    /// Opaque gateway payload, passed through for receipts/audit.
    pub data: Option<Value>,
}

/// Client-side failures talking to the gateway.
#[derive(Debug, Error)]
pub enum KhqrError {
    #[error("KHQR gateway request failed: {0}")]
    Request(String),

    #[error("KHQR gateway returned an unreadable response: {0}")]
    BadResponse(String),
}

/// Raw wire shape of the status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "responseCode")]
    response_code: i64,
    #[serde(rename = "responseMessage", default)]
    response_message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// HTTP client for the KHQR gateway.
#[derive(Debug, Clone)]
pub struct KhqrClient {
    http: reqwest::Client,
    base_url: String,
}

impl KhqrClient {
    /// Creates a client against the gateway base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        KhqrClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Checks the status of a payment by its reference hash.
    pub async fn check_status(&self, reference_md5: &str) -> Result<KhqrStatus, KhqrError> {
        let url = format!("{}/v1/check_transaction_by_md5", self.base_url);
        debug!(%url, "Checking KHQR transaction status");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "md5": reference_md5 }))
            .send()
            .await
            .map_err(|e| KhqrError::Request(e.to_string()))?;

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| KhqrError::BadResponse(e.to_string()))?;

        Ok(KhqrStatus {
            // Gateway convention: responseCode 0 means the transaction
            // exists and succeeded.
            success: status.response_code == 0,
            message: status.response_message,
            data: status.data,
        })
    }
}
