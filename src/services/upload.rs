use crate::domain::constants::{API_ACCEPT, JSON_CONTENT_TYPE};
use crate::services::settings::Settings;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Foreman refused the report on business rules (HTTP 422). Not retryable.
    #[error("{0}")]
    Rejected(String),
    /// Anything else: connection failures, timeouts, non-2xx, unreadable bodies.
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        UploadError::Transport(e.to_string())
    }
}

/// Delivery of a JSON report to Foreman.
pub trait Uploader {
    /// POSTs `body` to `path` (relative to the upstream base) and returns the
    /// decoded JSON object Foreman answered with.
    fn upload(
        &self,
        path: &str,
        body: &str,
        timeout: Option<Duration>,
    ) -> Result<Map<String, Value>, UploadError>;
}

pub struct UploadClient {
    client: Client,
    base_url: String,
}

impl UploadClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(ca) = &settings.ssl_ca {
            let pem = std::fs::read(ca)?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }
        if let (Some(cert), Some(key)) = (&settings.ssl_certificate, &settings.ssl_private_key) {
            let mut pem = std::fs::read(cert)?;
            pem.push(b'\n');
            pem.extend(std::fs::read(key)?);
            builder = builder.identity(reqwest::Identity::from_pem(&pem)?);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: settings.foreman_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Uploader for UploadClient {
    fn upload(
        &self,
        path: &str,
        body: &str,
        timeout: Option<Duration>,
    ) -> Result<Map<String, Value>, UploadError> {
        let mut request = self
            .client
            .post(self.endpoint(path))
            .header(ACCEPT, API_ACCEPT)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body.to_string());
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            debug!(status = %status, body = %text, "received error response from Foreman");
            let message = rejection_message(status, &text);
            return Err(if status == StatusCode::UNPROCESSABLE_ENTITY {
                UploadError::Rejected(message)
            } else {
                UploadError::Transport(message)
            });
        }

        let text = response.text()?;
        match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(UploadError::Transport(
                "malformed response: expected a JSON object".to_string(),
            )),
            Err(e) => Err(UploadError::Transport(format!("malformed response: {}", e))),
        }
    }
}

/// Message Foreman attached to an error response, falling back to the status line.
fn rejection_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_body = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.pointer("/error/full_messages/0"))
            .or_else(|| v.get("message"))
            .and_then(Value::as_str)
    });
    match from_body {
        Some(msg) => msg.to_string(),
        None => format!(
            "{} {:?}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        ),
    }
}
