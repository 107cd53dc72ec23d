//! Ingestion pipeline: decompress → reduce → upload → store.
//!
//! Every stage failure ends in exactly one terminal [`Outcome`]:
//!
//! | failure                        | tier      | outcome         |
//! |--------------------------------|-----------|-----------------|
//! | decompression, malformed XML   | corrupted | `Corrupted`     |
//! | transport / non-2xx / bad body | spool     | `Spooled`       |
//! | HTTP 422                       | none      | `Rejected`      |
//! | reports tier write             | failed    | `FailedToStore` |
//! | none                           | reports   | `Stored`        |
//!
//! A write failure in a fallback tier ends in `Halted` (status 500). After a
//! successful upload the halted body still carries Foreman's reply.
//! OVAL reports take the same path up to the upload but are never persisted.

use crate::domain::constants::{OVAL_PARSE_FAILURE, STORAGE_FAILURE_NOTE};
use crate::domain::models::{ArchiveKey, Outcome, SubmitReport, Submission, Tier};
use crate::services::decompress::{DecompressError, Decompressor};
use crate::services::report_kind::{ArfKind, OvalKind, ReportKind};
use crate::services::settings::Settings;
use crate::services::storage::TieredStorage;
use crate::services::upload::{UploadError, Uploader};
use crate::services::xml::ParseError;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{error, info, warn};

enum Failure {
    Decompress(DecompressError),
    Parse(ParseError),
    Rejected(String),
    Transport(String),
}

impl From<UploadError> for Failure {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Rejected(m) => Failure::Rejected(m),
            UploadError::Transport(m) => Failure::Transport(m),
        }
    }
}

fn respond(outcome: Outcome, status: u16, body: Value) -> SubmitReport {
    SubmitReport {
        outcome,
        status,
        body,
    }
}

fn result_body(message: &str) -> Value {
    json!({ "result": message })
}

/// Adds a proxy note to Foreman's reply without replacing any of its fields.
fn annotate(upstream: &mut Map<String, Value>, note: &str) {
    let key = if upstream.contains_key("result") {
        "proxy_result"
    } else {
        "result"
    };
    upstream.insert(key.to_string(), json!(note));
}

fn upstream_id(upstream: &Map<String, Value>) -> Option<String> {
    match upstream.get("id")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn rfc3339(secs: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

pub struct IngestionPipeline<U> {
    storage: TieredStorage,
    decompressor: Decompressor,
    uploader: U,
    timeout: Option<Duration>,
    arf: ArfKind,
    oval: OvalKind,
}

impl<U: Uploader> IngestionPipeline<U> {
    pub fn new(settings: &Settings, uploader: U) -> anyhow::Result<Self> {
        Ok(Self {
            storage: TieredStorage::new(settings),
            decompressor: Decompressor::new(&settings.decompress_command)?,
            uploader,
            timeout: settings.upload_timeout(),
            arf: ArfKind {
                identity: settings.proxy_identity(),
            },
            oval: OvalKind {
                identity: settings.proxy_identity(),
            },
        })
    }

    fn forward<K: ReportKind>(
        &self,
        kind: &K,
        submission: &Submission,
        archive: &[u8],
    ) -> Result<Map<String, Value>, Failure> {
        let xml = self
            .decompressor
            .decompress(archive)
            .map_err(Failure::Decompress)?;
        let report = kind.parse_report(archive, &xml).map_err(Failure::Parse)?;
        let body = serde_json::to_string(&report).map_err(|e| Failure::Parse(e.into()))?;
        Ok(self
            .uploader
            .upload(&kind.upload_path(submission), &body, self.timeout)?)
    }

    pub fn submit_arf(&self, submission: &Submission, archive: &[u8]) -> SubmitReport {
        let uploaded = self
            .forward(&self.arf, submission, archive)
            .and_then(|upstream| {
                let id = upstream_id(&upstream).ok_or_else(|| {
                    Failure::Transport("malformed response: no report id".to_string())
                })?;
                let key = submission
                    .report_key(&id)
                    .map_err(|e| Failure::Transport(format!("malformed response: {}", e)))?;
                Ok((key, upstream))
            });

        match uploaded {
            Ok((key, upstream)) => self.persist(&key, archive, upstream),
            Err(Failure::Decompress(e)) => {
                let message = e.to_string();
                error!(
                    cname = submission.cname(),
                    "{}, moving to {}",
                    message,
                    self.storage.tier_dir(Tier::Corrupted).display()
                );
                self.park(Tier::Corrupted, Outcome::Corrupted, submission, archive, &message)
            }
            Err(Failure::Parse(e)) => {
                let message = format!(
                    "Failed to parse Arf Report, moving to {}",
                    self.storage.tier_dir(Tier::Corrupted).display()
                );
                error!(cname = submission.cname(), cause = %e, "{}", message);
                self.park(
                    Tier::Corrupted,
                    Outcome::Corrupted,
                    submission,
                    archive,
                    &format!("{} on proxy", message),
                )
            }
            Err(Failure::Rejected(message)) => {
                warn!(cname = submission.cname(), "Foreman rejected report: {}", message);
                respond(Outcome::Rejected, 200, result_body(&message))
            }
            Err(Failure::Transport(cause)) => {
                let message = format!(
                    "Failed to upload to Foreman, saving in spool. Failed with: {}",
                    cause
                );
                error!(cname = submission.cname(), "{}", message);
                self.park(Tier::Spool, Outcome::Spooled, submission, archive, &message)
            }
        }
    }

    /// Stores an uploaded archive under its Foreman id. A reports tier failure
    /// moves it to the failed tier; the client still gets Foreman's answer,
    /// including when the failed tier cannot be written either.
    fn persist(
        &self,
        key: &ArchiveKey,
        archive: &[u8],
        mut upstream: Map<String, Value>,
    ) -> SubmitReport {
        let e = match self.storage.store(Tier::Reports, key, archive) {
            Ok(path) => {
                info!(id = key.id(), path = %path.display(), "report uploaded and stored");
                return respond(Outcome::Stored, 200, Value::Object(upstream));
            }
            Err(e) => e,
        };

        let reports = self.storage.tier_dir(Tier::Reports).display();
        let failed = self.storage.tier_dir(Tier::Failed).display();
        error!(
            "Failed to save Report in reports directory ({}). Failed with: {}. \
             Saving file in {}. Please copy manually to {}",
            reports, e, failed, reports
        );
        match self.storage.store(Tier::Failed, key, archive) {
            Ok(_) => {
                annotate(&mut upstream, STORAGE_FAILURE_NOTE);
                respond(Outcome::FailedToStore, 200, Value::Object(upstream))
            }
            Err(e) => {
                error!(id = key.id(), "archive of uploaded report was not kept: {}", e);
                annotate(&mut upstream, &e.to_string());
                respond(Outcome::Halted, 500, Value::Object(upstream))
            }
        }
    }

    /// Keeps an archive that was not uploaded, keyed by policy id.
    fn park(
        &self,
        tier: Tier,
        outcome: Outcome,
        submission: &Submission,
        archive: &[u8],
        message: &str,
    ) -> SubmitReport {
        match self.storage.store(tier, submission.policy_key(), archive) {
            Ok(_) => respond(outcome, 200, result_body(message)),
            Err(e) => {
                error!(cname = submission.cname(), "{}", e);
                respond(Outcome::Halted, 500, result_body(&e.to_string()))
            }
        }
    }

    pub fn submit_oval(&self, submission: &Submission, archive: &[u8]) -> SubmitReport {
        match self.forward(&self.oval, submission, archive) {
            Ok(_) => {
                info!(cname = submission.cname(), "OVAL report uploaded");
                respond(
                    Outcome::Uploaded,
                    200,
                    json!({ "reported_at": rfc3339(submission.reported_at()) }),
                )
            }
            Err(Failure::Transport(cause)) => {
                let message = format!("Failed to upload to Foreman, failed with: {}", cause);
                error!(cname = submission.cname(), "{}", message);
                respond(Outcome::Dropped, 200, result_body(&message))
            }
            Err(Failure::Parse(e)) => {
                error!(cname = submission.cname(), cause = %e, "{}", OVAL_PARSE_FAILURE);
                respond(Outcome::Dropped, 200, result_body(OVAL_PARSE_FAILURE))
            }
            Err(Failure::Decompress(e)) => {
                error!(cname = submission.cname(), "{}", e);
                respond(Outcome::Dropped, 200, result_body(&e.to_string()))
            }
            Err(Failure::Rejected(message)) => {
                warn!(cname = submission.cname(), "Foreman rejected report: {}", message);
                respond(Outcome::Rejected, 200, result_body(&message))
            }
        }
    }
}
