use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} is not a valid path component: {value:?}")]
    InvalidComponent { field: &'static str, value: String },
}

/// Storage address of one archive inside a tier: `<cname>/<id>/<date>`.
///
/// Every component becomes a directory name, so construction rejects
/// separators and dot segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveKey {
    cname: String,
    id: String,
    date: String,
}

impl ArchiveKey {
    pub fn new(cname: &str, id: &str, date: &str) -> Result<Self, KeyError> {
        Ok(Self {
            cname: path_component("cname", cname)?,
            id: path_component("id", id)?,
            date: path_component("date", date)?,
        })
    }

    pub fn cname(&self) -> &str {
        &self.cname
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> &str {
        &self.date
    }
}

fn path_component(field: &'static str, raw: &str) -> Result<String, KeyError> {
    if raw.is_empty() {
        return Err(KeyError::Empty { field });
    }
    if raw == "." || raw == ".." || raw.contains(['/', '\\', '\0']) {
        return Err(KeyError::InvalidComponent {
            field,
            value: raw.to_string(),
        });
    }
    Ok(raw.to_string())
}

/// Context of one inbound archive: who sent it, for which policy, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    reported_at: i64,
    policy_key: ArchiveKey,
}

impl Submission {
    pub fn new(cname: &str, policy: &str, reported_at: i64) -> Result<Self, KeyError> {
        Ok(Self {
            reported_at,
            policy_key: ArchiveKey::new(cname, policy, &reported_at.to_string())?,
        })
    }

    pub fn cname(&self) -> &str {
        self.policy_key.cname()
    }

    pub fn policy(&self) -> &str {
        self.policy_key.id()
    }

    pub fn reported_at(&self) -> i64 {
        self.reported_at
    }

    /// Key used before Foreman has assigned a report id.
    pub fn policy_key(&self) -> &ArchiveKey {
        &self.policy_key
    }

    /// Key for the report id Foreman assigned on upload.
    pub fn report_key(&self, id: &str) -> Result<ArchiveKey, KeyError> {
        ArchiveKey::new(self.cname(), id, self.policy_key.date())
    }
}

/// One of the four sibling directory trees an archive can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Reports,
    Spool,
    Failed,
    Corrupted,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Reports => "reports",
            Tier::Spool => "spool",
            Tier::Failed => "failed",
            Tier::Corrupted => "corrupted",
        };
        f.write_str(name)
    }
}

/// XCCDF rule-result values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOutcome {
    Pass,
    Fail,
    Error,
    Unknown,
    Notapplicable,
    Notchecked,
    Notselected,
    Informational,
    Fixed,
}

impl RuleOutcome {
    /// Outcomes that never reach the report or its metrics.
    pub fn is_skipped(self) -> bool {
        matches!(self, RuleOutcome::Notapplicable | RuleOutcome::Notselected)
    }
}

impl FromStr for RuleOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(RuleOutcome::Pass),
            "fail" => Ok(RuleOutcome::Fail),
            "error" => Ok(RuleOutcome::Error),
            "unknown" => Ok(RuleOutcome::Unknown),
            "notapplicable" => Ok(RuleOutcome::Notapplicable),
            "notchecked" => Ok(RuleOutcome::Notchecked),
            "notselected" => Ok(RuleOutcome::Notselected),
            "informational" => Ok(RuleOutcome::Informational),
            "fixed" => Ok(RuleOutcome::Fixed),
            other => Err(other.to_string()),
        }
    }
}

/// Registered name/URL of this proxy, stamped into every report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyIdentity {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub passed: usize,
    pub failed: usize,
    pub othered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub href: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixEntry {
    pub id: Option<String>,
    pub system: Option<String>,
    pub full_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub source: String,
    pub result: RuleOutcome,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub references: Vec<Reference>,
    pub fixes: Vec<FixEntry>,
    pub severity: String,
}

/// Reduced ARF report as uploaded to Foreman.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArfReport {
    pub logs: Vec<LogEntry>,
    pub digest: String,
    pub metrics: Metrics,
    pub score: Option<f64>,
    pub openscap_proxy_name: Option<String>,
    pub openscap_proxy_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OvalReference {
    pub ref_id: String,
    pub ref_url: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OvalResult {
    pub id: String,
    pub result: String,
    pub title: String,
    pub definition_class: Option<String>,
    pub references: Vec<OvalReference>,
}

/// Reduced OVAL report as uploaded to Foreman.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OvalReport {
    pub oval_results: Vec<OvalResult>,
    pub openscap_proxy_name: Option<String>,
    pub openscap_proxy_url: Option<String>,
}

/// Terminal state of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Uploaded and persisted in the reports tier.
    Stored,
    /// Upload failed transiently; archive parked in the spool tier.
    Spooled,
    /// Archive could not be read as a report; parked in the corrupted tier.
    Corrupted,
    /// Uploaded, but the reports tier write failed; archive parked in the failed tier.
    FailedToStore,
    /// Foreman refused the report (HTTP 422). Nothing is persisted.
    Rejected,
    /// OVAL report delivered. OVAL archives are never persisted.
    Uploaded,
    /// OVAL report not delivered and not persisted.
    Dropped,
    /// A fallback tier could not be written either. Nothing was kept.
    Halted,
}

impl Outcome {
    pub fn is_delivered(self) -> bool {
        matches!(
            self,
            Outcome::Stored | Outcome::FailedToStore | Outcome::Uploaded
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    pub outcome: Outcome,
    pub status: u16,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredArchive {
    pub cname: String,
    pub id: String,
    pub date: String,
    pub digest: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct SpoolErrorsReport {
    pub errors_count: usize,
    pub archives: Vec<StoredArchive>,
}

#[derive(Debug, Serialize)]
pub struct DeleteReport {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct FetchReport {
    pub path: String,
    pub size: usize,
    pub digest: String,
    pub content_type: &'static str,
}
