use crate::domain::constants::UPLOAD_API_PREFIX;
use crate::domain::models::{ArfReport, OvalReport, ProxyIdentity, Submission};
use crate::services::arf::parse_arf;
use crate::services::oval::parse_oval;
use crate::services::reducer::reduce;
use crate::services::xml::ParseError;
use serde::Serialize;
use tracing::debug;

/// What varies between report formats: how the decompressed document is
/// reduced, and which Foreman resource receives it.
pub trait ReportKind {
    type Report: Serialize;

    /// Upload resource segment, e.g. `arf_reports`.
    fn resource(&self) -> &'static str;

    /// `archive` is the submitted (compressed) payload, `xml` its decompressed form.
    fn parse_report(&self, archive: &[u8], xml: &[u8]) -> Result<Self::Report, ParseError>;

    fn upload_path(&self, submission: &Submission) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            UPLOAD_API_PREFIX,
            self.resource(),
            submission.cname(),
            submission.policy(),
            submission.reported_at()
        )
    }
}

pub struct ArfKind {
    pub identity: ProxyIdentity,
}

impl ReportKind for ArfKind {
    type Report = ArfReport;

    fn resource(&self) -> &'static str {
        "arf_reports"
    }

    fn parse_report(&self, archive: &[u8], xml: &[u8]) -> Result<ArfReport, ParseError> {
        let doc = parse_arf(xml)?;
        debug!(
            rules = doc.catalog.len(),
            results = doc.test_result.rule_results.len(),
            "parsed ARF document"
        );
        Ok(reduce(
            &doc.catalog,
            &doc.test_result,
            archive,
            &self.identity,
        )?)
    }
}

pub struct OvalKind {
    pub identity: ProxyIdentity,
}

impl ReportKind for OvalKind {
    type Report = OvalReport;

    fn resource(&self) -> &'static str {
        "oval_reports"
    }

    fn parse_report(&self, _archive: &[u8], xml: &[u8]) -> Result<OvalReport, ParseError> {
        parse_oval(xml, &self.identity)
    }
}
