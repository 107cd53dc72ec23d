use crate::domain::models::{
    ArfReport, FixEntry, LogEntry, Metrics, ProxyIdentity, Reference, RuleOutcome,
};
use crate::services::arf::{Rule, RuleCatalog, TestResult};
use crate::services::storage::sha256_hex;
use std::collections::HashMap;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ReduceError {
    #[error("rule result {0} has no matching rule in the benchmark")]
    UnknownRule(String),
}

/// Flattens a benchmark and its test result into the report Foreman expects.
///
/// Results keep their document order; `notapplicable` and `notselected`
/// results are dropped before both the log and the metrics. `digest` is taken
/// over `archive`, the bytes exactly as submitted (still compressed).
pub fn reduce(
    catalog: &RuleCatalog,
    test_result: &TestResult,
    archive: &[u8],
    identity: &ProxyIdentity,
) -> Result<ArfReport, ReduceError> {
    let mut logs = Vec::new();
    let mut metrics = Metrics::default();

    for result in &test_result.rule_results {
        if result.outcome.is_skipped() {
            continue;
        }
        let rule = catalog
            .get(&result.id)
            .ok_or_else(|| ReduceError::UnknownRule(result.id.clone()))?;
        logs.push(log_entry(
            &result.id,
            result.outcome,
            rule,
            &test_result.set_values,
        ));
        match result.outcome {
            RuleOutcome::Pass | RuleOutcome::Fixed => metrics.passed += 1,
            RuleOutcome::Fail => metrics.failed += 1,
            _ => metrics.othered += 1,
        }
    }

    Ok(ArfReport {
        logs,
        digest: sha256_hex(archive),
        metrics,
        score: test_result.score,
        openscap_proxy_name: identity.name.clone(),
        openscap_proxy_url: identity.url.clone(),
    })
}

fn log_entry(
    source: &str,
    outcome: RuleOutcome,
    rule: &Rule,
    set_values: &HashMap<String, String>,
) -> LogEntry {
    LogEntry {
        source: source.to_string(),
        result: outcome,
        title: rule.title.clone(),
        description: rule.description.clone(),
        rationale: rule.rationale.clone(),
        references: rule
            .references
            .iter()
            .map(|r| Reference {
                href: r.href.clone(),
                title: r.label.clone(),
            })
            .collect(),
        fixes: rule
            .fixes
            .iter()
            .map(|f| FixEntry {
                id: f.id.clone(),
                system: f.system.clone(),
                full_text: f.full_text(set_values),
            })
            .collect(),
        severity: rule.severity.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{reduce, ReduceError};
    use crate::domain::models::{Metrics, ProxyIdentity, RuleOutcome};
    use crate::services::arf::{parse_arf, RuleResult, TestResult};
    use sha2::{Digest, Sha256};

    const FIXTURE: &[u8] = include_bytes!("../../tests/fixtures/arf-report.xml");

    fn identity() -> ProxyIdentity {
        ProxyIdentity {
            name: Some("proxy.example.com".to_string()),
            url: Some("https://proxy.example.com:9090".to_string()),
        }
    }

    #[test]
    fn skipped_outcomes_never_reach_logs_or_metrics() {
        let doc = parse_arf(FIXTURE).unwrap();
        let report = reduce(&doc.catalog, &doc.test_result, b"archive", &identity()).unwrap();

        let sources: Vec<&str> = report.logs.iter().map(|l| l.source.as_str()).collect();
        assert_eq!(
            sources,
            vec![
                "xccdf_org.example_rule_password_minlen",
                "xccdf_org.example_rule_no_empty_passwords",
                "xccdf_org.example_rule_auditd_enabled",
                "xccdf_org.example_rule_sshd_disable_root_login",
            ]
        );
        assert!(report.logs.iter().all(|l| !l.result.is_skipped()));
        assert_eq!(
            report.metrics,
            Metrics {
                passed: 2,
                failed: 1,
                othered: 1
            }
        );
        let counted = report.metrics.passed + report.metrics.failed + report.metrics.othered;
        assert_eq!(counted, report.logs.len());
    }

    #[test]
    fn entries_join_rule_metadata_and_render_fixes() {
        let doc = parse_arf(FIXTURE).unwrap();
        let report = reduce(&doc.catalog, &doc.test_result, b"archive", &identity()).unwrap();

        let minlen = &report.logs[0];
        assert_eq!(minlen.result, RuleOutcome::Fail);
        assert_eq!(minlen.title, "Set Password Minimum Length");
        assert_eq!(minlen.rationale, "Short passwords are easier to guess.");
        assert_eq!(minlen.severity, "medium");
        assert_eq!(minlen.references[0].title, "5.3.1");
        assert_eq!(
            minlen.references[0].href.as_deref(),
            Some("https://www.cisecurity.org/benchmark/red_hat_linux/")
        );
        assert_eq!(minlen.fixes.len(), 2);
        assert!(minlen.fixes[0].full_text.contains("var_password_minlen=\"14\""));
        assert!(minlen.fixes[1].full_text.contains("minlen = 14"));

        let auditd = &report.logs[2];
        assert_eq!(auditd.severity, "unknown");
        assert!(auditd.references.is_empty());
        assert!(auditd.fixes.is_empty());

        assert_eq!(report.score, Some(66.666664));
        assert_eq!(report.openscap_proxy_name.as_deref(), Some("proxy.example.com"));
    }

    #[test]
    fn digest_covers_the_submitted_bytes() {
        let doc = parse_arf(FIXTURE).unwrap();
        let archive = b"BZh91AY&SY compressed bytes";
        let report = reduce(&doc.catalog, &doc.test_result, archive, &identity()).unwrap();
        assert_eq!(report.digest, hex::encode(Sha256::digest(archive)));
        assert_ne!(report.digest, hex::encode(Sha256::digest(FIXTURE)));
    }

    #[test]
    fn result_without_rule_is_an_error() {
        let doc = parse_arf(FIXTURE).unwrap();
        let results = TestResult {
            rule_results: vec![RuleResult {
                id: "xccdf_org.example_rule_missing".to_string(),
                outcome: RuleOutcome::Pass,
            }],
            ..TestResult::default()
        };
        assert_eq!(
            reduce(&doc.catalog, &results, b"", &identity()),
            Err(ReduceError::UnknownRule(
                "xccdf_org.example_rule_missing".to_string()
            ))
        );
    }

    #[test]
    fn skipped_result_without_rule_is_ignored() {
        let doc = parse_arf(FIXTURE).unwrap();
        let results = TestResult {
            rule_results: vec![RuleResult {
                id: "xccdf_org.example_rule_missing".to_string(),
                outcome: RuleOutcome::Notselected,
            }],
            ..TestResult::default()
        };
        let report = reduce(&doc.catalog, &results, b"", &identity()).unwrap();
        assert!(report.logs.is_empty());
        assert_eq!(report.metrics, Metrics::default());
        assert_eq!(report.score, None);
    }
}
