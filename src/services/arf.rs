//! XCCDF benchmark and test-result model read out of an ARF document.
//!
//! Only what the reducer consumes is kept: rule metadata (title,
//! description, rationale, severity, references, fix templates) and the
//! test result (rule outcomes, scan-time value bindings, score).

use crate::domain::models::RuleOutcome;
use crate::services::xml::{
    child, child_text, collapse_whitespace, first_descendant, is_named, required_attribute,
    text_content, utf8, ParseError,
};
use roxmltree::{Document, Node};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RuleReference {
    pub href: Option<String>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
enum FixPart {
    Text(String),
    Sub(String),
}

/// Remediation template: literal text interleaved with `<sub idref>` slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub id: Option<String>,
    pub system: Option<String>,
    parts: Vec<FixPart>,
}

impl Fix {
    /// Renders the template with scan-time bindings. Unbound slots render empty.
    pub fn full_text(&self, set_values: &HashMap<String, String>) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                FixPart::Text(text) => text.as_str(),
                FixPart::Sub(idref) => set_values.get(idref).map(String::as_str).unwrap_or(""),
            })
            .collect()
    }

    fn from_node(node: Node) -> Self {
        let parts = node
            .children()
            .filter_map(|c| {
                if c.is_text() {
                    c.text().map(|t| FixPart::Text(t.to_string()))
                } else if is_named(&c, "sub") {
                    c.attribute("idref").map(|r| FixPart::Sub(r.to_string()))
                } else if c.is_element() {
                    Some(FixPart::Text(text_content(c)))
                } else {
                    None
                }
            })
            .collect();
        Self {
            id: node.attribute("id").map(str::to_string),
            system: node.attribute("system").map(str::to_string),
            parts,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub severity: String,
    pub references: Vec<RuleReference>,
    pub fixes: Vec<Fix>,
}

impl Rule {
    fn from_node(node: Node) -> Result<Self, ParseError> {
        let references = node
            .children()
            .filter(|c| is_named(c, "reference"))
            .map(|c| RuleReference {
                href: c.attribute("href").map(str::to_string),
                label: collapse_whitespace(&text_content(c)),
            })
            .collect();
        let fixes = node
            .children()
            .filter(|c| is_named(c, "fix"))
            .map(Fix::from_node)
            .collect();
        Ok(Self {
            id: required_attribute(node, "Rule", "id")?,
            title: child_text(node, "title"),
            description: child_text(node, "description"),
            rationale: child_text(node, "rationale"),
            severity: node.attribute("severity").unwrap_or("unknown").to_string(),
            references,
            fixes,
        })
    }
}

/// Rules of one benchmark, keyed by rule id. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: HashMap<String, Rule>,
}

impl RuleCatalog {
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl FromIterator<Rule> for RuleCatalog {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleResult {
    pub id: String,
    pub outcome: RuleOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct TestResult {
    pub rule_results: Vec<RuleResult>,
    pub set_values: HashMap<String, String>,
    pub score: Option<f64>,
}

impl TestResult {
    fn from_node(node: Node) -> Result<Self, ParseError> {
        let mut rule_results = Vec::new();
        let mut set_values = HashMap::new();
        for c in node.children().filter(Node::is_element) {
            match c.tag_name().name() {
                "rule-result" => {
                    let id = required_attribute(c, "rule-result", "idref")?;
                    let raw = child(c, "result")
                        .map(|r| text_content(r).trim().to_string())
                        .ok_or(ParseError::MissingElement("result"))?;
                    let outcome =
                        raw.parse::<RuleOutcome>()
                            .map_err(|value| ParseError::InvalidOutcome {
                                rule: id.clone(),
                                value,
                            })?;
                    rule_results.push(RuleResult { id, outcome });
                }
                "set-value" => {
                    let idref = required_attribute(c, "set-value", "idref")?;
                    set_values.insert(idref, text_content(c));
                }
                _ => {}
            }
        }
        let score =
            child(node, "score").and_then(|s| text_content(s).trim().parse::<f64>().ok());
        Ok(Self {
            rule_results,
            set_values,
            score,
        })
    }
}

/// A parsed ARF document: the benchmark's rules plus the first test result.
#[derive(Debug, Clone)]
pub struct ArfDocument {
    pub catalog: RuleCatalog,
    pub test_result: TestResult,
}

pub fn parse_arf(xml: &[u8]) -> Result<ArfDocument, ParseError> {
    let doc = Document::parse(utf8(xml)?)?;
    let benchmark = first_descendant(doc.root(), "Benchmark")?;
    let catalog = benchmark
        .descendants()
        .filter(|n| is_named(n, "Rule"))
        .map(Rule::from_node)
        .collect::<Result<RuleCatalog, _>>()?;
    let test_result = TestResult::from_node(first_descendant(doc.root(), "TestResult")?)?;
    Ok(ArfDocument {
        catalog,
        test_result,
    })
}

#[cfg(test)]
mod tests {
    use super::parse_arf;
    use crate::domain::models::RuleOutcome;
    use crate::services::xml::ParseError;

    const FIXTURE: &[u8] = include_bytes!("../../tests/fixtures/arf-report.xml");
    const MINLEN: &str = "xccdf_org.example_rule_password_minlen";

    #[test]
    fn catalog_holds_every_rule_including_nested_groups() {
        let doc = parse_arf(FIXTURE).unwrap();
        assert_eq!(doc.catalog.len(), 6);

        let rule = doc.catalog.get(MINLEN).unwrap();
        assert_eq!(rule.title, "Set Password Minimum Length");
        assert_eq!(
            rule.description,
            "The minimum password length should be at least 12 characters."
        );
        assert_eq!(rule.severity, "medium");
        assert_eq!(rule.references.len(), 2);
        assert_eq!(rule.references[1].label, "IA-5(1)(a)");
        assert_eq!(rule.fixes.len(), 2);
    }

    #[test]
    fn test_result_keeps_document_order_and_bindings() {
        let doc = parse_arf(FIXTURE).unwrap();
        let outcomes: Vec<RuleOutcome> = doc
            .test_result
            .rule_results
            .iter()
            .map(|r| r.outcome)
            .collect();
        assert_eq!(
            outcomes,
            vec![
                RuleOutcome::Fail,
                RuleOutcome::Pass,
                RuleOutcome::Notapplicable,
                RuleOutcome::Notselected,
                RuleOutcome::Error,
                RuleOutcome::Fixed,
            ]
        );
        assert_eq!(
            doc.test_result
                .set_values
                .get("xccdf_org.example_value_var_password_minlen")
                .map(String::as_str),
            Some("14")
        );
        assert_eq!(doc.test_result.score, Some(66.666664));
    }

    #[test]
    fn fix_template_interpolates_bindings() {
        let doc = parse_arf(FIXTURE).unwrap();
        let fix = &doc.catalog.get(MINLEN).unwrap().fixes[0];
        assert_eq!(fix.system.as_deref(), Some("urn:xccdf:fix:script:sh"));

        let text = fix.full_text(&doc.test_result.set_values);
        assert!(text.starts_with("var_password_minlen=\"14\"\n"));

        let unbound = fix.full_text(&Default::default());
        assert!(unbound.starts_with("var_password_minlen=\"\"\n"));
    }

    #[test]
    fn non_report_xml_is_a_parse_error() {
        assert!(matches!(parse_arf(b"<html/>"), Err(ParseError::MissingElement("Benchmark"))));
        assert!(matches!(parse_arf(b"<Benchmark><Rule"), Err(ParseError::Xml(_))));
        assert!(matches!(parse_arf(&[0xff, 0xfe, 0x00]), Err(ParseError::Encoding(_))));
    }

    #[test]
    fn unknown_result_value_is_rejected() {
        let xml = br#"<r><Benchmark/><TestResult>
            <rule-result idref="x"><result>maybe</result></rule-result>
        </TestResult></r>"#;
        assert!(matches!(
            parse_arf(xml),
            Err(ParseError::InvalidOutcome { value, .. }) if value == "maybe"
        ));
    }
}
