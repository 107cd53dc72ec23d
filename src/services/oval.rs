use crate::domain::constants::OVAL_NOT_EVALUATED;
use crate::domain::models::{OvalReference, OvalReport, OvalResult, ProxyIdentity};
use crate::services::xml::{
    child, child_text, first_descendant, is_named, required_attribute, utf8, ParseError,
};
use roxmltree::Document;
use std::collections::HashMap;

/// Reduces an OVAL results document to one entry per definition, in
/// definition order, each carrying its evaluation result.
pub fn parse_oval(xml: &[u8], identity: &ProxyIdentity) -> Result<OvalReport, ParseError> {
    let doc = Document::parse(utf8(xml)?)?;
    let definitions = first_descendant(doc.root(), "oval_definitions")?;
    let results_section = first_descendant(doc.root(), "results")?;

    let mut results = HashMap::new();
    for d in results_section
        .descendants()
        .filter(|n| is_named(n, "definition"))
    {
        let id = required_attribute(d, "definition", "definition_id")?;
        let result = d.attribute("result").unwrap_or(OVAL_NOT_EVALUATED);
        results.insert(id, result.to_string());
    }

    let mut oval_results = Vec::new();
    for d in definitions
        .descendants()
        .filter(|n| is_named(n, "definition"))
    {
        let id = required_attribute(d, "definition", "id")?;
        let metadata = child(d, "metadata");
        let references = metadata
            .map(|m| {
                m.children()
                    .filter(|c| is_named(c, "reference"))
                    .filter_map(|c| {
                        Some(OvalReference {
                            ref_id: c.attribute("ref_id")?.to_string(),
                            ref_url: c.attribute("ref_url").map(str::to_string),
                            source: c.attribute("source").map(str::to_string),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        oval_results.push(OvalResult {
            result: results
                .get(&id)
                .cloned()
                .unwrap_or_else(|| OVAL_NOT_EVALUATED.to_string()),
            title: metadata.map(|m| child_text(m, "title")).unwrap_or_default(),
            definition_class: d.attribute("class").map(str::to_string),
            references,
            id,
        });
    }

    Ok(OvalReport {
        oval_results,
        openscap_proxy_name: identity.name.clone(),
        openscap_proxy_url: identity.url.clone(),
    })
}
