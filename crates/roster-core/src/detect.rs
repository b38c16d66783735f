//! Guessing the sport template from a sheet's headers.

use serde::{Deserialize, Serialize};
use tracing::debug;

use roster_map::ColumnMatcher;
use roster_model::ConfidenceLevel;
use roster_standards::TemplateRegistry;

/// Drill matches needed for a high-confidence detection.
const HIGH_CONFIDENCE_DRILLS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDetection {
    pub template_id: String,
    pub confidence: ConfidenceLevel,
    /// Drill keys of the template that some header maps to.
    pub matched_drills: Vec<String>,
}

/// Picks the template whose drills the headers cover best.
///
/// Only matches at medium confidence or better count. Ties go to the
/// template listed first. With no match at all the registry's fallback is
/// returned at low confidence; `None` only for an empty registry.
pub fn detect_template(headers: &[String], registry: &TemplateRegistry) -> Option<TemplateDetection> {
    let mut best: Option<(&str, Vec<String>)> = None;
    for template in registry.iter() {
        let proposal = ColumnMatcher::new(&template.drills).match_headers(headers);
        let matched: Vec<String> = proposal
            .filter_by_level(ConfidenceLevel::Medium)
            .into_iter()
            .filter_map(|mapping| mapping.target_key.clone())
            .collect();
        debug!(template = %template.id, matched = matched.len(), "template candidate");
        if best
            .as_ref()
            .is_none_or(|(_, current)| matched.len() > current.len())
        {
            best = Some((template.id.as_str(), matched));
        }
    }

    match best {
        Some((template_id, matched)) if !matched.is_empty() => {
            let confidence = if matched.len() >= HIGH_CONFIDENCE_DRILLS {
                ConfidenceLevel::High
            } else {
                ConfidenceLevel::Medium
            };
            Some(TemplateDetection {
                template_id: template_id.to_string(),
                confidence,
                matched_drills: matched,
            })
        }
        _ => registry.fallback().map(|template| TemplateDetection {
            template_id: template.id.clone(),
            confidence: ConfidenceLevel::Low,
            matched_drills: Vec::new(),
        }),
    }
}
