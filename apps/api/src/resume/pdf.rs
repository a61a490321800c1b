//! Best-effort PDF résumé extraction. The uploaded PDF is always stored
//! and linked; this module additionally tries to recover a
//! standard-schema document from the extracted text so the normal
//! ingestion path can run. Any failure here is swallowed by the caller.

use serde_json::{json, Value};

const SECTION_HEADERS: &[&str] = &[
    "PROFILE",
    "WORK EXPERIENCE",
    "SKILLS",
    "PROJECTS",
    "VOLUNTEER",
    "EDUCATION",
    "CERTIFICATIONS",
];

const MAX_SUMMARY_LEN: usize = 1000;
const MAX_SKILL_KEYWORDS: usize = 100;

/// Extracts plain text from PDF bytes.
pub fn extract_text(bytes: &[u8]) -> Option<String> {
    pdf_extract::extract_text_from_mem(bytes).ok()
}

/// Maps extracted résumé text onto a standard-schema document by scanning
/// for conventional section headers. Returns `None` when the text carries
/// no recognizable section at all.
pub fn map_plain_text(text: &str) -> Option<Value> {
    let norm = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if norm.is_empty() {
        return None;
    }

    let profile_sec = section(&norm, "PROFILE");
    let work_sec = section(&norm, "WORK EXPERIENCE");
    let skills_sec = section(&norm, "SKILLS");
    let education_sec = section(&norm, "EDUCATION");
    if profile_sec.is_none() && work_sec.is_none() && skills_sec.is_none() {
        return None;
    }

    let name = norm
        .to_ascii_uppercase()
        .find("PROFILE")
        .map(|idx| {
            norm[..idx]
                .split_whitespace()
                .take(5)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|n| !n.is_empty());

    let summary = profile_sec
        .as_deref()
        .map(|s| truncate(s.trim(), MAX_SUMMARY_LEN).to_string());

    let work: Vec<Value> = work_sec
        .as_deref()
        .map(|sec| {
            // Text before the first bullet is the role header, not a highlight.
            let highlights: Vec<&str> = sec
                .split('\u{2022}')
                .skip(1)
                .map(str::trim)
                .filter(|s| s.len() > 4)
                .take(10)
                .collect();
            if highlights.is_empty() {
                vec![]
            } else {
                vec![json!({"summary": sec.trim(), "highlights": highlights})]
            }
        })
        .unwrap_or_default();

    let skills: Vec<Value> = skills_sec
        .as_deref()
        .map(|sec| {
            let mut keywords: Vec<&str> = Vec::new();
            for item in sec.split([',', '\u{2022}']) {
                let item = item.trim();
                if item.len() > 1 && !keywords.contains(&item) {
                    keywords.push(item);
                }
            }
            keywords.truncate(MAX_SKILL_KEYWORDS);
            if keywords.is_empty() {
                vec![]
            } else {
                vec![json!({"name": "Skills", "keywords": keywords})]
            }
        })
        .unwrap_or_default();

    let education: Vec<Value> = education_sec
        .as_deref()
        .and_then(|sec| sec.split('.').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|inst| vec![json!({"institution": inst})])
        .unwrap_or_default();

    Some(json!({
        "basics": {
            "name": name,
            "email": find_email(&norm),
            "phone": find_phone(&norm),
            "summary": summary,
        },
        "work": work,
        "education": education,
        "skills": skills,
        "projects": [],
    }))
}

/// Returns the text between `label` and the next known section header.
fn section(norm: &str, label: &str) -> Option<String> {
    // ASCII-only uppercasing keeps byte offsets valid for slicing `norm`.
    let upper = norm.to_ascii_uppercase();
    let idx = upper.find(label)?;
    let rest_start = idx + label.len();
    let rest_upper = &upper[rest_start..];
    let next = SECTION_HEADERS
        .iter()
        .filter(|h| !h.eq_ignore_ascii_case(label))
        .filter_map(|h| rest_upper.find(*h))
        .min();
    let rest = &norm[rest_start..];
    Some(match next {
        Some(end) => rest[..end].to_string(),
        None => rest.to_string(),
    })
}

fn find_email(norm: &str) -> Option<String> {
    norm.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '@' && c != '.'))
        .find(|t| {
            let Some((local, domain)) = t.split_once('@') else {
                return false;
            };
            !local.is_empty() && domain.contains('.') && !domain.ends_with('.')
        })
        .map(String::from)
}

fn find_phone(norm: &str) -> Option<String> {
    norm.split_whitespace()
        .find(|t| {
            let digits = t.chars().filter(|c| c.is_ascii_digit()).count();
            digits >= 8 && t.chars().all(|c| c.is_ascii_digit() || "+-() ".contains(c))
        })
        .map(String::from)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Jane Doe jane@example.com +911234567890 \
        PROFILE Backend engineer with eight years of systems experience. \
        WORK EXPERIENCE Acme | Engineer \u{2022} Built the billing pipeline \u{2022} Cut costs by 40% \
        SKILLS Rust, PostgreSQL, Redis \
        EDUCATION IIT Bombay. B.Tech in CS.";

    #[test]
    fn maps_sections_to_standard_schema() {
        let doc = map_plain_text(SAMPLE).unwrap();
        assert_eq!(doc["basics"]["name"], "Jane Doe jane@example.com +911234567890");
        assert_eq!(doc["basics"]["email"], "jane@example.com");
        assert_eq!(doc["basics"]["phone"], "+911234567890");
        assert!(doc["basics"]["summary"]
            .as_str()
            .unwrap()
            .starts_with("Backend engineer"));
        let highlights = doc["work"][0]["highlights"].as_array().unwrap();
        assert_eq!(highlights.len(), 2);
        assert_eq!(highlights[0], "Built the billing pipeline");
        let keywords = doc["skills"][0]["keywords"].as_array().unwrap();
        assert_eq!(keywords.len(), 3);
        assert_eq!(doc["education"][0]["institution"], "IIT Bombay");
    }

    #[test]
    fn text_without_known_sections_is_rejected() {
        assert!(map_plain_text("grocery list: eggs, milk").is_none());
        assert!(map_plain_text("").is_none());
    }

    #[test]
    fn mapped_document_feeds_the_standard_parser() {
        let doc = map_plain_text(SAMPLE).unwrap();
        let canonical = crate::resume::parse::ResumeDocument::parse(&doc)
            .unwrap()
            .into_canonical();
        assert_eq!(canonical.skills.len(), 1);
        assert_eq!(canonical.experiences.len(), 1);
    }
}
