//! Résumé parsing — resolves an incoming JSON document into a tagged
//! union (`Custom` or `Standard` schema) exactly once, then maps each
//! branch through a pure function into the same canonical row seeds.
//!
//! Detection rule: a document carrying any of `name`, `contact` or
//! `work_experience` at the top level is the custom free-form schema;
//! everything else is treated as the standard résumé schema
//! (`basics`/`work`/`education`/`skills`/`projects`), where every field
//! is optional and missing fields never abort parsing.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;

/// The dash used in custom-schema duration strings ("2020–2022").
const DURATION_DASH: char = '\u{2013}';

// ────────────────────────────────────────────────────────────────────────────
// Canonical output
// ────────────────────────────────────────────────────────────────────────────

/// Profile-record fields derived from a résumé document.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewExperience {
    pub company: String,
    pub position: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub summary: Option<String>,
    pub highlights: Vec<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEducation {
    pub institution: String,
    pub area: Option<String>,
    pub study_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub score: Option<String>,
    pub courses: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewSkill {
    pub name: String,
    pub keywords: Vec<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub highlights: Vec<String>,
    pub keywords: Vec<String>,
}

/// The canonical result of résumé parsing, consumed by the ingest layer.
#[derive(Debug, Clone, Default)]
pub struct CanonicalResume {
    pub profile: ProfileFields,
    pub experiences: Vec<NewExperience>,
    pub educations: Vec<NewEducation>,
    pub skills: Vec<NewSkill>,
    pub projects: Vec<NewProject>,
}

// ────────────────────────────────────────────────────────────────────────────
// Input schemas
// ────────────────────────────────────────────────────────────────────────────

// Container fields are `Option` rather than `#[serde(default)]` so an
// explicit `null` in the document is as acceptable as an absent key.
#[derive(Debug, Deserialize, Default)]
pub struct CustomResume {
    pub name: Option<String>,
    pub contact: Option<CustomContact>,
    pub profile: Option<String>,
    pub work_experience: Option<Vec<CustomWork>>,
    pub skills: Option<serde_json::Map<String, Value>>,
    pub education: Option<CustomEducation>,
    pub projects: Option<Vec<CustomProject>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CustomContact {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub links: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CustomWork {
    pub company: Option<String>,
    pub title: Option<String>,
    pub duration: Option<String>,
    pub responsibilities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CustomEducation {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub year: Option<Value>,
    pub cgpa: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CustomProject {
    pub name: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub impact: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StandardResume {
    pub basics: Option<StandardBasics>,
    pub work: Option<Vec<StandardWork>>,
    pub education: Option<Vec<StandardEducation>>,
    pub skills: Option<Vec<StandardSkill>>,
    pub projects: Option<Vec<StandardProject>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StandardBasics {
    pub name: Option<String>,
    pub label: Option<String>,
    pub summary: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
    pub location: Option<StandardLocation>,
    pub profiles: Option<Vec<StandardProfileLink>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StandardLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    #[serde(rename = "countryCode")]
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StandardProfileLink {
    pub network: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StandardWork {
    pub name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub summary: Option<String>,
    pub highlights: Option<Vec<String>>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StandardEducation {
    pub institution: Option<String>,
    pub name: Option<String>,
    pub area: Option<String>,
    #[serde(rename = "studyType")]
    pub study_type: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub score: Option<String>,
    pub courses: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct StandardSkill {
    pub name: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StandardProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub highlights: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Detection and mapping
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ResumeDocument {
    Custom(CustomResume),
    Standard(StandardResume),
}

impl ResumeDocument {
    /// Resolves the document shape once, at the entry point.
    pub fn parse(raw: &Value) -> Result<Self, AppError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| AppError::Validation("Résumé must be a JSON object".to_string()))?;

        let is_custom = ["name", "contact", "work_experience"]
            .iter()
            .any(|k| obj.contains_key(*k));

        if is_custom {
            let doc: CustomResume = serde_json::from_value(raw.clone()).map_err(|e| {
                AppError::UnprocessableEntity(format!("Unrecognized résumé shape: {e}"))
            })?;
            Ok(ResumeDocument::Custom(doc))
        } else {
            let doc: StandardResume = serde_json::from_value(raw.clone()).map_err(|e| {
                AppError::UnprocessableEntity(format!("Unrecognized résumé shape: {e}"))
            })?;
            Ok(ResumeDocument::Standard(doc))
        }
    }

    pub fn into_canonical(self) -> CanonicalResume {
        match self {
            ResumeDocument::Custom(doc) => map_custom(doc),
            ResumeDocument::Standard(doc) => map_standard(doc),
        }
    }
}

fn map_custom(doc: CustomResume) -> CanonicalResume {
    let contact = doc.contact.unwrap_or_default();
    let links = contact.links.unwrap_or_default();
    let github = find_link(&links, "github");
    let linkedin = find_link(&links, "linkedin");

    let profile = ProfileFields {
        full_name: doc.name,
        summary: doc.profile,
        email: contact.email,
        phone: contact.phone,
        github,
        linkedin,
        // Headline, location, website and avatar are not part of the
        // custom schema; the aggregator backfills them from GitHub.
        ..ProfileFields::default()
    };

    let experiences = doc
        .work_experience
        .unwrap_or_default()
        .into_iter()
        .map(|w| {
            let (start_date, end_date) = split_duration(w.duration.as_deref().unwrap_or(""));
            let responsibilities = w.responsibilities.unwrap_or_default();
            NewExperience {
                company: w.company.unwrap_or_else(|| "Company".to_string()),
                position: w.title.unwrap_or_else(|| "Role".to_string()),
                start_date,
                end_date,
                summary: if responsibilities.is_empty() {
                    None
                } else {
                    Some(responsibilities.join(" \u{2022} "))
                },
                highlights: responsibilities,
                location: None,
            }
        })
        .collect();

    let educations = doc
        .education
        .map(|e| {
            vec![NewEducation {
                institution: e.institution.unwrap_or_else(|| "Institution".to_string()),
                area: None,
                study_type: e.degree,
                start_date: None,
                end_date: e.year.as_ref().and_then(scalar_string),
                score: e
                    .cgpa
                    .as_ref()
                    .and_then(scalar_string)
                    .map(|c| format!("CGPA: {c}")),
                courses: vec![],
            }]
        })
        .unwrap_or_default();

    let skills = doc
        .skills
        .unwrap_or_default()
        .iter()
        .filter_map(|(section, value)| {
            let keywords: Vec<String> = value
                .as_array()?
                .iter()
                .filter_map(scalar_string)
                .collect();
            if keywords.is_empty() {
                return None;
            }
            Some(NewSkill {
                name: title_case_category(section),
                keywords,
                level: None,
            })
        })
        .collect();

    let projects = doc
        .projects
        .unwrap_or_default()
        .into_iter()
        .map(|p| {
            let tech_stack = p.tech_stack.unwrap_or_default();
            NewProject {
                name: p.name.unwrap_or_else(|| "Project".to_string()),
                description: custom_project_description(
                    &tech_stack,
                    &p.features.unwrap_or_default(),
                    p.impact.as_deref(),
                ),
                url: None,
                highlights: vec![],
                keywords: tech_stack,
            }
        })
        .collect();

    CanonicalResume {
        profile,
        experiences,
        educations,
        skills,
        projects,
    }
}

fn map_standard(doc: StandardResume) -> CanonicalResume {
    let basics = doc.basics.unwrap_or_default();
    let profiles = basics.profiles.unwrap_or_default();
    let github = find_profile_url(&profiles, "github");
    let linkedin = find_profile_url(&profiles, "linkedin");

    let profile = ProfileFields {
        full_name: basics.name,
        headline: basics.label,
        summary: basics.summary,
        email: basics.email,
        phone: basics.phone,
        location: basics.location.as_ref().and_then(compose_location),
        website: basics.website,
        github,
        linkedin,
        avatar_url: basics.image,
    };

    let experiences = doc
        .work
        .unwrap_or_default()
        .into_iter()
        .map(|w| NewExperience {
            company: w
                .name
                .or(w.company)
                .unwrap_or_else(|| "Company".to_string()),
            position: w
                .position
                .or(w.title)
                .unwrap_or_else(|| "Role".to_string()),
            start_date: w.start_date,
            end_date: w.end_date,
            summary: w.summary,
            highlights: w.highlights.unwrap_or_default(),
            location: w.location,
        })
        .collect();

    let educations = doc
        .education
        .unwrap_or_default()
        .into_iter()
        .map(|e| NewEducation {
            institution: e
                .institution
                .or(e.name)
                .unwrap_or_else(|| "Institution".to_string()),
            area: e.area,
            study_type: e.study_type,
            start_date: e.start_date,
            end_date: e.end_date,
            score: e.score,
            courses: e.courses.unwrap_or_default(),
        })
        .collect();

    let skills = doc
        .skills
        .unwrap_or_default()
        .into_iter()
        .map(|s| NewSkill {
            name: s.name.unwrap_or_else(|| "Skill".to_string()),
            keywords: s.keywords.unwrap_or_default(),
            level: s.level,
        })
        .collect();

    let projects = doc
        .projects
        .unwrap_or_default()
        .into_iter()
        .map(|p| NewProject {
            name: p.name.unwrap_or_else(|| "Project".to_string()),
            description: p.description,
            url: p.url,
            highlights: p.highlights.unwrap_or_default(),
            keywords: p.keywords.unwrap_or_default(),
        })
        .collect();

    CanonicalResume {
        profile,
        experiences,
        educations,
        skills,
        projects,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers (also used by the aggregator's resume_json fallbacks)
// ────────────────────────────────────────────────────────────────────────────

/// Splits a custom-schema duration string once on an en-dash.
/// "2020–2022" -> (Some("2020"), Some("2022")); no dash means the whole
/// string is the start date.
pub fn split_duration(duration: &str) -> (Option<String>, Option<String>) {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    match duration.split_once(DURATION_DASH) {
        Some((start, end)) => (non_empty(start), non_empty(end)),
        None => (non_empty(duration), None),
    }
}

/// "programming_languages" -> "Programming Languages"
pub fn title_case_category(section: &str) -> String {
    section
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn custom_project_description(
    tech_stack: &[String],
    features: &[String],
    impact: Option<&str>,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if !tech_stack.is_empty() {
        parts.push(format!("Tech: {}", tech_stack.join(", ")));
    }
    if !features.is_empty() {
        parts.push(format!("Features: {}", features.join(", ")));
    }
    if let Some(impact) = impact {
        parts.push(format!("Impact: {impact}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

fn find_link(links: &[String], needle: &str) -> Option<String> {
    links
        .iter()
        .find(|l| l.to_lowercase().contains(needle))
        .cloned()
}

fn find_profile_url(profiles: &[StandardProfileLink], needle: &str) -> Option<String> {
    profiles
        .iter()
        .find(|p| {
            p.network
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(needle))
        })
        .and_then(|p| p.url.clone())
}

/// Joins city, region and country code with ", ", skipping empty parts.
fn compose_location(location: &StandardLocation) -> Option<String> {
    let parts: Vec<&str> = [
        location.city.as_deref(),
        location.region.as_deref(),
        location.country_code.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.trim().is_empty())
    .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Stringifies a scalar JSON value (CGPA and year fields arrive as either
/// strings or numbers).
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_custom_by_marker_keys() {
        for key in ["name", "contact", "work_experience"] {
            let doc = ResumeDocument::parse(&json!({ key: null })).unwrap();
            assert!(matches!(doc, ResumeDocument::Custom(_)), "key {key}");
        }
    }

    #[test]
    fn defaults_to_standard_without_markers() {
        let doc = ResumeDocument::parse(&json!({"basics": {"name": "B"}})).unwrap();
        assert!(matches!(doc, ResumeDocument::Standard(_)));
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(matches!(
            ResumeDocument::parse(&json!("just a string")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn explicit_nulls_are_as_acceptable_as_absent_keys() {
        let raw = json!({
            "basics": null,
            "work": null,
            "education": null,
            "skills": null,
            "projects": null
        });
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        assert!(canonical.experiences.is_empty());

        let raw = json!({"name": null, "contact": null, "work_experience": null});
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        assert!(canonical.profile.full_name.is_none());
    }

    #[test]
    fn empty_standard_document_parses_to_empty_canonical() {
        let canonical = ResumeDocument::parse(&json!({})).unwrap().into_canonical();
        assert!(canonical.profile.full_name.is_none());
        assert!(canonical.experiences.is_empty());
        assert!(canonical.educations.is_empty());
        assert!(canonical.skills.is_empty());
        assert!(canonical.projects.is_empty());
    }

    #[test]
    fn custom_work_experience_maps_per_contract() {
        let raw = json!({
            "name": "A",
            "contact": {"email": "a@x.com"},
            "work_experience": [{
                "company": "Acme",
                "title": "Eng",
                "duration": "2020\u{2013}2022",
                "responsibilities": ["Built X"]
            }]
        });
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        assert_eq!(canonical.profile.full_name.as_deref(), Some("A"));
        assert_eq!(canonical.profile.email.as_deref(), Some("a@x.com"));
        assert_eq!(canonical.experiences.len(), 1);
        let exp = &canonical.experiences[0];
        assert_eq!(exp.company, "Acme");
        assert_eq!(exp.position, "Eng");
        assert_eq!(exp.start_date.as_deref(), Some("2020"));
        assert_eq!(exp.end_date.as_deref(), Some("2022"));
        assert_eq!(exp.highlights, vec!["Built X"]);
        assert_eq!(exp.summary.as_deref(), Some("Built X"));
    }

    #[test]
    fn duration_without_dash_is_start_only() {
        assert_eq!(split_duration("2021"), (Some("2021".to_string()), None));
        assert_eq!(split_duration(""), (None, None));
        assert_eq!(
            split_duration(" 2019 \u{2013} Present "),
            (Some("2019".to_string()), Some("Present".to_string()))
        );
    }

    #[test]
    fn custom_links_scan_is_case_insensitive() {
        let raw = json!({
            "contact": {"links": ["https://GitHub.com/me", "https://linkedin.com/in/me"]}
        });
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        assert_eq!(
            canonical.profile.github.as_deref(),
            Some("https://GitHub.com/me")
        );
        assert_eq!(
            canonical.profile.linkedin.as_deref(),
            Some("https://linkedin.com/in/me")
        );
    }

    #[test]
    fn standard_profiles_scan_matches_network_field() {
        let raw = json!({
            "basics": {
                "profiles": [
                    {"network": "GitHub", "url": "https://github.com/me"},
                    {"network": "LinkedIn", "url": "https://linkedin.com/in/me"}
                ]
            }
        });
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        assert_eq!(canonical.profile.github.as_deref(), Some("https://github.com/me"));
    }

    #[test]
    fn standard_location_joins_non_empty_parts() {
        let raw = json!({"basics": {"location": {"city": "Pune", "countryCode": "IN"}}});
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        assert_eq!(canonical.profile.location.as_deref(), Some("Pune, IN"));
    }

    #[test]
    fn custom_location_is_left_for_github_backfill() {
        let raw = json!({"name": "A"});
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        assert!(canonical.profile.location.is_none());
    }

    #[test]
    fn custom_skill_sections_are_title_cased() {
        let raw = json!({
            "name": "A",
            "skills": {
                "programming_languages": ["Rust", "Python"],
                "empty_section": []
            }
        });
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        assert_eq!(canonical.skills.len(), 1);
        assert_eq!(canonical.skills[0].name, "Programming Languages");
        assert_eq!(canonical.skills[0].keywords, vec!["Rust", "Python"]);
    }

    #[test]
    fn custom_project_description_omits_absent_fields() {
        let raw = json!({
            "name": "A",
            "projects": [
                {"name": "P1", "tech_stack": ["Rust"], "impact": "10x"},
                {"name": "P2"}
            ]
        });
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        assert_eq!(
            canonical.projects[0].description.as_deref(),
            Some("Tech: Rust | Impact: 10x")
        );
        assert!(canonical.projects[1].description.is_none());
    }

    #[test]
    fn custom_education_year_and_cgpa_accept_numbers() {
        let raw = json!({
            "name": "A",
            "education": {"institution": "IIT", "degree": "B.Tech", "year": 2022, "cgpa": 9.1}
        });
        let canonical = ResumeDocument::parse(&raw).unwrap().into_canonical();
        let edu = &canonical.educations[0];
        assert_eq!(edu.institution, "IIT");
        assert_eq!(edu.study_type.as_deref(), Some("B.Tech"));
        assert_eq!(edu.end_date.as_deref(), Some("2022"));
        assert_eq!(edu.score.as_deref(), Some("CGPA: 9.1"));
    }
}
