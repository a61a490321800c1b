//! The canonical merged read-model. `build_view` is a pure function over
//! already-fetched inputs so the precedence rules are testable without a
//! database or network.
//!
//! Field precedence, most specific wins, each field independently:
//! explicit profile column → value embedded in the stored résumé blob
//! (experiences/educations/skills only when the relational rows are
//! empty) → GitHub field (name, bio, avatar, blog, location) → none.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::github::GithubUser;
use crate::models::profile::{EducationRow, ExperienceRow, ProfileRow, SkillRow};
use crate::resume::parse::{scalar_string, split_duration, title_case_category};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
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
    pub resume_pdf_url: Option<String>,
    pub experiences: Vec<ExperienceView>,
    pub educations: Vec<EducationView>,
    pub skills: Vec<SkillView>,
    pub certifications: Vec<CertificationView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceView {
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub summary: Option<String>,
    pub highlights: Vec<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationView {
    pub institution: Option<String>,
    pub area: Option<String>,
    pub study_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub score: Option<String>,
    pub courses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillView {
    pub name: Option<String>,
    pub keywords: Vec<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationView {
    pub provider: String,
    pub items: Vec<String>,
}

/// Merges the fetched inputs into one `ProfileView`.
pub fn build_view(
    row: Option<ProfileRow>,
    experiences: Vec<ExperienceRow>,
    educations: Vec<EducationRow>,
    skills: Vec<SkillRow>,
    github_user: Option<GithubUser>,
) -> ProfileView {
    let resume_json = row
        .as_ref()
        .and_then(|r| r.resume_json.clone())
        .unwrap_or(Value::Null);

    let mut experiences: Vec<ExperienceView> = experiences
        .into_iter()
        .map(|e| ExperienceView {
            company: Some(e.company),
            position: Some(e.position),
            start_date: e.start_date,
            end_date: e.end_date,
            summary: e.summary,
            highlights: e.highlights,
            location: e.location,
        })
        .collect();
    if experiences.is_empty() {
        experiences = experiences_from_blob(&resume_json);
    }

    let mut educations: Vec<EducationView> = educations
        .into_iter()
        .map(|e| EducationView {
            institution: Some(e.institution),
            area: e.area,
            study_type: e.study_type,
            start_date: e.start_date,
            end_date: e.end_date,
            score: e.score,
            courses: e.courses,
        })
        .collect();
    if educations.is_empty() {
        educations = educations_from_blob(&resume_json);
    }

    let mut skills: Vec<SkillView> = skills
        .into_iter()
        .map(|s| SkillView {
            name: Some(s.name),
            keywords: s.keywords,
            level: s.level,
        })
        .collect();
    if skills.is_empty() {
        skills = skills_from_blob(&resume_json);
    }

    let certifications = certifications_from_blob(&resume_json);
    let resume_pdf_url = resume_json
        .get("pdf_url")
        .and_then(Value::as_str)
        .map(String::from);

    let gh = github_user;
    let gh_field = |f: fn(&GithubUser) -> Option<String>| gh.as_ref().and_then(f);

    let col = |f: fn(&ProfileRow) -> Option<String>| row.as_ref().and_then(f);

    ProfileView {
        full_name: col(|r| r.full_name.clone())
            .or_else(|| gh_field(|g| g.name.clone()))
            .or_else(|| gh.as_ref().map(|g| g.login.clone())),
        headline: col(|r| r.headline.clone()),
        summary: col(|r| r.summary.clone()).or_else(|| gh_field(|g| g.bio.clone())),
        email: col(|r| r.email.clone()),
        phone: col(|r| r.phone.clone()),
        location: col(|r| r.location.clone()).or_else(|| gh_field(|g| g.location.clone())),
        website: col(|r| r.website.clone())
            .or_else(|| gh_field(|g| g.blog.clone().filter(|b| !b.is_empty()))),
        github: col(|r| r.github.clone()),
        linkedin: col(|r| r.linkedin.clone()),
        avatar_url: col(|r| r.avatar_url.clone()).or_else(|| gh_field(|g| g.avatar_url.clone())),
        resume_pdf_url,
        experiences,
        educations,
        skills,
        certifications,
    }
}

/// Custom-schema `work_experience` entries embedded in the stored blob.
fn experiences_from_blob(resume_json: &Value) -> Vec<ExperienceView> {
    let Some(work) = resume_json.get("work_experience").and_then(Value::as_array) else {
        return vec![];
    };
    work.iter()
        .map(|w| {
            let (start_date, end_date) =
                split_duration(w.get("duration").and_then(Value::as_str).unwrap_or(""));
            let highlights: Vec<String> = w
                .get("responsibilities")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(scalar_string).collect())
                .unwrap_or_default();
            ExperienceView {
                company: w.get("company").and_then(|v| scalar_string(v)),
                position: w.get("title").and_then(|v| scalar_string(v)),
                start_date,
                end_date,
                summary: if highlights.is_empty() {
                    None
                } else {
                    Some(highlights.join(" \u{2022} "))
                },
                highlights,
                location: None,
            }
        })
        .collect()
}

fn educations_from_blob(resume_json: &Value) -> Vec<EducationView> {
    let Some(e) = resume_json.get("education").filter(|e| e.is_object()) else {
        return vec![];
    };
    vec![EducationView {
        institution: e.get("institution").and_then(|v| scalar_string(v)),
        area: None,
        study_type: e.get("degree").and_then(|v| scalar_string(v)),
        start_date: None,
        end_date: e.get("year").and_then(|v| scalar_string(v)),
        score: e
            .get("cgpa")
            .and_then(|v| scalar_string(v))
            .map(|c| format!("CGPA: {c}")),
        courses: vec![],
    }]
}

fn skills_from_blob(resume_json: &Value) -> Vec<SkillView> {
    let Some(sections) = resume_json.get("skills").and_then(Value::as_object) else {
        return vec![];
    };
    sections
        .iter()
        .map(|(section, value)| SkillView {
            name: Some(title_case_category(section)),
            keywords: value
                .as_array()
                .map(|arr| arr.iter().filter_map(scalar_string).collect())
                .unwrap_or_default(),
            level: None,
        })
        .collect()
}

/// Certifications only live in the blob; they are always consulted.
fn certifications_from_blob(resume_json: &Value) -> Vec<CertificationView> {
    let Some(map) = resume_json.get("certifications").and_then(Value::as_object) else {
        return vec![];
    };
    map.iter()
        .map(|(provider, items)| CertificationView {
            provider: provider.clone(),
            items: items
                .as_array()
                .map(|arr| arr.iter().filter_map(scalar_string).collect())
                .unwrap_or_default(),
        })
        .collect()
}
