//! Résumé persistence — replace-all semantics. Every ingestion upserts
//! the profile row (raw document stored verbatim in `resume_json`) and
//! then fully replaces each derived collection, scoped to the owning
//! identity. Collections are never patched incrementally.
//!
//! The whole ingestion runs inside one transaction, so a failed insert
//! rolls back the delete and existing rows survive — no mixed old/new
//! state is observable.

use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::parse::CanonicalResume;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub experiences: usize,
    pub educations: usize,
    pub skills: usize,
    pub projects: usize,
}

pub async fn ingest_resume(
    pool: &PgPool,
    user_id: Uuid,
    raw: &Value,
    resume: CanonicalResume,
) -> Result<IngestOutcome, AppError> {
    let mut tx = pool.begin().await?;

    upsert_profile(&mut tx, user_id, raw, &resume).await?;
    replace_experiences(&mut tx, user_id, &resume).await?;
    replace_educations(&mut tx, user_id, &resume).await?;
    replace_skills(&mut tx, user_id, &resume).await?;
    replace_projects(&mut tx, user_id, &resume).await?;

    tx.commit().await?;

    let outcome = IngestOutcome {
        experiences: resume.experiences.len(),
        educations: resume.educations.len(),
        skills: resume.skills.len(),
        projects: resume.projects.len(),
    };
    info!(
        "Ingested résumé for {user_id}: {} experiences, {} educations, {} skills, {} projects",
        outcome.experiences, outcome.educations, outcome.skills, outcome.projects
    );
    Ok(outcome)
}

async fn upsert_profile(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    raw: &Value,
    resume: &CanonicalResume,
) -> Result<(), AppError> {
    let p = &resume.profile;
    sqlx::query(
        r#"
        INSERT INTO profiles
            (id, full_name, headline, summary, email, phone, location,
             website, github, linkedin, avatar_url, resume_json, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now())
        ON CONFLICT (id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            headline = EXCLUDED.headline,
            summary = EXCLUDED.summary,
            email = EXCLUDED.email,
            phone = EXCLUDED.phone,
            location = EXCLUDED.location,
            website = EXCLUDED.website,
            github = EXCLUDED.github,
            linkedin = EXCLUDED.linkedin,
            avatar_url = EXCLUDED.avatar_url,
            resume_json = EXCLUDED.resume_json,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(&p.full_name)
    .bind(&p.headline)
    .bind(&p.summary)
    .bind(&p.email)
    .bind(&p.phone)
    .bind(&p.location)
    .bind(&p.website)
    .bind(&p.github)
    .bind(&p.linkedin)
    .bind(&p.avatar_url)
    .bind(raw)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn replace_experiences(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    resume: &CanonicalResume,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM experiences WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    for (i, e) in resume.experiences.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO experiences
                (id, user_id, company, position, start_date, end_date,
                 summary, highlights, location, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&e.company)
        .bind(&e.position)
        .bind(&e.start_date)
        .bind(&e.end_date)
        .bind(&e.summary)
        .bind(&e.highlights)
        .bind(&e.location)
        .bind(i as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn replace_educations(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    resume: &CanonicalResume,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM educations WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    for (i, e) in resume.educations.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO educations
                (id, user_id, institution, area, study_type, start_date,
                 end_date, score, courses, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&e.institution)
        .bind(&e.area)
        .bind(&e.study_type)
        .bind(&e.start_date)
        .bind(&e.end_date)
        .bind(&e.score)
        .bind(&e.courses)
        .bind(i as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn replace_skills(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    resume: &CanonicalResume,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM skills WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    for (i, s) in resume.skills.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO skills (id, user_id, name, keywords, level, order_index)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&s.name)
        .bind(&s.keywords)
        .bind(&s.level)
        .bind(i as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn replace_projects(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    resume: &CanonicalResume,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM projects WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    for (i, p) in resume.projects.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO projects
                (id, user_id, name, description, url, highlights, keywords, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&p.name)
        .bind(&p.description)
        .bind(&p.url)
        .bind(&p.highlights)
        .bind(&p.keywords)
        .bind(i as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
