use axum::{
    extract::{Multipart, State},
    Json,
};
use aws_sdk_s3::primitives::ByteStream;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::ingest::{ingest_resume, IngestOutcome};
use crate::resume::parse::ResumeDocument;
use crate::resume::pdf;
use crate::signal;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResumeIngestRequest {
    pub user_id: Uuid,
    pub resume: Value,
}

/// POST /api/v1/resume
///
/// Parses a résumé document (custom or standard schema) and replaces the
/// owning identity's derived collections. Parse failures leave stored
/// data untouched.
pub async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<ResumeIngestRequest>,
) -> Result<Json<IngestOutcome>, AppError> {
    let canonical = ResumeDocument::parse(&req.resume)?.into_canonical();
    let outcome = ingest_resume(&state.db, req.user_id, &req.resume, canonical).await?;

    if let Err(e) = signal::raise(&state.redis).await {
        warn!("Failed to raise refresh signal: {e}");
    }
    Ok(Json(outcome))
}

/// POST /api/v1/resume/pdf (multipart: `user_id`, `file`)
///
/// Stores the PDF in the résumé bucket, links its public URL into the
/// profile's `resume_json.pdf_url`, then best-effort extracts text and
/// runs it through the normal ingestion path. Extraction failures are
/// swallowed; the upload itself still succeeds.
pub async fn handle_upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut file: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("user_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid user_id field: {e}")))?;
                user_id = Some(
                    text.parse()
                        .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?,
                );
            }
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file field: {e}")))?;
                file = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let user_id =
        user_id.ok_or_else(|| AppError::Validation("Missing user_id field".to_string()))?;
    let file = file.ok_or_else(|| AppError::Validation("Missing file field".to_string()))?;

    let key = format!("{user_id}/resume.pdf");
    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .body(ByteStream::from(file.clone()))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("PDF upload failed: {e}")))?;

    let pdf_url = format!(
        "{}/{}/{}",
        state.config.s3_endpoint.trim_end_matches('/'),
        state.config.s3_bucket,
        key
    );
    link_pdf_url(&state, user_id, &pdf_url).await?;
    info!("Stored résumé PDF for {user_id} at {pdf_url}");

    // Best-effort: recover a structured résumé from the PDF text. The
    // derived document replaces resume_json wholesale, so the pdf_url
    // link has to ride along.
    match pdf::extract_text(&file).as_deref().and_then(pdf::map_plain_text) {
        Some(mut doc) => {
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("pdf_url".to_string(), json!(pdf_url));
            }
            match ResumeDocument::parse(&doc) {
                Ok(parsed) => {
                    if let Err(e) =
                        ingest_resume(&state.db, user_id, &doc, parsed.into_canonical()).await
                    {
                        warn!("PDF-derived ingestion failed for {user_id}: {e}");
                    }
                }
                Err(e) => warn!("PDF-derived document unusable for {user_id}: {e}"),
            }
        }
        None => info!("No structured résumé recovered from PDF for {user_id}"),
    }

    if let Err(e) = signal::raise(&state.redis).await {
        warn!("Failed to raise refresh signal: {e}");
    }
    Ok(Json(json!({ "pdfUrl": pdf_url })))
}

/// Merges `pdf_url` into the profile's stored résumé blob, creating the
/// profile row if it does not exist yet.
async fn link_pdf_url(state: &AppState, user_id: Uuid, pdf_url: &str) -> Result<(), AppError> {
    let existing: Option<Option<Value>> =
        sqlx::query_scalar("SELECT resume_json FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?;

    let mut resume_json = existing.flatten().unwrap_or_else(|| json!({}));
    if let Some(obj) = resume_json.as_object_mut() {
        obj.insert("pdf_url".to_string(), json!(pdf_url));
    }

    sqlx::query(
        r#"
        INSERT INTO profiles (id, resume_json, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (id) DO UPDATE SET
            resume_json = EXCLUDED.resume_json,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(&resume_json)
    .execute(&state.db)
    .await?;
    Ok(())
}
