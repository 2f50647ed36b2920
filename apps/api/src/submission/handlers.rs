use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::BytesMut;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::form::{ExperienceField, ExperienceList, FormDraft, PendingFile};
use crate::models::period::YearMonth;
use crate::state::AppState;
use crate::submission::{too_large, SubmissionReceipt, UploadLimits};

/// One element of the `work_experiences` JSON part.
#[derive(Debug, Default, Deserialize)]
pub struct ExperiencePayload {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

/// POST /api/applications
pub async fn handle_submit_application(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionReceipt>), AppError> {
    let submitted_at = Utc::now();
    let today = local_today(submitted_at, state.config.local_offset);
    let draft = read_draft(multipart, today, state.assembler.limits()).await?;
    info!(
        "Received application for '{}' with {} experience entries",
        draft.applied_position,
        draft.experiences.len()
    );
    let receipt = state.assembler.submit(&draft, submitted_at).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Calendar date at the applicant's location when the request arrived.
fn local_today(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

fn bad_multipart(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Invalid form data: {e}"))
}

async fn read_draft(
    mut multipart: Multipart,
    today: NaiveDate,
    limits: UploadLimits,
) -> Result<FormDraft, AppError> {
    let mut draft = FormDraft::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "photo" => draft.photo = read_file(field, "Photo", limits.photo_max_bytes).await?,
            "cv" => draft.cv = read_file(field, "CV", limits.cv_max_bytes).await?,
            _ => {
                let value = field.text().await.map_err(bad_multipart)?;
                apply_text_field(&mut draft, &name, &value, today)?;
            }
        }
    }
    Ok(draft)
}

/// Streams one file part, buffering at most `limit` bytes. An oversized part
/// is read to the end so the error can report its full size. Browsers send
/// an empty part when no file was chosen; that counts as no file.
async fn read_file(
    mut field: Field<'_>,
    label: &str,
    limit: usize,
) -> Result<Option<PendingFile>, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);

    let mut buffer = BytesMut::new();
    let mut size = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
        size += chunk.len();
        if size <= limit {
            buffer.extend_from_slice(&chunk);
        }
    }

    if size > limit {
        warn!("Rejected {label} upload '{file_name}' of {size} bytes");
        return Err(too_large(label, size, limit));
    }
    if size == 0 {
        return Ok(None);
    }
    Ok(Some(PendingFile::new(file_name, content_type, buffer.freeze())))
}

fn optional_number(field: &str, value: &str) -> Result<Option<f64>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{field} must be a number")))
}

fn optional_period(field: &str, value: Option<&str>) -> Result<Option<YearMonth>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| AppError::Validation(format!("{field}: {e}"))),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "true" | "on" | "1" | "yes")
}

/// Maps one text part onto the draft. Unknown parts, including any
/// client-computed `age`, are ignored.
pub fn apply_text_field(
    draft: &mut FormDraft,
    name: &str,
    value: &str,
    today: NaiveDate,
) -> Result<(), AppError> {
    match name {
        "full_name" => draft.full_name = value.to_string(),
        "nick_name" => draft.nick_name = value.to_string(),
        "address" => draft.address = value.to_string(),
        "phone_number" => draft.phone_number = value.to_string(),
        "email" => draft.email = value.to_string(),
        "ktp_number" => draft.ktp_number = value.to_string(),
        "applied_position" => draft.applied_position = value.to_string(),
        "domicile_city" => draft.domicile_city = value.to_string(),
        "ready_to_relocate" => draft.ready_to_relocate = is_truthy(value),
        "date_of_birth" => {
            let value = value.trim();
            let dob = if value.is_empty() {
                None
            } else {
                Some(
                    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                        AppError::Validation(format!("date_of_birth '{value}' is not YYYY-MM-DD"))
                    })?,
                )
            };
            draft.set_date_of_birth(dob, today);
        }
        "last_education" => {
            draft.last_education = match value.trim() {
                "" => None,
                level => Some(level.parse().map_err(AppError::Validation)?),
            }
        }
        "last_salary" => draft.last_salary = optional_number("last_salary", value)?,
        "expected_salary" => draft.expected_salary = optional_number("expected_salary", value)?,
        "work_experiences" => {
            let payload: Vec<ExperiencePayload> = serde_json::from_str(value)
                .map_err(|e| AppError::Validation(format!("work_experiences: {e}")))?;
            apply_experiences(&mut draft.experiences, payload)?;
        }
        _ => {}
    }
    Ok(())
}

/// Replays the submitted entries through the list operations so the cap and
/// the current-job rule hold exactly as they do while editing.
pub fn apply_experiences(
    list: &mut ExperienceList,
    payload: Vec<ExperiencePayload>,
) -> Result<(), AppError> {
    for (index, entry) in payload.into_iter().enumerate() {
        if index >= list.len() {
            list.add().map_err(|e| AppError::Validation(e.to_string()))?;
        }
        let start = optional_period("start_date", entry.start_date.as_deref())?;
        let end = optional_period("end_date", entry.end_date.as_deref())?;
        list.set_field(index, ExperienceField::Position(entry.position));
        list.set_field(index, ExperienceField::CompanyName(entry.company_name));
        list.set_field(index, ExperienceField::StartPeriod(start));
        list.set_field(index, ExperienceField::EndPeriod(end));
        list.set_field(index, ExperienceField::IsCurrent(entry.is_current));
    }
    Ok(())
}
