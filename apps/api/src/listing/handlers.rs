use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::listing::filter::{distinct_titles, filter_listing, Criteria};
use crate::models::applicant::ApplicantWithExperiences;
use crate::models::job_posting::{JobPosting, JobPostingInput};
use crate::state::AppState;

fn store_error(context: &str) -> impl FnOnce(anyhow::Error) -> AppError + '_ {
    move |e| AppError::dependency(context, e)
}

/// GET /api/jobs
/// Active postings only, newest first.
pub async fn handle_public_jobs(
    State(state): State<AppState>,
    Query(criteria): Query<Criteria>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    let postings = state
        .jobs
        .list_postings()
        .await
        .map_err(store_error("Failed to load job postings"))?;
    let active: Vec<JobPosting> = postings.into_iter().filter(|p| p.is_active).collect();
    let criteria = Criteria {
        selector: None,
        ..criteria
    };
    Ok(Json(filter_listing(&active, &criteria).into_iter().cloned().collect()))
}

/// GET /api/jobs/positions
pub async fn handle_positions(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let postings = state
        .jobs
        .list_postings()
        .await
        .map_err(store_error("Failed to load job positions"))?;
    Ok(Json(distinct_titles(&postings)))
}

/// GET /api/admin/applicants
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    Query(criteria): Query<Criteria>,
) -> Result<Json<Vec<ApplicantWithExperiences>>, AppError> {
    let applicants = state
        .applications
        .list_applications()
        .await
        .map_err(store_error("Failed to load applicants"))?;
    Ok(Json(
        filter_listing(&applicants, &criteria).into_iter().cloned().collect(),
    ))
}

/// GET /api/admin/jobs
/// Every posting, active or not. `position` is ignored; `q` also searches descriptions.
pub async fn handle_admin_jobs(
    State(state): State<AppState>,
    Query(criteria): Query<Criteria>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    let postings = state
        .jobs
        .list_postings()
        .await
        .map_err(store_error("Failed to load job postings"))?;
    let criteria = Criteria {
        selector: None,
        ..criteria
    };
    Ok(Json(filter_listing(&postings, &criteria).into_iter().cloned().collect()))
}

/// POST /api/admin/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Json(input): Json<JobPostingInput>,
) -> Result<(StatusCode, Json<JobPosting>), AppError> {
    input.validate()?;
    let posting = state
        .jobs
        .insert_posting(&input)
        .await
        .map_err(store_error("Failed to create job posting"))?;
    info!("Job posting {} '{}' created by {}", posting.id, posting.title, admin.id);
    Ok((StatusCode::CREATED, Json(posting)))
}

/// PUT /api/admin/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<JobPostingInput>,
) -> Result<Json<JobPosting>, AppError> {
    input.validate()?;
    let posting = state
        .jobs
        .update_posting(id, &input)
        .await
        .map_err(store_error("Failed to update job posting"))?
        .ok_or_else(|| AppError::NotFound(format!("Job posting {id} not found")))?;
    info!("Job posting {id} updated by {}", admin.id);
    Ok(Json(posting))
}

/// DELETE /api/admin/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .jobs
        .delete_posting(id)
        .await
        .map_err(store_error("Failed to delete job posting"))?;
    if !deleted {
        return Err(AppError::NotFound(format!("Job posting {id} not found")));
    }
    info!("Job posting {id} deleted by {}", admin.id);
    Ok(StatusCode::NO_CONTENT)
}
