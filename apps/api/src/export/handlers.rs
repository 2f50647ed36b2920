use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::export::shaper::{shape, ExportFormat, ExportTable};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

/// GET /api/admin/applicants/export
/// Always covers every applicant, regardless of any dashboard filter.
pub async fn handle_export(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Query(params): Query<ExportQuery>,
) -> Result<Json<ExportTable>, AppError> {
    let applicants = state
        .applications
        .list_applications()
        .await
        .map_err(|e| AppError::dependency("Failed to load applicants for export", e))?;
    info!(
        "Exporting {} applicants as {:?} for {}",
        applicants.len(),
        params.format,
        admin.id
    );
    Ok(Json(shape(&applicants, params.format)))
}
