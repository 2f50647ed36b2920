use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub job_type: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Editable fields of a posting. `created_at` is stamped on insert only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPostingInput {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl JobPostingInput {
    /// An active posting must carry title, company, location and type.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.is_active {
            return Ok(());
        }
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("company", &self.company),
            ("location", &self.location),
            ("type", &self.job_type),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Active job postings require: {}",
                missing.join(", ")
            )))
        }
    }
}
