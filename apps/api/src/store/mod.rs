//! Query capability: the persistence seams the form engine and the admin
//! pages depend on.
//!
//! Handlers and the submission assembler hold `Arc<dyn ...>` handles, so tests
//! swap in in-memory fakes and production wires [`postgres::PgStore`].

pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::applicant::{ApplicantWithExperiences, NewApplication, NewWorkExperience};
use crate::models::job_posting::{JobPosting, JobPostingInput};

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Inserts the primary record and returns its new identifier.
    async fn insert_application(&self, record: &NewApplication) -> Result<Uuid>;

    /// Bulk-inserts dependent records. Either all rows land or none do.
    async fn insert_work_experiences(&self, records: &[NewWorkExperience]) -> Result<()>;

    async fn delete_application(&self, id: Uuid) -> Result<()>;

    /// All applicants with their experiences, newest submission first.
    async fn list_applications(&self) -> Result<Vec<ApplicantWithExperiences>>;
}

#[async_trait]
pub trait JobPostingStore: Send + Sync {
    /// All postings, newest first.
    async fn list_postings(&self) -> Result<Vec<JobPosting>>;

    async fn insert_posting(&self, input: &JobPostingInput) -> Result<JobPosting>;

    /// Returns `None` when no posting has `id`.
    async fn update_posting(&self, id: Uuid, input: &JobPostingInput) -> Result<Option<JobPosting>>;

    /// Returns false when no posting has `id`.
    async fn delete_posting(&self, id: Uuid) -> Result<bool>;
}
