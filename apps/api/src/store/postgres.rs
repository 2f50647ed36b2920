use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::applicant::{
    Applicant, ApplicantWithExperiences, NewApplication, NewWorkExperience, WorkExperience,
};
use crate::models::job_posting::{JobPosting, JobPostingInput};
use crate::store::{ApplicationStore, JobPostingStore};

// Salary columns are NUMERIC in the hosted schema; read them back as float8.
const APPLICANT_COLUMNS: &str = r#"
    id, full_name, nick_name, address, date_of_birth, age, phone_number, email,
    ktp_number, last_education, applied_position,
    last_salary::float8 AS last_salary, expected_salary::float8 AS expected_salary,
    domicile_city, ready_to_relocate, photo_url, cv_url, applied_at
"#;

const POSTING_COLUMNS: &str =
    "id, title, company, location, type, description, is_active, created_at";

/// Store backed by the hosted PostgreSQL database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert_application(&self, record: &NewApplication) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO applications
                (full_name, nick_name, address, date_of_birth, age, phone_number, email,
                 ktp_number, last_education, applied_position, last_salary, expected_salary,
                 domicile_city, ready_to_relocate, photo_url, cv_url, applied_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id
            "#,
        )
        .bind(&record.full_name)
        .bind(&record.nick_name)
        .bind(&record.address)
        .bind(record.date_of_birth)
        .bind(record.age)
        .bind(&record.phone_number)
        .bind(&record.email)
        .bind(&record.ktp_number)
        .bind(&record.last_education)
        .bind(&record.applied_position)
        .bind(record.last_salary)
        .bind(record.expected_salary)
        .bind(&record.domicile_city)
        .bind(record.ready_to_relocate)
        .bind(&record.photo_url)
        .bind(&record.cv_url)
        .bind(record.applied_at)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted application {id}");
        Ok(id)
    }

    async fn insert_work_experiences(&self, records: &[NewWorkExperience]) -> Result<()> {
        // One transaction so a failed row leaves no siblings behind.
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO applicant_work_experiences
                    (application_id, position, company_name, start_date, end_date, is_current_job)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(record.application_id)
            .bind(&record.position)
            .bind(&record.company_name)
            .bind(record.start_date)
            .bind(record.end_date)
            .bind(record.is_current_job)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!("Inserted {} work experiences", records.len());
        Ok(())
    }

    async fn delete_application(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<ApplicantWithExperiences>> {
        let applicants: Vec<Applicant> = sqlx::query_as(&format!(
            "SELECT {APPLICANT_COLUMNS} FROM applications ORDER BY applied_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = applicants.iter().map(|a| a.id).collect();
        let experiences: Vec<WorkExperience> = sqlx::query_as(
            r#"
            SELECT id, application_id, position, company_name, start_date, end_date, is_current_job
            FROM applicant_work_experiences
            WHERE application_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_applicant: HashMap<Uuid, Vec<WorkExperience>> = HashMap::new();
        for experience in experiences {
            by_applicant
                .entry(experience.application_id)
                .or_default()
                .push(experience);
        }

        Ok(applicants
            .into_iter()
            .map(|applicant| ApplicantWithExperiences {
                applicant_work_experiences: by_applicant.remove(&applicant.id).unwrap_or_default(),
                applicant,
            })
            .collect())
    }
}

#[async_trait]
impl JobPostingStore for PgStore {
    async fn list_postings(&self) -> Result<Vec<JobPosting>> {
        Ok(sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {POSTING_COLUMNS} FROM job_listings ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_posting(&self, input: &JobPostingInput) -> Result<JobPosting> {
        let posting = sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            INSERT INTO job_listings (title, company, location, type, description, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            RETURNING {POSTING_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.company)
        .bind(&input.location)
        .bind(&input.job_type)
        .bind(&input.description)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?;

        info!("Created job posting {} ({})", posting.id, posting.title);
        Ok(posting)
    }

    async fn update_posting(&self, id: Uuid, input: &JobPostingInput) -> Result<Option<JobPosting>> {
        // created_at is never updated.
        Ok(sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            UPDATE job_listings
            SET title = $1, company = $2, location = $3, type = $4, description = $5, is_active = $6
            WHERE id = $7
            RETURNING {POSTING_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.company)
        .bind(&input.location)
        .bind(&input.job_type)
        .bind(&input.description)
        .bind(input.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_posting(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM job_listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
