//! In-memory collaborators for unit and router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AdminUser, AuthError, AuthGateway, AuthProvider, Session};
use crate::config::Config;
use crate::models::applicant::{ApplicantWithExperiences, NewApplication, NewWorkExperience};
use crate::models::job_posting::{JobPosting, JobPostingInput};
use crate::state::AppState;
use crate::storage::ObjectStorage;
use crate::store::{ApplicationStore, JobPostingStore};
use crate::submission::{ApplicationAssembler, UploadLimits};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    InsertApplication,
    InsertWorkExperiences,
    DeleteApplication(Uuid),
}

#[derive(Default)]
struct StoreInner {
    calls: Vec<StoreCall>,
    applications: HashMap<Uuid, NewApplication>,
    experiences: Vec<NewWorkExperience>,
}

/// Records every call; experience inserts and deletes can be told to fail.
#[derive(Default)]
pub struct FakeStore {
    inner: Mutex<StoreInner>,
    listed: Vec<ApplicantWithExperiences>,
    experience_failure: Option<String>,
    delete_failure: Option<String>,
}

impl FakeStore {
    pub fn failing_experiences(cause: &str) -> Self {
        Self {
            experience_failure: Some(cause.to_string()),
            ..Self::default()
        }
    }

    pub fn with_failing_delete(mut self, cause: &str) -> Self {
        self.delete_failure = Some(cause.to_string());
        self
    }

    pub fn with_applicants(applicants: Vec<ApplicantWithExperiences>) -> Self {
        Self {
            listed: applicants,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// The single stored application, if exactly one survives.
    pub fn saved_application(&self) -> Option<NewApplication> {
        let inner = self.inner.lock().unwrap();
        let mut records = inner.applications.values();
        match (records.next(), records.next()) {
            (Some(record), None) => Some(record.clone()),
            _ => None,
        }
    }

    pub fn saved_experiences(&self) -> Vec<NewWorkExperience> {
        self.inner.lock().unwrap().experiences.clone()
    }
}

#[async_trait]
impl ApplicationStore for FakeStore {
    async fn insert_application(&self, record: &NewApplication) -> Result<Uuid> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(StoreCall::InsertApplication);
        let id = Uuid::new_v4();
        inner.applications.insert(id, record.clone());
        Ok(id)
    }

    async fn insert_work_experiences(&self, records: &[NewWorkExperience]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(StoreCall::InsertWorkExperiences);
        if let Some(cause) = &self.experience_failure {
            return Err(anyhow!(cause.clone()));
        }
        inner.experiences.extend_from_slice(records);
        Ok(())
    }

    async fn delete_application(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(StoreCall::DeleteApplication(id));
        if let Some(cause) = &self.delete_failure {
            return Err(anyhow!(cause.clone()));
        }
        inner.applications.remove(&id);
        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<ApplicantWithExperiences>> {
        Ok(self.listed.clone())
    }
}

#[derive(Default)]
pub struct FakeJobStore {
    postings: Mutex<Vec<JobPosting>>,
}

impl FakeJobStore {
    pub fn with_postings(postings: Vec<JobPosting>) -> Self {
        Self {
            postings: Mutex::new(postings),
        }
    }
}

fn posting_from(id: Uuid, input: &JobPostingInput, created_at: chrono::DateTime<Utc>) -> JobPosting {
    JobPosting {
        id,
        title: input.title.clone(),
        company: input.company.clone(),
        location: input.location.clone(),
        job_type: input.job_type.clone(),
        description: input.description.clone(),
        is_active: input.is_active,
        created_at,
    }
}

#[async_trait]
impl JobPostingStore for FakeJobStore {
    async fn list_postings(&self) -> Result<Vec<JobPosting>> {
        let mut postings = self.postings.lock().unwrap().clone();
        postings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(postings)
    }

    async fn insert_posting(&self, input: &JobPostingInput) -> Result<JobPosting> {
        let posting = posting_from(Uuid::new_v4(), input, Utc::now());
        self.postings.lock().unwrap().push(posting.clone());
        Ok(posting)
    }

    async fn update_posting(&self, id: Uuid, input: &JobPostingInput) -> Result<Option<JobPosting>> {
        let mut postings = self.postings.lock().unwrap();
        Ok(postings.iter_mut().find(|p| p.id == id).map(|existing| {
            *existing = posting_from(id, input, existing.created_at);
            existing.clone()
        }))
    }

    async fn delete_posting(&self, id: Uuid) -> Result<bool> {
        let mut postings = self.postings.lock().unwrap();
        let before = postings.len();
        postings.retain(|p| p.id != id);
        Ok(postings.len() != before)
    }
}

#[derive(Default)]
pub struct FakeStorage {
    uploads: Mutex<Vec<(String, String, Bytes)>>,
    failure: Option<String>,
}

impl FakeStorage {
    pub fn failing(cause: &str) -> Self {
        Self {
            failure: Some(cause.to_string()),
            ..Self::default()
        }
    }

    /// `(bucket, key)` of every successful upload, in order.
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(bucket, key, _)| (bucket.clone(), key.clone()))
            .collect()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        _content_type: Option<&str>,
    ) -> Result<()> {
        if let Some(cause) = &self.failure {
            return Err(anyhow!(cause.clone()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), bytes));
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://storage.test/{bucket}/{key}")
    }
}

/// One admin account; tokens are handed out per sign-in and revoked on sign-out.
pub struct FakeAuth {
    email: String,
    password: String,
    tokens: Mutex<Vec<String>>,
}

impl FakeAuth {
    pub fn with_admin(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            tokens: Mutex::new(Vec::new()),
        }
    }

    fn admin(&self) -> AdminUser {
        AdminUser {
            id: "admin-1".to_string(),
            email: Some(self.email.clone()),
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email != self.email || password != self.password {
            return Err(AuthError::Rejected("Invalid login credentials".to_string()));
        }
        let token = format!("token-{}", Uuid::new_v4());
        self.tokens.lock().unwrap().push(token.clone());
        Ok(Session {
            access_token: token,
            refresh_token: None,
            expires_in: Some(3600),
            user: self.admin(),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.tokens.lock().unwrap().retain(|t| t != access_token);
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> Result<Option<AdminUser>, AuthError> {
        let known = self.tokens.lock().unwrap().iter().any(|t| t == access_token);
        Ok(known.then(|| self.admin()))
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/intake_test".to_string(),
        db_max_connections: 1,
        s3_bucket: "applicant-documents".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        s3_region: "us-east-1".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        storage_public_url: "https://storage.test".to_string(),
        auth_url: "http://localhost:9999".to_string(),
        auth_anon_key: "anon".to_string(),
        static_dir: "frontend/dist".to_string(),
        upload_limits: UploadLimits::default(),
        local_offset: chrono::FixedOffset::east_opt(7 * 3600).unwrap(),
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// Wires fakes into an [`AppState`] the way `main` wires real clients.
pub fn test_state(
    applications: Arc<FakeStore>,
    jobs: Arc<FakeJobStore>,
    storage: Arc<FakeStorage>,
    auth: Arc<FakeAuth>,
) -> AppState {
    let config = test_config();
    let assembler = ApplicationAssembler::new(
        applications.clone(),
        storage,
        config.s3_bucket.clone(),
        config.upload_limits,
    );
    AppState {
        applications,
        jobs,
        assembler: Arc::new(assembler),
        auth: Arc::new(AuthGateway::new(auth)),
        config,
    }
}
