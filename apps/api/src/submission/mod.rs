// Application submission: validate the draft, upload documents, then write the
// primary record and its work experiences. Each step starts only after the
// previous one has finished.

pub mod handlers;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::form::{FormDraft, PendingFile};
use crate::models::applicant::{NewApplication, NewWorkExperience};
use crate::storage::{object_key, ObjectStorage};
use crate::store::ApplicationStore;

pub const DEFAULT_PHOTO_MAX_BYTES: usize = 200 * 1024;
pub const DEFAULT_CV_MAX_BYTES: usize = 1024 * 1024;

const PHOTO_FOLDER: &str = "photos";
const CV_FOLDER: &str = "cvs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub photo_max_bytes: usize,
    pub cv_max_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            photo_max_bytes: DEFAULT_PHOTO_MAX_BYTES,
            cv_max_bytes: DEFAULT_CV_MAX_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: Uuid,
    pub photo_url: String,
    pub cv_url: String,
    pub experiences_saved: usize,
    pub message: String,
}

/// Turns a [`FormDraft`] into persisted records.
pub struct ApplicationAssembler {
    store: Arc<dyn ApplicationStore>,
    storage: Arc<dyn ObjectStorage>,
    bucket: String,
    limits: UploadLimits,
}

impl ApplicationAssembler {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        storage: Arc<dyn ObjectStorage>,
        bucket: impl Into<String>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            store,
            storage,
            bucket: bucket.into(),
            limits,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Every check that can fail without touching a collaborator.
    pub fn validate(&self, draft: &FormDraft) -> Result<(), AppError> {
        let missing = draft.missing_required_fields();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Required fields are missing: {}",
                missing.join(", ")
            )));
        }

        check_size("Photo", draft.photo.as_ref(), self.limits.photo_max_bytes)?;
        check_size("CV", draft.cv.as_ref(), self.limits.cv_max_bytes)?;

        if let Some((index, _)) = draft
            .experiences
            .complete_entries()
            .find(|(_, entry)| entry.is_missing_end_period())
        {
            return Err(AppError::Validation(format!(
                "Work experience {} needs an end period unless it is the current job",
                index + 1
            )));
        }
        Ok(())
    }

    pub async fn submit(
        &self,
        draft: &FormDraft,
        submitted_at: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, AppError> {
        self.validate(draft)?;

        let photo_url = self
            .upload_document(PHOTO_FOLDER, "photo", draft.photo.as_ref(), submitted_at)
            .await?;
        let cv_url = self
            .upload_document(CV_FOLDER, "CV", draft.cv.as_ref(), submitted_at)
            .await?;

        let record = application_record(draft, &photo_url, &cv_url, submitted_at)?;
        let application_id = self
            .store
            .insert_application(&record)
            .await
            .map_err(|e| AppError::dependency("Failed to save application", e))?;

        let experiences = experience_records(application_id, draft);
        if !experiences.is_empty() {
            if let Err(cause) = self.store.insert_work_experiences(&experiences).await {
                return Err(self.roll_back(application_id, cause.to_string()).await);
            }
        }

        info!(
            "Application {application_id} submitted for '{}' with {} work experiences",
            record.applied_position,
            experiences.len()
        );
        Ok(SubmissionReceipt {
            application_id,
            photo_url,
            cv_url,
            experiences_saved: experiences.len(),
            message: "Your application has been submitted".to_string(),
        })
    }

    async fn upload_document(
        &self,
        folder: &str,
        label: &str,
        file: Option<&PendingFile>,
        at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let Some(file) = file else {
            return Ok(String::new());
        };
        let key = object_key(folder, &file.file_name, at.timestamp_millis(), Uuid::new_v4());
        self.storage
            .upload(&self.bucket, &key, file.bytes.clone(), file.content_type.as_deref())
            .await
            .map_err(|e| AppError::dependency(&format!("Failed to upload {label}"), e))?;
        Ok(self.storage.public_url(&self.bucket, &key))
    }

    /// Compensating delete for a primary record whose experiences failed to
    /// save. Both failures are reported if the delete fails too.
    async fn roll_back(&self, application_id: Uuid, cause: String) -> AppError {
        warn!("Work experience insert failed for {application_id}, deleting application: {cause}");
        let rollback_failure = match self.store.delete_application(application_id).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("Rollback of application {application_id} failed: {e}");
                Some(e.to_string())
            }
        };
        AppError::Consistency {
            application_id,
            cause,
            rollback_failure,
        }
    }
}

fn check_size(label: &str, file: Option<&PendingFile>, limit: usize) -> Result<(), AppError> {
    match file {
        Some(file) if file.size() > limit => Err(too_large(label, file.size(), limit)),
        _ => Ok(()),
    }
}

pub(crate) fn too_large(label: &str, size: usize, limit: usize) -> AppError {
    AppError::Validation(format!(
        "{label} file is too large ({}); the limit is {}",
        format_size(size),
        format_size(limit)
    ))
}

fn format_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{} KiB", bytes.div_ceil(KIB))
    } else {
        format!("{bytes} bytes")
    }
}

fn application_record(
    draft: &FormDraft,
    photo_url: &str,
    cv_url: &str,
    applied_at: DateTime<Utc>,
) -> Result<NewApplication, AppError> {
    let missing = |field: &str| AppError::Validation(format!("Required fields are missing: {field}"));
    Ok(NewApplication {
        full_name: draft.full_name.trim().to_string(),
        nick_name: draft.nick_name.trim().to_string(),
        address: draft.address.trim().to_string(),
        date_of_birth: draft.date_of_birth().ok_or_else(|| missing("date of birth"))?,
        age: draft.age().and_then(|age| i32::try_from(age).ok()),
        phone_number: draft.phone_number.trim().to_string(),
        email: draft.email.trim().to_string(),
        ktp_number: draft.ktp_number.trim().to_string(),
        last_education: draft
            .last_education
            .map(|level| level.as_str().to_string())
            .ok_or_else(|| missing("last education"))?,
        applied_position: draft.applied_position.trim().to_string(),
        last_salary: draft.last_salary,
        expected_salary: draft.expected_salary.ok_or_else(|| missing("expected salary"))?,
        domicile_city: draft.domicile_city.trim().to_string(),
        ready_to_relocate: draft.ready_to_relocate,
        photo_url: photo_url.to_string(),
        cv_url: cv_url.to_string(),
        applied_at,
    })
}

/// Complete entries only, year-months canonicalised to the first of the month.
fn experience_records(application_id: Uuid, draft: &FormDraft) -> Vec<NewWorkExperience> {
    draft
        .experiences
        .complete_entries()
        .filter_map(|(_, entry)| {
            Some(NewWorkExperience {
                application_id,
                position: entry.position().trim().to_string(),
                company_name: entry.company_name().trim().to_string(),
                start_date: entry.start_period()?.first_day(),
                end_date: entry.end_period().map(|ym| ym.first_day()),
                is_current_job: entry.is_current(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::NaiveDate;

    use crate::form::ExperienceField;
    use crate::models::applicant::EducationLevel;
    use crate::testing::{FakeStorage, FakeStore, StoreCall};

    fn ym(s: &str) -> Option<crate::models::period::YearMonth> {
        Some(s.parse().unwrap())
    }

    fn file(name: &str, size: usize) -> PendingFile {
        PendingFile::new(name, Some("application/octet-stream".into()), Bytes::from(vec![0u8; size]))
    }

    fn filled_draft() -> FormDraft {
        let mut draft = FormDraft::new("Staff Admin");
        draft.full_name = "Dewi Lestari".into();
        draft.nick_name = "Dewi".into();
        draft.address = "Jl. Merdeka 10, Bandung".into();
        draft.set_date_of_birth(
            NaiveDate::from_ymd_opt(1996, 4, 2),
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        );
        draft.phone_number = "081234567890".into();
        draft.email = "dewi@example.com".into();
        draft.ktp_number = "3273000000000001".into();
        draft.last_education = Some(EducationLevel::S1);
        draft.expected_salary = Some(6_500_000.0);
        draft.domicile_city = "Bandung".into();
        draft
    }

    fn fill_experience(draft: &mut FormDraft, index: usize, position: &str, company: &str, start: &str) {
        let list = &mut draft.experiences;
        list.set_field(index, ExperienceField::Position(position.into()));
        list.set_field(index, ExperienceField::CompanyName(company.into()));
        list.set_field(index, ExperienceField::StartPeriod(ym(start)));
    }

    fn assembler(store: &Arc<FakeStore>, storage: &Arc<FakeStorage>) -> ApplicationAssembler {
        ApplicationAssembler::new(
            store.clone(),
            storage.clone(),
            "applicant-documents",
            UploadLimits::default(),
        )
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-04-01T08:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_oversized_cv_rejected_before_any_network_call() {
        let store = Arc::new(FakeStore::default());
        let storage = Arc::new(FakeStorage::default());
        let mut draft = filled_draft();
        draft.photo = Some(file("foto.jpg", 150 * 1024));
        draft.cv = Some(file("cv.pdf", 2 * 1024 * 1024));

        let err = assembler(&store, &storage).submit(&draft, now()).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        let msg = err.to_string();
        assert!(msg.contains("CV"), "message was {msg}");
        assert!(msg.contains("1 MiB"), "message was {msg}");
        assert!(storage.uploads().is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_photo_limit_is_configurable() {
        let store = Arc::new(FakeStore::default());
        let storage = Arc::new(FakeStorage::default());
        let mut draft = filled_draft();
        draft.photo = Some(file("foto.jpg", 300 * 1024));

        let strict = assembler(&store, &storage);
        let err = strict.validate(&draft).unwrap_err();
        assert!(err.to_string().contains("Photo"));
        assert!(err.to_string().contains("200 KiB"));

        let relaxed = ApplicationAssembler::new(
            store.clone(),
            storage.clone(),
            "applicant-documents",
            UploadLimits {
                photo_max_bytes: 500 * 1024,
                ..UploadLimits::default()
            },
        );
        assert!(relaxed.validate(&draft).is_ok());
    }

    #[tokio::test]
    async fn test_missing_required_field_is_validation_error() {
        let store = Arc::new(FakeStore::default());
        let storage = Arc::new(FakeStorage::default());
        let mut draft = filled_draft();
        draft.email.clear();

        let err = assembler(&store, &storage).submit(&draft, now()).await.unwrap_err();
        assert!(err.to_string().contains("email"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_experience_is_dropped_silently() {
        let store = Arc::new(FakeStore::default());
        let storage = Arc::new(FakeStorage::default());
        let mut draft = filled_draft();
        fill_experience(&mut draft, 0, "Kasir", "Toko Sejahtera", "2018-01");
        draft.experiences.set_field(0, ExperienceField::EndPeriod(ym("2020-06")));
        draft.experiences.add().unwrap();
        fill_experience(&mut draft, 1, "Admin Gudang", "PT Logistik", "2020-07");
        draft.experiences.set_field(1, ExperienceField::IsCurrent(true));
        draft.experiences.add().unwrap();
        fill_experience(&mut draft, 2, "Sales", "", "2017-01");

        let receipt = assembler(&store, &storage).submit(&draft, now()).await.unwrap();

        assert_eq!(receipt.experiences_saved, 2);
        let saved = store.saved_experiences();
        assert_eq!(saved.len(), 2);
        assert!(saved.iter().all(|e| e.application_id == receipt.application_id));
        assert_eq!(saved[0].start_date, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(saved[0].end_date, NaiveDate::from_ymd_opt(2020, 6, 1));
        assert!(saved[1].is_current_job);
        assert_eq!(saved[1].end_date, None);
    }

    #[tokio::test]
    async fn test_complete_past_job_without_end_period_is_rejected() {
        let store = Arc::new(FakeStore::default());
        let storage = Arc::new(FakeStorage::default());
        let mut draft = filled_draft();
        fill_experience(&mut draft, 0, "Kasir", "Toko Sejahtera", "2018-01");

        let err = assembler(&store, &storage).submit(&draft, now()).await.unwrap_err();
        assert!(err.to_string().contains("Work experience 1"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_uploads_then_inserts_in_order() {
        let store = Arc::new(FakeStore::default());
        let storage = Arc::new(FakeStorage::default());
        let mut draft = filled_draft();
        draft.photo = Some(file("pas foto.png", 150 * 1024));
        draft.cv = Some(file("cv.pdf", 512 * 1024));

        let receipt = assembler(&store, &storage).submit(&draft, now()).await.unwrap();

        let keys: Vec<String> = storage.uploads().into_iter().map(|(_, key)| key).collect();
        let millis = now().timestamp_millis();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].starts_with(&format!("photos/{millis}-")));
        assert!(keys[0].ends_with("-pas_foto.png"));
        assert!(keys[1].starts_with(&format!("cvs/{millis}-")));
        assert!(keys[1].ends_with("-cv.pdf"));
        assert_eq!(
            receipt.photo_url,
            format!("https://storage.test/applicant-documents/{}", keys[0])
        );

        let record = store.saved_application().unwrap();
        assert_eq!(record.photo_url, receipt.photo_url);
        assert_eq!(record.cv_url, receipt.cv_url);
        assert_eq!(record.age, Some(28));
        assert_eq!(record.last_education, "S1");
        assert_eq!(record.applied_at, now());
        // The default blank experience entry is incomplete, so nothing else is written.
        assert_eq!(store.calls(), vec![StoreCall::InsertApplication]);
    }

    #[tokio::test]
    async fn test_no_files_means_empty_urls() {
        let store = Arc::new(FakeStore::default());
        let storage = Arc::new(FakeStorage::default());

        let receipt = assembler(&store, &storage)
            .submit(&filled_draft(), now())
            .await
            .unwrap();

        assert!(receipt.photo_url.is_empty());
        assert!(receipt.cv_url.is_empty());
        assert!(storage.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_stops_before_insert() {
        let store = Arc::new(FakeStore::default());
        let storage = Arc::new(FakeStorage::failing("bucket not found"));
        let mut draft = filled_draft();
        draft.photo = Some(file("foto.jpg", 1024));

        let err = assembler(&store, &storage).submit(&draft, now()).await.unwrap_err();

        assert!(matches!(err, AppError::Dependency(_)));
        assert!(err.to_string().contains("bucket not found"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_experience_insert_deletes_primary_record() {
        let store = Arc::new(FakeStore::failing_experiences("violates foreign key"));
        let storage = Arc::new(FakeStorage::default());
        let mut draft = filled_draft();
        fill_experience(&mut draft, 0, "Kasir", "Toko Sejahtera", "2018-01");
        draft.experiences.set_field(0, ExperienceField::IsCurrent(true));

        let err = assembler(&store, &storage).submit(&draft, now()).await.unwrap_err();

        let id = match &err {
            AppError::Consistency {
                application_id,
                rollback_failure,
                ..
            } => {
                assert!(rollback_failure.is_none());
                *application_id
            }
            other => panic!("expected consistency error, got {other:?}"),
        };
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::InsertApplication,
                StoreCall::InsertWorkExperiences,
                StoreCall::DeleteApplication(id),
            ]
        );
        assert!(err.to_string().contains("violates foreign key"));
        assert!(store.saved_application().is_none());
    }

    #[tokio::test]
    async fn test_failed_rollback_reports_both_causes() {
        let store = Arc::new(
            FakeStore::failing_experiences("disk full").with_failing_delete("connection reset"),
        );
        let storage = Arc::new(FakeStorage::default());
        let mut draft = filled_draft();
        fill_experience(&mut draft, 0, "Kasir", "Toko Sejahtera", "2018-01");
        draft.experiences.set_field(0, ExperienceField::IsCurrent(true));

        let err = assembler(&store, &storage).submit(&draft, now()).await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("disk full"), "message was {msg}");
        assert!(msg.contains("connection reset"), "message was {msg}");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(200 * 1024), "200 KiB");
        assert_eq!(format_size(1024 * 1024), "1 MiB");
        assert_eq!(format_size(2 * 1024 * 1024 + 1), "2049 KiB");
        assert_eq!(format_size(10), "10 bytes");
    }
}
