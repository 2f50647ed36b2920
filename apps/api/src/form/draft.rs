use bytes::Bytes;
use chrono::NaiveDate;

use crate::form::age::age_on;
use crate::form::experience::ExperienceList;
use crate::models::applicant::EducationLevel;

/// A file chosen in the form but not yet uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl PendingFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// The in-progress application. `age` is derived from `date_of_birth` and has
/// no setter of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDraft {
    pub full_name: String,
    pub nick_name: String,
    pub address: String,
    date_of_birth: Option<NaiveDate>,
    age: Option<u32>,
    pub phone_number: String,
    pub email: String,
    pub ktp_number: String,
    pub last_education: Option<EducationLevel>,
    pub applied_position: String,
    pub last_salary: Option<f64>,
    pub expected_salary: Option<f64>,
    pub domicile_city: String,
    pub ready_to_relocate: bool,
    pub experiences: ExperienceList,
    pub photo: Option<PendingFile>,
    pub cv: Option<PendingFile>,
}

impl FormDraft {
    /// A blank draft with the applied position prefilled (e.g. from the
    /// posting the applicant clicked on).
    pub fn new(applied_position: impl Into<String>) -> Self {
        Self {
            applied_position: applied_position.into(),
            ..Self::default()
        }
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    pub fn age(&self) -> Option<u32> {
        self.age
    }

    /// Sets the birth date and recomputes the age against `today`.
    pub fn set_date_of_birth(&mut self, date_of_birth: Option<NaiveDate>, today: NaiveDate) {
        self.date_of_birth = date_of_birth;
        self.age = date_of_birth.and_then(|birth| age_on(birth, today));
    }

    /// Back to a blank draft with one expanded experience entry and no files.
    pub fn reset(&mut self, applied_position: &str) {
        *self = Self::new(applied_position);
    }

    /// Names of required fields that are still empty, in form order.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let text_fields = [
            ("full name", &self.full_name),
            ("nickname", &self.nick_name),
            ("address", &self.address),
        ];
        let contact_fields = [
            ("phone number", &self.phone_number),
            ("email", &self.email),
            ("national ID number", &self.ktp_number),
        ];

        let mut missing: Vec<&'static str> = text_fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if self.date_of_birth.is_none() {
            missing.push("date of birth");
        }
        missing.extend(
            contact_fields
                .iter()
                .filter(|(_, value)| value.trim().is_empty())
                .map(|(name, _)| *name),
        );
        if self.last_education.is_none() {
            missing.push("last education");
        }
        if self.applied_position.trim().is_empty() {
            missing.push("applied position");
        }
        if self.expected_salary.is_none() {
            missing.push("expected salary");
        }
        if self.domicile_city.trim().is_empty() {
            missing.push("domicile city");
        }
        missing
    }
}
