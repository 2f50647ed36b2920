use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "SMP")]
    Smp,
    #[serde(rename = "SMA")]
    Sma,
    D1,
    D3,
    S1,
}

impl EducationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Smp => "SMP",
            EducationLevel::Sma => "SMA",
            EducationLevel::D1 => "D1",
            EducationLevel::D3 => "D3",
            EducationLevel::S1 => "S1",
        }
    }
}

impl FromStr for EducationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SMP" => Ok(EducationLevel::Smp),
            "SMA" => Ok(EducationLevel::Sma),
            "D1" => Ok(EducationLevel::D1),
            "D3" => Ok(EducationLevel::D3),
            "S1" => Ok(EducationLevel::S1),
            other => Err(format!("Unknown education level '{other}'")),
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `applications` table. Columns that older submissions may have
/// left empty are optional.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Applicant {
    pub id: Uuid,
    pub full_name: String,
    pub nick_name: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<i32>,
    pub phone_number: String,
    pub email: String,
    pub ktp_number: Option<String>,
    pub last_education: Option<String>,
    pub applied_position: String,
    pub last_salary: Option<f64>,
    pub expected_salary: Option<f64>,
    pub domicile_city: String,
    pub ready_to_relocate: bool,
    pub photo_url: Option<String>,
    pub cv_url: Option<String>,
    pub applied_at: DateTime<Utc>,
}

/// A row of the `applicant_work_experiences` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkExperience {
    pub id: Uuid,
    pub application_id: Uuid,
    pub position: String,
    pub company_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current_job: bool,
}

/// An applicant joined with the experiences it exclusively owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantWithExperiences {
    #[serde(flatten)]
    pub applicant: Applicant,
    pub applicant_work_experiences: Vec<WorkExperience>,
}

/// Primary record written by the submission path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewApplication {
    pub full_name: String,
    pub nick_name: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
    pub age: Option<i32>,
    pub phone_number: String,
    pub email: String,
    pub ktp_number: String,
    pub last_education: String,
    pub applied_position: String,
    pub last_salary: Option<f64>,
    pub expected_salary: f64,
    pub domicile_city: String,
    pub ready_to_relocate: bool,
    pub photo_url: String,
    pub cv_url: String,
    pub applied_at: DateTime<Utc>,
}

/// Dependent record, tagged with the identifier of its new primary record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewWorkExperience {
    pub application_id: Uuid,
    pub position: String,
    pub company_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current_job: bool,
}
