//! Tabular projections of applicants for download: a compact summary with all
//! experiences in one multi-line cell, and a flat sheet with a fixed number
//! of experience slots per row.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::applicant::{ApplicantWithExperiences, WorkExperience};

pub const EXPERIENCE_SLOTS: usize = 5;
pub const PLACEHOLDER: &str = "-";

const CURRENT_LABEL: &str = "Saat Ini";
const URL_PREVIEW_CHARS: usize = 30;
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

const SUMMARY_COLUMNS: [&str; 9] = [
    "Nama Lengkap",
    "Posisi Dilamar",
    "Email",
    "No HP",
    "Kota Domisili",
    "Siap Relokasi",
    "Pengalaman Kerja",
    "Diunggah Pada",
    "Dokumen (Foto & CV)",
];

const FLAT_COLUMNS: [&str; 17] = [
    "Nama Lengkap",
    "Nama Panggilan",
    "Alamat",
    "Tanggal Lahir",
    "Usia",
    "Nomor HP",
    "Email",
    "Nomor KTP",
    "Pendidikan Terakhir",
    "Posisi Dilamar",
    "Gaji Terakhir",
    "Gaji Diharapkan",
    "Kota Domisili",
    "Siap Relokasi",
    "Diunggah Pada",
    "URL Foto",
    "URL CV",
];

const SLOT_FIELDS: [&str; 5] = ["Posisi", "Perusahaan", "Periode Mulai", "Periode Selesai", "Saat Ini"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Summary,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Current job first, then most recent start first. Ties keep input order.
pub fn ordered_experiences(experiences: &[WorkExperience]) -> Vec<&WorkExperience> {
    let mut ordered: Vec<&WorkExperience> = experiences.iter().collect();
    ordered.sort_by(|a, b| {
        b.is_current_job
            .cmp(&a.is_current_job)
            .then(b.start_date.cmp(&a.start_date))
    });
    ordered
}

pub fn format_month_year(date: NaiveDate) -> String {
    format!("{} {}", MONTHS[date.month0() as usize], date.year())
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    format!(
        "{} {} {} {:02}.{:02}",
        at.day(),
        MONTHS[at.month0() as usize],
        at.year(),
        at.hour(),
        at.minute()
    )
}

fn yes_no(flag: bool) -> String {
    let label = if flag { "Ya" } else { "Tidak" };
    label.to_string()
}

fn or_placeholder(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn end_label(exp: &WorkExperience) -> String {
    if exp.is_current_job {
        CURRENT_LABEL.to_string()
    } else {
        exp.end_date.map(format_month_year).unwrap_or_default()
    }
}

/// One line per experience: `"{position} di {company} ({start} - {end})"`.
pub fn experience_summary(experiences: &[WorkExperience]) -> String {
    if experiences.is_empty() {
        return PLACEHOLDER.to_string();
    }
    ordered_experiences(experiences)
        .into_iter()
        .map(|exp| {
            format!(
                "{} di {} ({} - {})",
                exp.position,
                exp.company_name,
                format_month_year(exp.start_date),
                end_label(exp)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn url_preview(label: &str, url: Option<&str>) -> Option<String> {
    let url = url.filter(|u| !u.is_empty())?;
    let head: String = url.chars().take(URL_PREVIEW_CHARS).collect();
    Some(format!("{label}: {head}..."))
}

fn documents_cell(photo_url: Option<&str>, cv_url: Option<&str>) -> String {
    let lines: Vec<String> = [url_preview("Foto", photo_url), url_preview("CV", cv_url)]
        .into_iter()
        .flatten()
        .collect();
    if lines.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        lines.join("\n")
    }
}

pub fn summary_table(applicants: &[ApplicantWithExperiences]) -> ExportTable {
    let rows = applicants
        .iter()
        .map(|entry| {
            let a = &entry.applicant;
            vec![
                a.full_name.clone(),
                a.applied_position.clone(),
                a.email.clone(),
                a.phone_number.clone(),
                a.domicile_city.clone(),
                yes_no(a.ready_to_relocate),
                experience_summary(&entry.applicant_work_experiences),
                format_timestamp(a.applied_at),
                documents_cell(a.photo_url.as_deref(), a.cv_url.as_deref()),
            ]
        })
        .collect();

    ExportTable {
        columns: SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

fn slot_cells(exp: Option<&WorkExperience>) -> [String; 5] {
    match exp {
        Some(exp) => [
            exp.position.clone(),
            exp.company_name.clone(),
            format_month_year(exp.start_date),
            end_label(exp),
            yes_no(exp.is_current_job),
        ],
        None => std::array::from_fn(|_| PLACEHOLDER.to_string()),
    }
}

/// Fixed-width rows: the scalar columns followed by `slots` groups of five
/// experience columns. Experiences beyond `slots` are not exported.
pub fn flattened_table(applicants: &[ApplicantWithExperiences], slots: usize) -> ExportTable {
    let mut columns: Vec<String> = FLAT_COLUMNS.iter().map(|c| c.to_string()).collect();
    for slot in 1..=slots {
        columns.extend(
            SLOT_FIELDS
                .iter()
                .map(|field| format!("Pengalaman Kerja {slot} - {field}")),
        );
    }

    let rows = applicants
        .iter()
        .map(|entry| {
            let a = &entry.applicant;
            let mut row = vec![
                a.full_name.clone(),
                or_placeholder(a.nick_name.clone()),
                or_placeholder(a.address.clone()),
                or_placeholder(a.date_of_birth.map(|d| d.to_string())),
                or_placeholder(a.age.map(|age| age.to_string())),
                a.phone_number.clone(),
                a.email.clone(),
                or_placeholder(a.ktp_number.clone()),
                or_placeholder(a.last_education.clone()),
                a.applied_position.clone(),
                or_placeholder(a.last_salary.map(|s| s.to_string())),
                or_placeholder(a.expected_salary.map(|s| s.to_string())),
                a.domicile_city.clone(),
                yes_no(a.ready_to_relocate),
                format_timestamp(a.applied_at),
                or_placeholder(a.photo_url.clone()),
                or_placeholder(a.cv_url.clone()),
            ];
            let ordered = ordered_experiences(&entry.applicant_work_experiences);
            for slot in 0..slots {
                row.extend(slot_cells(ordered.get(slot).copied()));
            }
            row
        })
        .collect();

    ExportTable { columns, rows }
}

pub fn shape(applicants: &[ApplicantWithExperiences], format: ExportFormat) -> ExportTable {
    match format {
        ExportFormat::Summary => summary_table(applicants),
        ExportFormat::Flat => flattened_table(applicants, EXPERIENCE_SLOTS),
    }
}
