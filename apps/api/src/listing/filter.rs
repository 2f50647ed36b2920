//! Case-insensitive free-text and exact-selector filtering over fetched
//! snapshots. The result is a pure function of the records and the criteria.

use serde::Deserialize;

use crate::models::applicant::ApplicantWithExperiences;
use crate::models::job_posting::JobPosting;

pub trait Searchable {
    /// Fields the free-text query is matched against.
    fn haystack(&self) -> Vec<&str>;

    /// Field compared for equality with the selector.
    fn selector_field(&self) -> &str;
}

impl Searchable for JobPosting {
    fn haystack(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.company.as_str(),
            self.location.as_str(),
            self.job_type.as_str(),
            self.description.as_str(),
        ]
    }

    fn selector_field(&self) -> &str {
        &self.title
    }
}

/// Nested experiences are searched too; a hit in any of them matches the
/// applicant.
impl Searchable for ApplicantWithExperiences {
    fn haystack(&self) -> Vec<&str> {
        let a = &self.applicant;
        let mut fields = vec![
            a.full_name.as_str(),
            a.email.as_str(),
            a.domicile_city.as_str(),
            a.phone_number.as_str(),
        ];
        for exp in &self.applicant_work_experiences {
            fields.push(&exp.position);
            fields.push(&exp.company_name);
        }
        fields
    }

    fn selector_field(&self) -> &str {
        &self.applicant.applied_position
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Criteria {
    #[serde(default, rename = "q")]
    pub query: Option<String>,
    /// Exact match on the record's selector field, e.g. applied position.
    #[serde(default, rename = "position")]
    pub selector: Option<String>,
}

impl Criteria {
    pub fn query(query: &str) -> Self {
        Self {
            query: Some(query.to_string()),
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    // Empty strings come from "All" options and cleared search boxes.
    fn active_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    fn active_selector(&self) -> Option<&str> {
        self.selector.as_deref().filter(|s| !s.is_empty())
    }

    pub fn matches<T: Searchable>(&self, record: &T) -> bool {
        if let Some(selector) = self.active_selector() {
            if record.selector_field() != selector {
                return false;
            }
        }
        match self.active_query() {
            Some(query) => record
                .haystack()
                .iter()
                .any(|field| field.to_lowercase().contains(&query)),
            None => true,
        }
    }
}

pub fn filter_listing<'a, T: Searchable>(records: &'a [T], criteria: &Criteria) -> Vec<&'a T> {
    records.iter().filter(|r| criteria.matches(*r)).collect()
}

/// Distinct titles in first-seen order.
pub fn distinct_titles(postings: &[JobPosting]) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for posting in postings {
        if !titles.iter().any(|t| t == &posting.title) {
            titles.push(posting.title.clone());
        }
    }
    titles
}
