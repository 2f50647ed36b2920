use serde::Serialize;
use thiserror::Error;

use crate::models::period::YearMonth;

/// Upper bound on work-experience entries per application.
pub const MAX_EXPERIENCES: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("At most {MAX_EXPERIENCES} work experiences can be added")]
pub struct CapacityReached;

/// One work-experience entry being edited.
///
/// Fields are private so that `is_current == true` always implies an empty end
/// period; all mutation goes through [`ExperienceDraft::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExperienceDraft {
    position: String,
    company_name: String,
    start_period: Option<YearMonth>,
    end_period: Option<YearMonth>,
    is_current: bool,
}

/// A single field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperienceField {
    Position(String),
    CompanyName(String),
    StartPeriod(Option<YearMonth>),
    EndPeriod(Option<YearMonth>),
    IsCurrent(bool),
}

impl ExperienceDraft {
    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn start_period(&self) -> Option<YearMonth> {
        self.start_period
    }

    pub fn end_period(&self) -> Option<YearMonth> {
        self.end_period
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    /// Applies one update. Marking the entry current clears its end period in
    /// the same step; an end period cannot be set while the entry is current.
    pub fn apply(&mut self, field: ExperienceField) {
        match field {
            ExperienceField::Position(value) => self.position = value,
            ExperienceField::CompanyName(value) => self.company_name = value,
            ExperienceField::StartPeriod(value) => self.start_period = value,
            ExperienceField::EndPeriod(value) => {
                if !self.is_current {
                    self.end_period = value;
                }
            }
            ExperienceField::IsCurrent(true) => {
                self.is_current = true;
                self.end_period = None;
            }
            ExperienceField::IsCurrent(false) => self.is_current = false,
        }
    }

    /// Position, company and start period are all filled in. Incomplete
    /// entries are dropped at submission rather than reported.
    pub fn is_complete(&self) -> bool {
        !self.position.trim().is_empty()
            && !self.company_name.trim().is_empty()
            && self.start_period.is_some()
    }

    pub fn requires_end_period(&self) -> bool {
        !self.is_current
    }

    pub fn is_missing_end_period(&self) -> bool {
        self.requires_end_period() && self.end_period.is_none()
    }
}

/// Ordered, capped list of experience drafts with at most one entry expanded
/// for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceList {
    entries: Vec<ExperienceDraft>,
    expanded: Option<usize>,
}

impl Default for ExperienceList {
    /// One blank entry, expanded.
    fn default() -> Self {
        Self {
            entries: vec![ExperienceDraft::default()],
            expanded: Some(0),
        }
    }
}

impl ExperienceList {
    pub fn entries(&self) -> &[ExperienceDraft] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ExperienceDraft> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn can_add(&self) -> bool {
        self.entries.len() < MAX_EXPERIENCES
    }

    /// Removal is only offered while more than one entry exists.
    pub fn can_remove(&self) -> bool {
        self.entries.len() > 1
    }

    /// Appends a blank entry and makes it the expanded one.
    pub fn add(&mut self) -> Result<usize, CapacityReached> {
        if !self.can_add() {
            return Err(CapacityReached);
        }
        self.entries.push(ExperienceDraft::default());
        let index = self.entries.len() - 1;
        self.expanded = Some(index);
        Ok(index)
    }

    /// Removes entry `index`, keeping the expanded index pointed at the same
    /// entry. A lone survivor is force-expanded. Out-of-range is a no-op.
    pub fn remove(&mut self, index: usize) -> Option<ExperienceDraft> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);

        self.expanded = match self.expanded {
            Some(current) if current == index => None,
            Some(current) if current > index => Some(current - 1),
            other => other,
        };
        match self.entries.len() {
            0 => self.expanded = None,
            1 => self.expanded = Some(0),
            _ => {}
        }

        Some(removed)
    }

    /// Collapses `index` if it is expanded, otherwise expands it alone.
    pub fn toggle_expand(&mut self, index: usize) {
        if index >= self.entries.len() {
            return;
        }
        self.expanded = if self.expanded == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    /// Returns false when `index` does not exist.
    pub fn set_field(&mut self, index: usize, field: ExperienceField) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.apply(field);
                true
            }
            None => false,
        }
    }

    /// Entries that will be persisted, paired with their position in the list.
    pub fn complete_entries(&self) -> impl Iterator<Item = (usize, &ExperienceDraft)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_complete())
    }
}
