// Application form engine: derived fields, the repeatable work-experience group
// and the draft that stages a submission. Nothing here touches I/O.

pub mod age;
pub mod controller;
pub mod draft;
pub mod experience;

pub use draft::{FormDraft, PendingFile};
pub use experience::{ExperienceDraft, ExperienceField, ExperienceList, MAX_EXPERIENCES};
