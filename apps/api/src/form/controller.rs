use tracing::debug;

use crate::errors::AppError;
use crate::form::draft::FormDraft;
use crate::submission::SubmissionReceipt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Success(String),
    Failure(String),
}

/// Drives one form instance through submission.
///
/// While a submission is in flight the trigger is refused, so repeated clicks
/// cannot start a second run. Completion after `unmount` leaves state alone.
#[derive(Debug)]
pub struct FormController {
    draft: FormDraft,
    default_position: String,
    in_flight: bool,
    mounted: bool,
    message: Option<StatusMessage>,
}

impl FormController {
    pub fn new(default_position: impl Into<String>) -> Self {
        let default_position = default_position.into();
        Self {
            draft: FormDraft::new(default_position.clone()),
            default_position,
            in_flight: false,
            mounted: true,
            message: None,
        }
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut FormDraft {
        &mut self.draft
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    /// Marks a submission as started and hands back the draft snapshot to
    /// submit. Returns `None` while another submission is running.
    pub fn begin_submit(&mut self) -> Option<FormDraft> {
        if self.in_flight {
            debug!("Submit ignored: a submission is already in flight");
            return None;
        }
        self.in_flight = true;
        self.message = None;
        Some(self.draft.clone())
    }

    /// Records the outcome. Success resets the draft; failure keeps it so the
    /// user can retry.
    pub fn finish_submit(&mut self, outcome: Result<SubmissionReceipt, AppError>) {
        if !self.mounted {
            debug!("Submission finished after unmount; state left untouched");
            return;
        }
        self.in_flight = false;
        match outcome {
            Ok(receipt) => {
                self.draft.reset(&self.default_position);
                self.message = Some(StatusMessage::Success(receipt.message));
            }
            Err(err) => {
                self.message = Some(StatusMessage::Failure(format!(
                    "Failed to submit application: {err}"
                )));
            }
        }
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }
}
