//! Application lifecycle state machine and derived statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::PostingId;

/// Identifier wrapper for tracked applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Lifecycle status of a submitted application. `Rejected` and
/// `OfferReceived` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    InterviewScheduled,
    Rejected,
    OfferReceived,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::InterviewScheduled => "interview_scheduled",
            Self::Rejected => "rejected",
            Self::OfferReceived => "offer_received",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submitted" => Some(Self::Submitted),
            "under_review" => Some(Self::UnderReview),
            "interview_scheduled" => Some(Self::InterviewScheduled),
            "rejected" => Some(Self::Rejected),
            "offer_received" => Some(Self::OfferReceived),
            _ => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::OfferReceived)
    }

    /// Normalized progress projection. Pure function of status, recomputed
    /// on read and never stored.
    pub const fn progress(self) -> u8 {
        match self {
            Self::Submitted => 25,
            Self::UnderReview => 50,
            Self::InterviewScheduled => 75,
            Self::OfferReceived => 100,
            Self::Rejected => 0,
        }
    }
}

/// Transition events accepted by the tracker, named in errors so callers can
/// report which operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationEvent {
    MarkUnderReview,
    ScheduleInterview,
    Reject,
    ReceiveOffer,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("invalid transition: {event:?} is not allowed from {from:?}")]
    InvalidTransition {
        from: ApplicationStatus,
        event: ApplicationEvent,
    },
    #[error("an active application already exists for posting '{}'", .0 .0)]
    DuplicateApplication(PostingId),
    #[error("application or posting not found")]
    NotFound,
}

/// A tracked act of applying to a posting. Created once, mutated only
/// through the defined transitions, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub posting_id: PostingId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub notes: String,
    pub next_step: Option<String>,
    pub interview_at: Option<DateTime<Utc>>,
}

/// Aggregate counts derived from the live application set on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub pending: usize,
    pub interviews: usize,
    pub offers: usize,
}

/// Exclusive owner of the application set.
#[derive(Debug, Default)]
pub struct ApplicationTracker {
    applications: BTreeMap<ApplicationId, Application>,
    sequence: u64,
}

impl ApplicationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Submitted application for `posting_id`. At most one
    /// non-terminal application may exist per posting.
    pub fn apply(
        &mut self,
        posting_id: PostingId,
        applied_at: DateTime<Utc>,
    ) -> Result<&Application, ApplicationError> {
        let duplicate = self
            .applications
            .values()
            .any(|app| app.posting_id == posting_id && !app.status.is_terminal());
        if duplicate {
            return Err(ApplicationError::DuplicateApplication(posting_id));
        }

        self.sequence += 1;
        let id = ApplicationId(format!("app-{:06}", self.sequence));
        let application = Application {
            id: id.clone(),
            posting_id,
            status: ApplicationStatus::Submitted,
            applied_at,
            notes: String::new(),
            next_step: None,
            interview_at: None,
        };

        self.applications.insert(id.clone(), application);
        Ok(&self.applications[&id])
    }

    pub fn mark_under_review(
        &mut self,
        id: &ApplicationId,
    ) -> Result<&Application, ApplicationError> {
        self.transition(id, ApplicationEvent::MarkUnderReview, None)
    }

    pub fn schedule_interview(
        &mut self,
        id: &ApplicationId,
        at: DateTime<Utc>,
    ) -> Result<&Application, ApplicationError> {
        self.transition(id, ApplicationEvent::ScheduleInterview, Some(at))
    }

    pub fn reject(&mut self, id: &ApplicationId) -> Result<&Application, ApplicationError> {
        self.transition(id, ApplicationEvent::Reject, None)
    }

    pub fn receive_offer(&mut self, id: &ApplicationId) -> Result<&Application, ApplicationError> {
        self.transition(id, ApplicationEvent::ReceiveOffer, None)
    }

    fn transition(
        &mut self,
        id: &ApplicationId,
        event: ApplicationEvent,
        interview_at: Option<DateTime<Utc>>,
    ) -> Result<&Application, ApplicationError> {
        let application = self
            .applications
            .get_mut(id)
            .ok_or(ApplicationError::NotFound)?;

        let next = match (application.status, event) {
            (ApplicationStatus::Submitted, ApplicationEvent::MarkUnderReview) => {
                ApplicationStatus::UnderReview
            }
            (ApplicationStatus::UnderReview, ApplicationEvent::ScheduleInterview) => {
                ApplicationStatus::InterviewScheduled
            }
            (
                ApplicationStatus::Submitted
                | ApplicationStatus::UnderReview
                | ApplicationStatus::InterviewScheduled,
                ApplicationEvent::Reject,
            ) => ApplicationStatus::Rejected,
            (ApplicationStatus::InterviewScheduled, ApplicationEvent::ReceiveOffer) => {
                ApplicationStatus::OfferReceived
            }
            (from, event) => return Err(ApplicationError::InvalidTransition { from, event }),
        };

        application.status = next;
        if let Some(at) = interview_at {
            application.interview_at = Some(at);
        }
        Ok(application)
    }

    pub fn append_note(
        &mut self,
        id: &ApplicationId,
        note: &str,
    ) -> Result<(), ApplicationError> {
        let application = self
            .applications
            .get_mut(id)
            .ok_or(ApplicationError::NotFound)?;
        if !application.notes.is_empty() {
            application.notes.push('\n');
        }
        application.notes.push_str(note);
        Ok(())
    }

    pub fn set_next_step(
        &mut self,
        id: &ApplicationId,
        next_step: Option<String>,
    ) -> Result<(), ApplicationError> {
        let application = self
            .applications
            .get_mut(id)
            .ok_or(ApplicationError::NotFound)?;
        application.next_step = next_step;
        Ok(())
    }

    pub fn get(&self, id: &ApplicationId) -> Option<&Application> {
        self.applications.get(id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Application> {
        self.applications.values()
    }

    /// Status of the most recent application for a posting, used by catalog
    /// status filters.
    pub fn status_for(&self, posting_id: &PostingId) -> Option<ApplicationStatus> {
        self.applications
            .values()
            .filter(|app| &app.posting_id == posting_id)
            .last()
            .map(|app| app.status)
    }

    /// Counts the live set directly; there are no separately maintained
    /// counters that could drift.
    pub fn stats(&self) -> ApplicationStats {
        let mut stats = ApplicationStats {
            total: 0,
            pending: 0,
            interviews: 0,
            offers: 0,
        };
        for application in self.applications.values() {
            stats.total += 1;
            match application.status {
                ApplicationStatus::Submitted | ApplicationStatus::UnderReview => stats.pending += 1,
                ApplicationStatus::InterviewScheduled => {
                    stats.pending += 1;
                    stats.interviews += 1;
                }
                ApplicationStatus::OfferReceived => stats.offers += 1,
                ApplicationStatus::Rejected => {}
            }
        }
        stats
    }
}
