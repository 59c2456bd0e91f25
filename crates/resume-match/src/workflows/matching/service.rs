//! Session facade composing ingestion, the match catalog, and the
//! application tracker behind a single lock.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::info;

use super::catalog::{MatchCatalog, MatchQuery, MatchRow};
use super::domain::{CandidateProfile, JobPosting, PostingId, ResumeDocument};
use super::ingestion::{
    IngestionError, ProfileExtractor, StorageReference, SubmissionOutcome,
};
use super::tracker::{
    Application, ApplicationError, ApplicationId, ApplicationStats, ApplicationTracker,
};

/// Outcome of a resume upload as seen by callers of the service.
#[derive(Debug)]
pub enum ResumeUploadOutcome {
    /// The profile was installed as the session's current profile and every
    /// cached match result was recomputed against it.
    Accepted(CandidateProfile),
    /// A newer upload superseded this one; session state is untouched.
    Superseded,
}

#[derive(Default)]
struct SessionState {
    profile: Option<CandidateProfile>,
    resume_reference: Option<StorageReference>,
    catalog: MatchCatalog,
    tracker: ApplicationTracker,
}

/// One candidate session: the current profile, the posting catalog with its
/// result cache, and the tracked applications. All mutation funnels through
/// the session lock, so readers always observe a fully-updated profile.
pub struct MatchboardService {
    extractor: ProfileExtractor,
    state: Mutex<SessionState>,
}

impl MatchboardService {
    pub fn new(extractor: ProfileExtractor) -> Self {
        Self {
            extractor,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Ingests a resume. Collaborator calls run outside the session lock;
    /// only the install step (replace profile + rescore cache, one atomic
    /// unit) takes it.
    pub fn upload_resume(
        &self,
        document: ResumeDocument,
    ) -> Result<ResumeUploadOutcome, IngestionError> {
        match self.extractor.submit(document)? {
            SubmissionOutcome::Completed { profile, reference } => {
                let mut state = self.lock();
                state.profile = Some(profile.clone());
                state.resume_reference = Some(reference);
                state.catalog.rescore(&profile);
                info!(
                    skills = profile.skills.len(),
                    postings = state.catalog.len(),
                    "candidate profile replaced, match cache rescored"
                );
                Ok(ResumeUploadOutcome::Accepted(profile))
            }
            SubmissionOutcome::Superseded => Ok(ResumeUploadOutcome::Superseded),
        }
    }

    pub fn current_profile(&self) -> Option<CandidateProfile> {
        self.lock().profile.clone()
    }

    /// Opaque storage handle for the most recently ingested resume.
    pub fn resume_reference(&self) -> Option<StorageReference> {
        self.lock().resume_reference.clone()
    }

    /// Upserts a posting from the job source and scores it against the
    /// current profile.
    pub fn add_or_replace_posting(&self, posting: JobPosting) {
        let mut state = self.lock();
        let profile = state.profile.clone();
        state.catalog.upsert(posting, profile.as_ref());
    }

    pub fn query_matches(&self, query: &MatchQuery) -> Vec<MatchRow> {
        let guard = self.lock();
        let state = &*guard;
        state
            .catalog
            .query(query, |posting_id| state.tracker.status_for(posting_id))
    }

    /// Creates an application for a known posting.
    pub fn apply_to(&self, posting_id: &PostingId) -> Result<Application, ApplicationError> {
        let mut state = self.lock();
        if state.catalog.posting(posting_id).is_none() {
            return Err(ApplicationError::NotFound);
        }
        let application = state.tracker.apply(posting_id.clone(), Utc::now())?.clone();
        info!(application = %application.id.0, posting = %posting_id.0, "application submitted");
        Ok(application)
    }

    pub fn mark_under_review(
        &self,
        id: &ApplicationId,
    ) -> Result<Application, ApplicationError> {
        self.lock().tracker.mark_under_review(id).cloned()
    }

    pub fn schedule_interview(
        &self,
        id: &ApplicationId,
        at: DateTime<Utc>,
    ) -> Result<Application, ApplicationError> {
        self.lock().tracker.schedule_interview(id, at).cloned()
    }

    pub fn reject(&self, id: &ApplicationId) -> Result<Application, ApplicationError> {
        self.lock().tracker.reject(id).cloned()
    }

    pub fn receive_offer(&self, id: &ApplicationId) -> Result<Application, ApplicationError> {
        self.lock().tracker.receive_offer(id).cloned()
    }

    pub fn append_note(&self, id: &ApplicationId, note: &str) -> Result<(), ApplicationError> {
        self.lock().tracker.append_note(id, note)
    }

    pub fn set_next_step(
        &self,
        id: &ApplicationId,
        next_step: Option<String>,
    ) -> Result<(), ApplicationError> {
        self.lock().tracker.set_next_step(id, next_step)
    }

    pub fn application(&self, id: &ApplicationId) -> Option<Application> {
        self.lock().tracker.get(id).cloned()
    }

    pub fn applications(&self) -> Vec<Application> {
        self.lock().tracker.all().cloned().collect()
    }

    pub fn stats(&self) -> ApplicationStats {
        self.lock().tracker.stats()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session mutex poisoned")
    }
}
