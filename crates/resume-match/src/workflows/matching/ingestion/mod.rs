//! Resume ingestion pipeline: validate the upload, transfer the bytes to
//! object storage, then run text and structured extraction to produce a
//! [`CandidateProfile`].

pub mod schema;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::domain::{CandidateProfile, ResumeDocument};
pub use schema::ResumeSchema;

/// Upper bound on accepted resume uploads.
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

/// Media types the pipeline accepts. Everything else is rejected before any
/// collaborator is contacted.
pub const ACCEPTED_MEDIA_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Opaque handle returned by the object-storage collaborator. The core never
/// interprets it beyond carrying it back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageReference(pub String);

/// Object-storage collaborator boundary.
pub trait ObjectStore: Send + Sync {
    fn store(&self, bytes: &[u8], key: &str) -> Result<StorageReference, StorageError>;
}

/// Text-extraction collaborator boundary.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Structured-extraction collaborator boundary. The returned object is
/// re-validated locally against `schema`; the collaborator is not trusted to
/// enforce it.
pub trait StructuredExtractor: Send + Sync {
    fn extract(
        &self,
        text: &str,
        schema: &ResumeSchema,
    ) -> Result<serde_json::Value, ExtractionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("extraction backend failed: {0}")]
    Backend(String),
}

/// Typed failures surfaced by [`ProfileExtractor::submit`].
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("invalid resume upload: {reason}")]
    InvalidInput { reason: String },
    #[error("resume transfer failed: {reason}")]
    TransferFailed { reason: String },
    #[error("resume analysis failed: {reason}")]
    AnalysisFailed { reason: String },
}

/// Pipeline phase reported through [`ProgressObserver`]. Transfer always
/// completes before any Extraction update is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionPhase {
    Transfer,
    Extraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub phase: IngestionPhase,
    pub percent: u8,
}

/// Progress-reporting contract. Updates for one submission are strictly
/// ordered and monotonically non-decreasing within each phase; a superseded
/// submission's stream is silenced.
pub trait ProgressObserver: Send + Sync {
    fn progress(&self, update: ProgressUpdate);
}

/// Default observer for callers that do not surface progress.
pub struct NullProgressObserver;

impl ProgressObserver for NullProgressObserver {
    fn progress(&self, _update: ProgressUpdate) {}
}

/// Result of a completed submission. `Superseded` means a newer submission
/// replaced this one while it was in flight; its output must be discarded.
#[derive(Debug)]
pub enum SubmissionOutcome {
    Completed {
        profile: CandidateProfile,
        reference: StorageReference,
    },
    Superseded,
}

/// Drives the two-phase ingestion pipeline against the collaborator traits.
pub struct ProfileExtractor {
    store: Arc<dyn ObjectStore>,
    text: Arc<dyn TextExtractor>,
    structured: Arc<dyn StructuredExtractor>,
    observer: Arc<dyn ProgressObserver>,
    generation: AtomicU64,
}

impl ProfileExtractor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        text: Arc<dyn TextExtractor>,
        structured: Arc<dyn StructuredExtractor>,
    ) -> Self {
        Self::with_observer(store, text, structured, Arc::new(NullProgressObserver))
    }

    pub fn with_observer(
        store: Arc<dyn ObjectStore>,
        text: Arc<dyn TextExtractor>,
        structured: Arc<dyn StructuredExtractor>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            store,
            text,
            structured,
            observer,
            generation: AtomicU64::new(0),
        }
    }

    /// Validates and ingests one resume. Validation failures are detected
    /// before any collaborator call and before the submission claims the
    /// in-flight slot, so a rejected upload never cancels a pending one.
    pub fn submit(&self, document: ResumeDocument) -> Result<SubmissionOutcome, IngestionError> {
        validate_document(&document)?;

        // Claiming a new generation supersedes any submission still in flight.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.emit(generation, IngestionPhase::Transfer, 0);
        let key = storage_key(&document.file_name);
        let reference = self
            .store
            .store(&document.bytes, &key)
            .map_err(|err| IngestionError::TransferFailed {
                reason: err.to_string(),
            })?;
        self.emit(generation, IngestionPhase::Transfer, 100);
        debug!(%key, "resume transferred to object storage");

        self.emit(generation, IngestionPhase::Extraction, 0);
        let text = self
            .text
            .extract_text(&document.bytes)
            .map_err(|err| IngestionError::AnalysisFailed {
                reason: err.to_string(),
            })?;
        self.emit(generation, IngestionPhase::Extraction, 40);

        let raw = self
            .structured
            .extract(&text, ResumeSchema::v1())
            .map_err(|err| IngestionError::AnalysisFailed {
                reason: err.to_string(),
            })?;
        self.emit(generation, IngestionPhase::Extraction, 80);

        let profile = schema::profile_from_analysis(raw)?;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("resume submission superseded, discarding completion");
            return Ok(SubmissionOutcome::Superseded);
        }
        self.emit(generation, IngestionPhase::Extraction, 100);

        Ok(SubmissionOutcome::Completed { profile, reference })
    }

    fn emit(&self, generation: u64, phase: IngestionPhase, percent: u8) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.observer.progress(ProgressUpdate { phase, percent });
        }
    }
}

fn validate_document(document: &ResumeDocument) -> Result<(), IngestionError> {
    let media_type = document.media_type.trim();
    if !ACCEPTED_MEDIA_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(media_type))
    {
        return Err(IngestionError::InvalidInput {
            reason: format!("unsupported media type '{media_type}', expected PDF or Word"),
        });
    }

    if document.bytes.len() > MAX_RESUME_BYTES {
        return Err(IngestionError::InvalidInput {
            reason: format!(
                "file exceeds the {} MiB limit",
                MAX_RESUME_BYTES / (1024 * 1024)
            ),
        });
    }

    Ok(())
}

/// Time-qualified storage key so repeated uploads of same-named files never
/// collide.
fn storage_key(file_name: &str) -> String {
    format!("resumes/{}-{}", Utc::now().timestamp_millis(), file_name)
}
