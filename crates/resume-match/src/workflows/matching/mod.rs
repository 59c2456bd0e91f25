//! Resume-to-posting matching: ingestion of uploaded resumes into candidate
//! profiles, explainable match scoring over a posting catalog, and lifecycle
//! tracking of the resulting applications.

pub mod catalog;
pub mod domain;
pub mod ingestion;
pub mod router;
pub mod scoring;
pub mod service;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, MatchCatalog, MatchQuery, MatchRow, SortKey, StatusFilter};
pub use domain::{
    CandidateProfile, EducationLevel, JobPosting, MatchResult, PostingId, ResumeDocument,
};
pub use ingestion::{
    ExtractionError, IngestionError, IngestionPhase, ObjectStore, ProfileExtractor,
    ProgressObserver, ProgressUpdate, ResumeSchema, StorageError, StorageReference,
    StructuredExtractor, SubmissionOutcome, TextExtractor,
};
pub use router::matchboard_router;
pub use service::{MatchboardService, ResumeUploadOutcome};
pub use tracker::{
    Application, ApplicationError, ApplicationId, ApplicationStats, ApplicationStatus,
    ApplicationTracker,
};
