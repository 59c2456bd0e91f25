//! Ingestion pipeline specifications: local validation before any
//! collaborator call, phase-ordered progress, typed failure mapping, and
//! last-submission-wins supersession.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use serde_json::{json, Value};

use resume_match::workflows::matching::domain::ResumeDocument;
use resume_match::workflows::matching::ingestion::{
    ExtractionError, IngestionPhase, ObjectStore, ProfileExtractor, ProgressObserver,
    ProgressUpdate, ResumeSchema, StorageError, StorageReference, StructuredExtractor,
    TextExtractor,
};
use resume_match::workflows::matching::service::{MatchboardService, ResumeUploadOutcome};
use resume_match::workflows::matching::IngestionError;

fn pdf_document(name: &str, content: &str) -> ResumeDocument {
    ResumeDocument {
        file_name: name.to_string(),
        media_type: "application/pdf".to_string(),
        bytes: content.as_bytes().to_vec(),
    }
}

#[derive(Default)]
struct MemoryStore {
    calls: AtomicUsize,
    fail: bool,
    keys: Mutex<Vec<String>>,
}

impl ObjectStore for MemoryStore {
    fn store(&self, _bytes: &[u8], key: &str) -> Result<StorageReference, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StorageError::Unavailable("bucket offline".to_string()));
        }
        self.keys.lock().expect("lock").push(key.to_string());
        Ok(StorageReference(format!("mem://{key}")))
    }
}

#[derive(Default)]
struct Utf8TextExtractor {
    calls: AtomicUsize,
}

impl TextExtractor for Utf8TextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Structured extractor that reports the resume text back as the single
/// skill, so tests can tell which submission produced a profile.
#[derive(Default)]
struct EchoStructuredExtractor {
    calls: AtomicUsize,
    respond_with: Mutex<Option<Value>>,
}

impl StructuredExtractor for EchoStructuredExtractor {
    fn extract(&self, text: &str, schema: &ResumeSchema) -> Result<Value, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(schema.version, "resume-analysis/v1");
        if let Some(scripted) = self.respond_with.lock().expect("lock").clone() {
            return Ok(scripted);
        }
        Ok(json!({
            "skills": [text.trim()],
            "experience_years": 6,
            "education_level": "Bachelor's degree",
            "job_titles": ["Frontend Developer"],
            "summary": "Frontend engineer.",
            "strengths": ["Shipping"]
        }))
    }
}

#[derive(Default)]
struct CollectingObserver {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl ProgressObserver for CollectingObserver {
    fn progress(&self, update: ProgressUpdate) {
        self.updates.lock().expect("lock").push(update);
    }
}

impl CollectingObserver {
    fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().expect("lock").clone()
    }
}

fn build_extractor(
    store: Arc<MemoryStore>,
    text: Arc<Utf8TextExtractor>,
    structured: Arc<EchoStructuredExtractor>,
    observer: Arc<CollectingObserver>,
) -> ProfileExtractor {
    ProfileExtractor::with_observer(store, text, structured, observer)
}

#[test]
fn invalid_media_type_fails_before_any_collaborator_call() {
    let store = Arc::new(MemoryStore::default());
    let text = Arc::new(Utf8TextExtractor::default());
    let structured = Arc::new(EchoStructuredExtractor::default());
    let observer = Arc::new(CollectingObserver::default());
    let extractor =
        build_extractor(store.clone(), text.clone(), structured.clone(), observer.clone());

    let png = ResumeDocument {
        file_name: "photo.png".to_string(),
        media_type: "image/png".to_string(),
        bytes: vec![0, 1, 2],
    };

    let err = extractor.submit(png).unwrap_err();
    assert!(matches!(err, IngestionError::InvalidInput { .. }));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    assert_eq!(text.calls.load(Ordering::SeqCst), 0);
    assert_eq!(structured.calls.load(Ordering::SeqCst), 0);
    assert!(observer.updates().is_empty());
}

#[test]
fn transfer_failure_never_reaches_extraction() {
    let store = Arc::new(MemoryStore {
        fail: true,
        ..MemoryStore::default()
    });
    let text = Arc::new(Utf8TextExtractor::default());
    let structured = Arc::new(EchoStructuredExtractor::default());
    let observer = Arc::new(CollectingObserver::default());
    let extractor =
        build_extractor(store.clone(), text.clone(), structured.clone(), observer.clone());

    let err = extractor.submit(pdf_document("cv.pdf", "react")).unwrap_err();
    assert!(matches!(err, IngestionError::TransferFailed { .. }));
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    assert_eq!(text.calls.load(Ordering::SeqCst), 0);
    assert_eq!(structured.calls.load(Ordering::SeqCst), 0);

    let updates = observer.updates();
    assert!(updates
        .iter()
        .all(|update| update.phase == IngestionPhase::Transfer));
    assert!(updates.iter().all(|update| update.percent < 100));
}

#[test]
fn schema_violations_map_to_analysis_failed() {
    let store = Arc::new(MemoryStore::default());
    let text = Arc::new(Utf8TextExtractor::default());
    let structured = Arc::new(EchoStructuredExtractor::default());
    *structured.respond_with.lock().expect("lock") = Some(json!({
        "skills": ["React"],
        "experience_years": "six",
        "education_level": "Bachelor",
        "job_titles": [],
        "summary": "x",
        "strengths": []
    }));
    let observer = Arc::new(CollectingObserver::default());
    let extractor = build_extractor(store, text, structured, observer);

    let err = extractor.submit(pdf_document("cv.pdf", "react")).unwrap_err();
    assert!(matches!(err, IngestionError::AnalysisFailed { .. }));
    assert!(err.to_string().contains("experience_years"));
}

#[test]
fn progress_is_phase_ordered_and_monotonic() {
    let store = Arc::new(MemoryStore::default());
    let text = Arc::new(Utf8TextExtractor::default());
    let structured = Arc::new(EchoStructuredExtractor::default());
    let observer = Arc::new(CollectingObserver::default());
    let extractor = build_extractor(store, text, structured, observer.clone());

    extractor
        .submit(pdf_document("cv.pdf", "react"))
        .expect("submission succeeds");

    let updates = observer.updates();
    assert!(!updates.is_empty());

    // Transfer updates strictly precede extraction updates.
    let first_extraction = updates
        .iter()
        .position(|update| update.phase == IngestionPhase::Extraction)
        .expect("extraction progress reported");
    assert!(updates[..first_extraction]
        .iter()
        .all(|update| update.phase == IngestionPhase::Transfer));
    assert!(updates[first_extraction..]
        .iter()
        .all(|update| update.phase == IngestionPhase::Extraction));
    assert_eq!(updates[first_extraction - 1].percent, 100);

    // Monotonically non-decreasing within each phase, both phases complete.
    for phase in [IngestionPhase::Transfer, IngestionPhase::Extraction] {
        let percents: Vec<u8> = updates
            .iter()
            .filter(|update| update.phase == phase)
            .map(|update| update.percent)
            .collect();
        assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(percents.last(), Some(&100));
    }
}

/// Object store that fires a second upload through the service while the
/// first submission is still inside its transfer phase.
#[derive(Default)]
struct ReentrantStore {
    service: OnceLock<Arc<MatchboardService>>,
    second: Mutex<Option<ResumeDocument>>,
}

impl ObjectStore for ReentrantStore {
    fn store(&self, _bytes: &[u8], key: &str) -> Result<StorageReference, StorageError> {
        let pending = self.second.lock().expect("lock").take();
        if let Some(document) = pending {
            let service = self.service.get().expect("service linked");
            let outcome = service
                .upload_resume(document)
                .expect("nested upload succeeds");
            assert!(matches!(outcome, ResumeUploadOutcome::Accepted(_)));
        }
        Ok(StorageReference(format!("mem://{key}")))
    }
}

#[test]
fn newer_submission_supersedes_the_one_in_flight() {
    let store = Arc::new(ReentrantStore::default());
    *store.second.lock().expect("lock") = Some(pdf_document("second.pdf", "second"));
    let text = Arc::new(Utf8TextExtractor::default());
    let structured = Arc::new(EchoStructuredExtractor::default());
    let observer = Arc::new(CollectingObserver::default());

    let extractor = ProfileExtractor::with_observer(
        store.clone(),
        text,
        structured,
        observer.clone(),
    );
    let service = Arc::new(MatchboardService::new(extractor));
    store.service.set(service.clone()).ok().expect("link once");

    let outcome = service
        .upload_resume(pdf_document("first.pdf", "first"))
        .expect("outer upload completes");
    assert!(matches!(outcome, ResumeUploadOutcome::Superseded));

    // The session keeps the newer profile; the superseded completion was
    // discarded.
    let profile = service.current_profile().expect("profile installed");
    assert!(profile.skills.contains("second"));
    assert!(!profile.skills.contains("first"));

    // The superseded submission contributed at most its initial transfer
    // update; everything after the takeover belongs to the newer submission.
    let updates = observer.updates();
    assert_eq!(updates.last().map(|update| update.percent), Some(100));
    assert_eq!(
        updates.last().map(|update| update.phase),
        Some(IngestionPhase::Extraction)
    );
    let completed_transfers = updates
        .iter()
        .filter(|update| update.phase == IngestionPhase::Transfer && update.percent == 100)
        .count();
    assert_eq!(completed_transfers, 1);
}
