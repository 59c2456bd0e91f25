use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use crate::workflows::matching::domain::{EducationLevel, JobPosting, PostingId, ResumeDocument};
use crate::workflows::matching::ingestion::{
    ExtractionError, ObjectStore, ProfileExtractor, ResumeSchema, StorageError, StorageReference,
    StructuredExtractor, TextExtractor,
};
use crate::workflows::matching::router::matchboard_router;
use crate::workflows::matching::service::MatchboardService;

#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) keys: Mutex<Vec<String>>,
}

impl ObjectStore for MemoryStore {
    fn store(&self, _bytes: &[u8], key: &str) -> Result<StorageReference, StorageError> {
        self.keys.lock().expect("store mutex poisoned").push(key.to_string());
        Ok(StorageReference(format!("mem://{key}")))
    }
}

pub(super) struct Utf8Text;

impl TextExtractor for Utf8Text {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

pub(super) struct CannedAnalysis;

impl StructuredExtractor for CannedAnalysis {
    fn extract(&self, _text: &str, _schema: &ResumeSchema) -> Result<Value, ExtractionError> {
        Ok(json!({
            "skills": ["React", "TypeScript"],
            "experience_years": 6,
            "education_level": "Bachelor of Science",
            "job_titles": ["Frontend Developer"],
            "summary": "Frontend engineer with a product focus.",
            "strengths": ["Component architecture"]
        }))
    }
}

pub(super) fn build_service() -> Arc<MatchboardService> {
    let extractor = ProfileExtractor::new(
        Arc::new(MemoryStore::default()),
        Arc::new(Utf8Text),
        Arc::new(CannedAnalysis),
    );
    Arc::new(MatchboardService::new(extractor))
}

pub(super) fn router_with_service(service: Arc<MatchboardService>) -> axum::Router {
    matchboard_router(service)
}

pub(super) fn pdf_resume() -> ResumeDocument {
    ResumeDocument {
        file_name: "cv.pdf".to_string(),
        media_type: "application/pdf".to_string(),
        bytes: b"React TypeScript".to_vec(),
    }
}

pub(super) fn posting(id: &str, title: &str, company: &str) -> JobPosting {
    JobPosting {
        id: PostingId(id.to_string()),
        title: title.to_string(),
        company: company.to_string(),
        location: "Remote".to_string(),
        employment_type: "Full-time".to_string(),
        salary_range: "$120,000 - $160,000".to_string(),
        description: "Build product surfaces.".to_string(),
        required_skills: ["React".to_string()].into_iter().collect::<BTreeSet<_>>(),
        preferred_skills: BTreeSet::new(),
        experience_required_years: 3.0,
        education_required: EducationLevel::Bachelor,
        posted_at: Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).single().expect("valid date"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
