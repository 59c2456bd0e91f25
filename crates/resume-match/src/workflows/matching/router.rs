use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::catalog::{MatchQuery, SortKey, StatusFilter};
use super::domain::{PostingId, ResumeDocument};
use super::ingestion::IngestionError;
use super::service::{MatchboardService, ResumeUploadOutcome};
use super::tracker::{Application, ApplicationError, ApplicationId, ApplicationStatus};
use crate::workflows::matching::domain::JobPosting;

/// Router builder exposing the matchboard over HTTP.
pub fn matchboard_router(service: Arc<MatchboardService>) -> Router {
    Router::new()
        .route("/api/v1/resume", post(upload_resume_handler))
        .route("/api/v1/postings", post(upsert_posting_handler))
        .route("/api/v1/matches", get(query_matches_handler))
        .route(
            "/api/v1/applications",
            post(apply_handler).get(list_applications_handler),
        )
        .route("/api/v1/applications/stats", get(stats_handler))
        .route(
            "/api/v1/applications/:application_id/events",
            post(application_event_handler),
        )
        .with_state(service)
}

/// Sanitized per-application response payload.
#[derive(Debug, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub posting_id: PostingId,
    pub status: &'static str,
    pub progress: u8,
    pub applied_at: DateTime<Utc>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_at: Option<DateTime<Utc>>,
}

impl From<Application> for ApplicationView {
    fn from(application: Application) -> Self {
        Self {
            id: application.id,
            posting_id: application.posting_id,
            status: application.status.label(),
            progress: application.status.progress(),
            applied_at: application.applied_at,
            notes: application.notes,
            next_step: application.next_step,
            interview_at: application.interview_at,
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}

fn ingestion_response(error: IngestionError) -> Response {
    let status = match error {
        IngestionError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        IngestionError::TransferFailed { .. } | IngestionError::AnalysisFailed { .. } => {
            StatusCode::BAD_GATEWAY
        }
    };
    error_body(status, error.to_string())
}

fn application_response(error: ApplicationError) -> Response {
    let status = match error {
        ApplicationError::InvalidTransition { .. }
        | ApplicationError::DuplicateApplication(_) => StatusCode::CONFLICT,
        ApplicationError::NotFound => StatusCode::NOT_FOUND,
    };
    error_body(status, error.to_string())
}

async fn upload_resume_handler(
    State(service): State<Arc<MatchboardService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Parameters such as `; charset=` are irrelevant to validation.
    let media_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map(|media| media.essence_str().to_string())
        .unwrap_or_default();
    let file_name = headers
        .get("x-file-name")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("resume")
        .to_string();

    let document = ResumeDocument {
        file_name,
        media_type,
        bytes: body.to_vec(),
    };

    match service.upload_resume(document) {
        Ok(ResumeUploadOutcome::Accepted(profile)) => {
            (StatusCode::OK, axum::Json(profile)).into_response()
        }
        Ok(ResumeUploadOutcome::Superseded) => (
            StatusCode::OK,
            axum::Json(json!({ "status": "superseded" })),
        )
            .into_response(),
        Err(error) => ingestion_response(error),
    }
}

async fn upsert_posting_handler(
    State(service): State<Arc<MatchboardService>>,
    axum::Json(posting): axum::Json<JobPosting>,
) -> Response {
    let posting_id = posting.id.clone();
    service.add_or_replace_posting(posting);
    (
        StatusCode::CREATED,
        axum::Json(json!({ "posting_id": posting_id })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct MatchQueryParams {
    search: Option<String>,
    min_score: Option<u8>,
    status: Option<String>,
    sort: Option<String>,
}

async fn query_matches_handler(
    State(service): State<Arc<MatchboardService>>,
    Query(params): Query<MatchQueryParams>,
) -> Response {
    let sort = match params.sort.as_deref() {
        Some(raw) => match SortKey::parse(raw) {
            Ok(sort) => sort,
            Err(error) => return error_body(StatusCode::BAD_REQUEST, error.to_string()),
        },
        None => SortKey::default(),
    };

    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some("not_applied") | Some("none") => Some(StatusFilter::NotApplied),
        Some(raw) => match ApplicationStatus::parse(raw) {
            Some(status) => Some(StatusFilter::InStatus(status)),
            None => {
                return error_body(
                    StatusCode::BAD_REQUEST,
                    format!("unknown application status filter '{raw}'"),
                )
            }
        },
    };

    let query = MatchQuery {
        search: params.search,
        score_floor: params.min_score,
        status,
        sort,
    };

    (StatusCode::OK, axum::Json(service.query_matches(&query))).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyRequest {
    posting_id: String,
}

async fn apply_handler(
    State(service): State<Arc<MatchboardService>>,
    axum::Json(request): axum::Json<ApplyRequest>,
) -> Response {
    match service.apply_to(&PostingId(request.posting_id)) {
        Ok(application) => (
            StatusCode::CREATED,
            axum::Json(ApplicationView::from(application)),
        )
            .into_response(),
        Err(error) => application_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicationEventRequest {
    event: String,
    interview_at: Option<DateTime<Utc>>,
    note: Option<String>,
    next_step: Option<String>,
}

async fn application_event_handler(
    State(service): State<Arc<MatchboardService>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ApplicationEventRequest>,
) -> Response {
    let id = ApplicationId(application_id);

    let transitioned = match request.event.trim() {
        "mark_under_review" => service.mark_under_review(&id),
        "schedule_interview" => match request.interview_at {
            Some(at) => service.schedule_interview(&id, at),
            None => {
                return error_body(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "schedule_interview requires 'interview_at'".to_string(),
                )
            }
        },
        "reject" => service.reject(&id),
        "receive_offer" => service.receive_offer(&id),
        other => {
            return error_body(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("unknown application event '{other}'"),
            )
        }
    };

    let application = match transitioned {
        Ok(application) => application,
        Err(error) => return application_response(error),
    };

    if let Some(note) = request.note.as_deref() {
        if let Err(error) = service.append_note(&id, note) {
            return application_response(error);
        }
    }
    if request.next_step.is_some() {
        if let Err(error) = service.set_next_step(&id, request.next_step.clone()) {
            return application_response(error);
        }
    }

    let refreshed = service.application(&id).unwrap_or(application);
    (StatusCode::OK, axum::Json(ApplicationView::from(refreshed))).into_response()
}

async fn list_applications_handler(
    State(service): State<Arc<MatchboardService>>,
) -> Response {
    let views: Vec<ApplicationView> = service
        .applications()
        .into_iter()
        .map(ApplicationView::from)
        .collect();
    (StatusCode::OK, axum::Json(views)).into_response()
}

async fn stats_handler(State(service): State<Arc<MatchboardService>>) -> Response {
    (StatusCode::OK, axum::Json(service.stats())).into_response()
}
