use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::matching::catalog::CatalogError;
use crate::workflows::matching::ingestion::IngestionError;
use crate::workflows::matching::tracker::ApplicationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Ingestion(IngestionError),
    Catalog(CatalogError),
    Application(ApplicationError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Ingestion(err) => write!(f, "ingestion error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Application(err) => write!(f, "application error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Ingestion(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Application(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Ingestion(IngestionError::InvalidInput { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Ingestion(_) => StatusCode::BAD_GATEWAY,
            AppError::Catalog(_) => StatusCode::BAD_REQUEST,
            AppError::Application(ApplicationError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Application(_) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<IngestionError> for AppError {
    fn from(value: IngestionError) -> Self {
        Self::Ingestion(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ApplicationError> for AppError {
    fn from(value: ApplicationError) -> Self {
        Self::Application(value)
    }
}
