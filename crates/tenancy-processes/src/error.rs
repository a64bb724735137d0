use crate::config::ConfigError;
use crate::processes::{DefinitionError, ProcessServiceError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Fixtures {
        path: PathBuf,
        source: serde_json::Error,
    },
    Definition(DefinitionError),
    Process(ProcessServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Fixtures { path, source } => {
                write!(f, "invalid fixtures file {}: {}", path.display(), source)
            }
            AppError::Definition(err) => write!(f, "workflow definition error: {}", err),
            AppError::Process(err) => write!(f, "process error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Fixtures { source, .. } => Some(source),
            AppError::Definition(err) => Some(err),
            AppError::Process(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            AppError::Process(err) => (err.status_code(), err.kind()),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration"),
            AppError::Telemetry(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Telemetry"),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Io"),
            AppError::Fixtures { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "Fixtures"),
            AppError::Definition(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Definition"),
        };

        let body = Json(json!({ "error": self.to_string(), "kind": kind }));
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

impl From<DefinitionError> for AppError {
    fn from(value: DefinitionError) -> Self {
        Self::Definition(value)
    }
}

impl From<ProcessServiceError> for AppError {
    fn from(value: ProcessServiceError) -> Self {
        Self::Process(value)
    }
}
