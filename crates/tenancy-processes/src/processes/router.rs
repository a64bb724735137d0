use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::domain::{ProcessId, ProcessName};
use super::events::{Actor, ProcessEventPublisher};
use super::gateway::{PersonGateway, TenureGateway};
use super::service::{
    CreateProcessRequest, ProcessService, ProcessServiceError, UpdateProcessRequest,
};
use super::store::ProcessRepository;

pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";

/// Router builder exposing HTTP endpoints for starting, reading, and advancing processes.
pub fn process_router<R, T, P, E>(service: Arc<ProcessService<R, T, P, E>>) -> Router
where
    R: ProcessRepository + 'static,
    T: TenureGateway + 'static,
    P: PersonGateway + 'static,
    E: ProcessEventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/process", get(by_target_handler::<R, T, P, E>))
        .route(
            "/api/v1/process/:process_name",
            post(create_handler::<R, T, P, E>),
        )
        .route(
            "/api/v1/process/:process_name/:id",
            get(get_handler::<R, T, P, E>),
        )
        .route(
            "/api/v1/process/:process_name/:id/:trigger",
            patch(trigger_handler::<R, T, P, E>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ByTargetQuery {
    target_id: Uuid,
    page_size: Option<usize>,
    pagination_token: Option<String>,
}

pub(crate) async fn create_handler<R, T, P, E>(
    State(service): State<Arc<ProcessService<R, T, P, E>>>,
    Path(process_name): Path<String>,
    headers: HeaderMap,
    body: Result<Json<CreateProcessRequest>, JsonRejection>,
) -> Response
where
    R: ProcessRepository + 'static,
    T: TenureGateway + 'static,
    P: PersonGateway + 'static,
    E: ProcessEventPublisher + 'static,
{
    let name = match parse_name(&process_name) {
        Ok(name) => name,
        Err(response) => return response,
    };
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    match service.create(name, request, &actor_from(&headers)) {
        Ok(process) => (StatusCode::CREATED, Json(process)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, T, P, E>(
    State(service): State<Arc<ProcessService<R, T, P, E>>>,
    Path((process_name, id)): Path<(String, String)>,
) -> Response
where
    R: ProcessRepository + 'static,
    T: TenureGateway + 'static,
    P: PersonGateway + 'static,
    E: ProcessEventPublisher + 'static,
{
    let name = match parse_name(&process_name) {
        Ok(name) => name,
        Err(response) => return response,
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.get(name, id) {
        Ok(process) => (StatusCode::OK, Json(process)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn trigger_handler<R, T, P, E>(
    State(service): State<Arc<ProcessService<R, T, P, E>>>,
    Path((process_name, id, trigger)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Result<Json<UpdateProcessRequest>, JsonRejection>,
) -> Response
where
    R: ProcessRepository + 'static,
    T: TenureGateway + 'static,
    P: PersonGateway + 'static,
    E: ProcessEventPublisher + 'static,
{
    let name = match parse_name(&process_name) {
        Ok(name) => name,
        Err(response) => return response,
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let if_match = match if_match_version(&headers) {
        Ok(version) => version,
        Err(response) => return response,
    };
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    match service.trigger(
        name,
        id,
        &trigger,
        request,
        if_match,
        &actor_from(&headers),
    ) {
        Ok(process) => (StatusCode::OK, Json(process)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn by_target_handler<R, T, P, E>(
    State(service): State<Arc<ProcessService<R, T, P, E>>>,
    query: Result<Query<ByTargetQuery>, QueryRejection>,
) -> Response
where
    R: ProcessRepository + 'static,
    T: TenureGateway + 'static,
    P: PersonGateway + 'static,
    E: ProcessEventPublisher + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    match service.by_target(query.target_id, query.page_size, query.pagination_token) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => error_response(error),
    }
}

fn parse_name(raw: &str) -> Result<ProcessName, Response> {
    raw.parse::<ProcessName>().map_err(|message| {
        let payload = json!({
            "error": message,
            "kind": "UnknownProcess",
        });
        (StatusCode::NOT_FOUND, Json(payload)).into_response()
    })
}

fn parse_id(raw: &str) -> Result<ProcessId, Response> {
    raw.parse::<Uuid>().map(ProcessId).map_err(|_| {
        let payload = json!({
            "error": format!("'{raw}' is not a valid process id"),
            "kind": "InvalidProcessId",
        });
        (StatusCode::BAD_REQUEST, Json(payload)).into_response()
    })
}

/// Malformed bodies and query strings keep axum's status but use the JSON error shape.
fn rejection_response(status: StatusCode, message: String) -> Response {
    let payload = json!({
        "error": message,
        "kind": "InvalidRequest",
    });
    (status, Json(payload)).into_response()
}

/// Accepts both a bare number and a quoted entity tag.
fn if_match_version(headers: &HeaderMap) -> Result<Option<u32>, Response> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .map(|raw| raw.trim().trim_start_matches("W/").trim_matches('"'))
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(Some)
        .ok_or_else(|| {
            let payload = json!({
                "error": "If-Match must carry a numeric process version",
                "kind": "InvalidIfMatch",
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        })
}

fn actor_from(headers: &HeaderMap) -> Actor {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    match (read(ACTOR_NAME_HEADER), read(ACTOR_EMAIL_HEADER)) {
        (None, None) => Actor::system(),
        (name, email) => Actor::new(name.unwrap_or_default(), email.unwrap_or_default()),
    }
}

fn error_response(error: ProcessServiceError) -> Response {
    let mut payload = json!({
        "error": error.to_string(),
        "kind": error.kind(),
    });
    if let Some(current) = error.current_version() {
        payload["currentVersion"] = json!(current);
    }
    (error.status_code(), Json(payload)).into_response()
}
