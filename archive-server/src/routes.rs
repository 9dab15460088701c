//! HTTP surface of the archive service.
//!
//! The project routes sit behind the bearer-auth middleware; `/health` and
//! the token-gated `/status` endpoint are outside it.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::error;

use archive_core::{Actor, DomainError, Project, ProjectId, ProjectStatus, ReviewDecision};

use crate::auth::require_bearer_auth;
use crate::repository::RepositoryError;
use crate::status::StatusData;
use crate::store::{DraftUpdate, NewProject, StoreError};
use crate::AppState;

/// An API-level error: HTTP status plus a machine-readable kind and a
/// human-readable message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({
                "error": self.kind,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Domain(domain) => {
                let status = match &domain {
                    DomainError::Validation { .. }
                    | DomainError::EmptyFeedback
                    | DomainError::MissingFeedback
                    | DomainError::InvalidGrade { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    DomainError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                    DomainError::Authorization { .. } => StatusCode::FORBIDDEN,
                };
                Self::new(status, domain.kind(), domain.to_string())
            }
            StoreError::Repository(repo) => match &repo {
                RepositoryError::Conflict { .. } | RepositoryError::DuplicateId { .. } => {
                    Self::new(StatusCode::CONFLICT, "conflict", repo.to_string())
                }
                RepositoryError::Storage { .. } => {
                    error!("Repository failure: {}", repo);
                    Self::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "storage_error",
                        "internal storage failure",
                    )
                }
            },
        }
    }
}

pub fn service_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// Request/response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    #[serde(default)]
    submit: bool,
    #[serde(flatten)]
    project: NewProject,
}

#[derive(Debug, Deserialize)]
struct StatusChangeRequest {
    status: String,
    feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct GradeRequest {
    grade: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    search: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "project-archive",
    }))
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state
        .store
        .create(&actor, request.project, request.submit)
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state
        .store
        .list_visible(&actor, params.search.as_deref())
        .await?;
    Ok(Json(projects))
}

async fn archive_projects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.store.archive(params.search.as_deref()).await?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .store
        .get_visible(&actor, &ProjectId::from(id))
        .await?;
    Ok(Json(project))
}

async fn edit_project(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Project>, ApiError> {
    let submit = body
        .get("submit")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    let changes = DraftUpdate::from_value(&body)
        .map_err(|e| ApiError::bad_request(format!("malformed project fields: {}", e)))?;

    let project = state.store.edit(&actor, &ProjectId::from(id), changes, submit).await?;
    Ok(Json(project))
}

async fn change_status(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<Project>, ApiError> {
    let target = ProjectStatus::parse(&request.status)
        .ok_or_else(|| ApiError::bad_request(format!("unknown status '{}'", request.status)))?;
    let decision = ReviewDecision::from_target(target).ok_or_else(|| {
        ApiError::bad_request(format!(
            "status '{}' is not a reviewer decision; expected 'approved' or 'rejected'",
            request.status
        ))
    })?;

    let project = state
        .store
        .decide(
            &actor,
            &ProjectId::from(id),
            decision,
            request.feedback.as_deref(),
        )
        .await?;
    Ok(Json(project))
}

async fn append_feedback(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .store
        .add_feedback(&actor, &ProjectId::from(id), &request.feedback)
        .await?;
    Ok(Json(project))
}

async fn update_grade(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<GradeRequest>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .store
        .set_grade(&actor, &ProjectId::from(id), &request.grade)
        .await?;
    Ok(Json(project))
}

/// Validate the authorization header against the operator status token.
fn validate_status_auth(headers: &HeaderMap, auth_token: &Option<String>) -> Result<(), Response> {
    // If no token is configured, the endpoint is disabled.
    let Some(expected_token) = auth_token else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Status endpoint is disabled (STATUS_AUTH_TOKEN not configured)",
        )
            .into_response());
    };

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if value.starts_with("Bearer ") => {
            if &value[7..] == expected_token {
                Ok(())
            } else {
                Err((StatusCode::UNAUTHORIZED, "Invalid token").into_response())
            }
        }
        Some(_) => Err((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header format. Expected: Bearer <token>",
        )
            .into_response()),
        None => Err((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header. Expected: Bearer <token>",
        )
            .into_response()),
    }
}

async fn status_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusData>, Response> {
    validate_status_auth(&headers, &state.status_auth_token)?;

    let stored = state
        .store
        .all_stored()
        .await
        .map_err(|e| ApiError::from(e).into_response())?;
    Ok(Json(StatusData::from_stored(
        stored,
        service_version().to_string(),
    )))
}

// =============================================================================
// Router assembly
// =============================================================================

/// Build the full application router.
pub fn app_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route("/projects/archive", get(archive_projects))
        .route("/projects/:id", get(get_project).patch(edit_project))
        .route("/projects/:id/status", patch(change_status))
        .route("/projects/:id/feedback", patch(append_feedback))
        .route("/projects/:id/grade", patch(update_grade))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status_handler))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
