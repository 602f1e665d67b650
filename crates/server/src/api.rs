//! JSON API over the idea service.
//!
//! - `GET  /api/v1/ideas?status=`                 list ideas, optionally by status
//! - `POST /api/v1/ideas`                         submit a new idea
//! - `GET  /api/v1/ideas/{idea_id}`               one idea
//! - `POST /api/v1/ideas/{idea_id}/actions`       assign, approve, reject or request revision
//! - `GET  /api/v1/ideas/{idea_id}/comments`      comment thread
//! - `POST /api/v1/ideas/{idea_id}/comments`      add a general comment
//! - `GET  /api/v1/ideas/{idea_id}/audit`         audit trail
//! - `GET  /api/v1/users`                         user directory
//! - `GET  /api/v1/users/{user_id}`               one user
//! - `GET  /api/v1/approvals/{reviewer_id}`       reviewer queue (`search`, `category`, `status`)
//! - `GET  /api/v1/dashboard`                     dashboard snapshot

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use ideaflow_core::approvals::{ApprovalQueue, QueueFilter};
use ideaflow_core::audit::AuditEvent;
use ideaflow_core::domain::comment::Comment;
use ideaflow_core::domain::idea::{Idea, IdeaId, IdeaStatus, NewIdea};
use ideaflow_core::domain::user::{User, UserId};
use ideaflow_core::errors::{ApplicationError, InterfaceError};
use ideaflow_core::metrics::DashboardSnapshot;
use ideaflow_core::workflow::ApprovalAction;
use ideaflow_db::{ActionResult, IdeaService, ServiceError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct ApiState {
    service: Arc<IdeaService>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IdeaListQuery {
    pub status: Option<IdeaStatus>,
}

/// Body of `POST /ideas/{idea_id}/actions`: the acting user plus the tagged action.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub actor_id: UserId,
    #[serde(flatten)]
    pub action: ApprovalAction,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub user_id: UserId,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: &'static str,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(service: Arc<IdeaService>) -> Router {
    Router::new()
        .route("/api/v1/ideas", get(list_ideas).post(submit_idea))
        .route("/api/v1/ideas/{idea_id}", get(get_idea))
        .route("/api/v1/ideas/{idea_id}/actions", post(apply_action))
        .route("/api/v1/ideas/{idea_id}/comments", get(list_comments).post(add_comment))
        .route("/api/v1/ideas/{idea_id}/audit", get(audit_trail))
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/users/{user_id}", get(get_user))
        .route("/api/v1/approvals/{reviewer_id}", get(approval_queue))
        .route("/api/v1/dashboard", get(dashboard))
        .with_state(ApiState { service })
}

pub async fn list_ideas(
    State(state): State<ApiState>,
    Query(query): Query<IdeaListQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<Idea>>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let ideas = match query.status {
        Some(status) => state.service.list_ideas_by_status(status).await,
        None => state.service.list_ideas().await,
    }
    .map_err(|error| reject(error, &correlation_id, "api.ideas.list"))?;

    Ok(Json(ideas))
}

pub async fn submit_idea(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(input): Json<NewIdea>,
) -> Result<(StatusCode, Json<Idea>), ApiError> {
    let correlation_id = correlation_id(&headers);
    let idea = state
        .service
        .submit_idea(input, &correlation_id)
        .await
        .map_err(|error| reject(error, &correlation_id, "api.ideas.submit"))?;

    info!(
        event_name = "api.ideas.submitted",
        correlation_id = %correlation_id,
        idea_id = %idea.id,
        "idea submitted over api"
    );
    Ok((StatusCode::CREATED, Json(idea)))
}

pub async fn get_idea(
    State(state): State<ApiState>,
    Path(idea_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Idea>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state
        .service
        .get_idea(&IdeaId(idea_id))
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, "api.ideas.get"))
}

pub async fn apply_action(
    State(state): State<ApiState>,
    Path(idea_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResult>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let result = state
        .service
        .apply_action(&IdeaId(idea_id), &request.actor_id, request.action, &correlation_id)
        .await
        .map_err(|error| reject(error, &correlation_id, "api.ideas.action"))?;

    info!(
        event_name = "api.ideas.action_applied",
        correlation_id = %correlation_id,
        idea_id = %result.idea.id,
        from = %result.from,
        to = %result.to,
        "workflow action applied over api"
    );
    Ok(Json(result))
}

pub async fn list_comments(
    State(state): State<ApiState>,
    Path(idea_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state
        .service
        .comments_for_idea(&IdeaId(idea_id))
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, "api.comments.list"))
}

pub async fn add_comment(
    State(state): State<ApiState>,
    Path(idea_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let correlation_id = correlation_id(&headers);
    let comment = state
        .service
        .add_comment(&IdeaId(idea_id), &request.user_id, &request.text, &correlation_id)
        .await
        .map_err(|error| reject(error, &correlation_id, "api.comments.add"))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn audit_trail(
    State(state): State<ApiState>,
    Path(idea_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<AuditEvent>>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state
        .service
        .audit_trail(&IdeaId(idea_id))
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, "api.audit.list"))
}

pub async fn list_users(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state
        .service
        .list_users()
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, "api.users.list"))
}

pub async fn get_user(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state
        .service
        .get_user(&UserId(user_id))
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, "api.users.get"))
}

pub async fn approval_queue(
    State(state): State<ApiState>,
    Path(reviewer_id): Path<String>,
    Query(filter): Query<QueueFilter>,
    headers: HeaderMap,
) -> Result<Json<ApprovalQueue>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state
        .service
        .approval_queue(&UserId(reviewer_id), &filter)
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, "api.approvals.queue"))
}

pub async fn dashboard(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state
        .service
        .dashboard(Utc::now())
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, "api.dashboard"))
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("req-{}", Uuid::new_v4()))
}

fn reject(error: ServiceError, correlation_id: &str, event_name: &'static str) -> ApiError {
    let interface = ApplicationError::from(error).into_interface(correlation_id);
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    warn!(
        event_name = event_name,
        correlation_id = %correlation_id,
        status = status.as_u16(),
        error = %interface,
        "api request failed"
    );

    (
        status,
        Json(ErrorBody {
            error: interface.message().to_string(),
            message: interface.user_message(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use ideaflow_core::config::WorkflowConfig;
    use ideaflow_core::domain::idea::IdeaStatus;
    use ideaflow_core::domain::user::{User, UserId, UserRole};
    use ideaflow_db::{IdeaService, ServiceError};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{reject, router, CORRELATION_HEADER};

    fn user(id: &str, role: UserRole, department: &str, categories: &[&str]) -> User {
        User {
            id: UserId(id.to_string()),
            username: id.to_string(),
            full_name: format!("{id} example"),
            email: format!("{id}@company.com"),
            role,
            department: department.to_string(),
            approval_categories: categories.iter().map(|c| c.to_string()).collect(),
            is_active: true,
        }
    }

    async fn app() -> Router {
        let service = IdeaService::in_memory(WorkflowConfig::default());
        for user in [
            user("admin1", UserRole::Administrator, "IT", &[]),
            user("approver1", UserRole::Approver, "Engineering", &["Process Improvement"]),
            user("user1", UserRole::Submitter, "Engineering", &[]),
        ] {
            service.register_user(user).await.expect("register user");
        }
        router(Arc::new(service))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CORRELATION_HEADER, "req-test");
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, payload)
    }

    fn submission() -> Value {
        json!({
            "title": "Automated regression testing system",
            "description": "Implement an automated testing framework to catch regression issues early.",
            "category": "Process Improvement",
            "benefits": "Faster release cycles and fewer production bugs.",
            "submitter_id": "user1"
        })
    }

    async fn submitted_idea_id(app: &Router) -> String {
        let (status, idea) = send(app, "POST", "/api/v1/ideas", Some(submission())).await;
        assert_eq!(status, StatusCode::CREATED, "{idea}");
        idea["id"].as_str().expect("idea id").to_string()
    }

    #[tokio::test]
    async fn submit_then_review_through_api() {
        let app = app().await;
        let idea_id = submitted_idea_id(&app).await;

        let (status, assigned) = send(
            &app,
            "POST",
            &format!("/api/v1/ideas/{idea_id}/actions"),
            Some(json!({ "actor_id": "admin1", "action": "assign", "approver_id": "approver1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{assigned}");
        assert_eq!(assigned["from"], "submitted");
        assert_eq!(assigned["to"], "under_review");

        let (status, approved) = send(
            &app,
            "POST",
            &format!("/api/v1/ideas/{idea_id}/actions"),
            Some(json!({ "actor_id": "approver1", "action": "approve", "note": "Ship it" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{approved}");
        assert_eq!(approved["idea"]["status"], "approved");
        assert_eq!(approved["comment"]["text"], "Ship it");

        let (_, comments) =
            send(&app, "GET", &format!("/api/v1/ideas/{idea_id}/comments"), None).await;
        assert_eq!(comments.as_array().map(Vec::len), Some(1));

        let (_, listed) = send(&app, "GET", "/api/v1/ideas?status=approved", None).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (_, audit) = send(&app, "GET", &format!("/api/v1/ideas/{idea_id}/audit"), None).await;
        assert!(audit
            .as_array()
            .is_some_and(|events| events.iter().all(|event| event["correlation_id"] == "req-test")));
    }

    #[tokio::test]
    async fn invalid_submission_is_bad_request() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/ideas",
            Some(json!({
                "title": "",
                "description": "",
                "category": "",
                "benefits": "",
                "submitter_id": "user1"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|error| error.contains("title")));
        assert_eq!(body["correlation_id"], "req-test");
    }

    #[tokio::test]
    async fn workflow_errors_map_to_http_statuses() {
        let app = app().await;
        let idea_id = submitted_idea_id(&app).await;
        let actions = format!("/api/v1/ideas/{idea_id}/actions");

        let (status, _) = send(
            &app,
            "POST",
            &actions,
            Some(json!({ "actor_id": "user1", "action": "approve" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            "POST",
            &actions,
            Some(json!({ "actor_id": "approver1", "action": "reject", "reason": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

        let (status, body) = send(&app, "GET", "/api/v1/ideas/idea-404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "idea `idea-404` was not found");
    }

    #[tokio::test]
    async fn comments_users_queue_and_dashboard_are_served() {
        let app = app().await;
        let idea_id = submitted_idea_id(&app).await;

        let (status, comment) = send(
            &app,
            "POST",
            &format!("/api/v1/ideas/{idea_id}/comments"),
            Some(json!({ "user_id": "approver1", "text": "Which suites run first?" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{comment}");
        assert_eq!(comment["comment_type"], "general");

        let (_, users) = send(&app, "GET", "/api/v1/users", None).await;
        assert_eq!(users.as_array().map(Vec::len), Some(3));
        let (status, _) = send(&app, "GET", "/api/v1/users/nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, queue) =
            send(&app, "GET", "/api/v1/approvals/approver1?search=regression", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(queue["pending"].as_array().map(Vec::len), Some(1));

        let (status, _) = send(&app, "GET", "/api/v1/approvals/user1", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, snapshot) = send(&app, "GET", "/api/v1/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["summary"]["total_ideas"], 1);
        assert_eq!(snapshot["summary"]["submitted"], 1);
    }

    #[test]
    fn concurrent_status_change_is_reported_as_conflict() {
        let (status, body) = reject(
            ServiceError::Conflict {
                idea_id: "idea4".to_string(),
                expected: IdeaStatus::Submitted,
                current: IdeaStatus::UnderReview,
            },
            "req-409",
            "api.ideas.action",
        );

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.error.contains("idea4"), "{}", body.error);
        assert_eq!(body.correlation_id, "req-409");
    }
}
