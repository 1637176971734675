//! HTTP API for the presentation layer

use crate::app::Checkflow;
use crate::error::WorkflowError;
use crate::identity::{ActorContext, UserFilter, UserUpdate};
use crate::models::{
    Capabilities, Capability, NewUnit, NewUser, RequestFilter, RequestId, Role, Statistics, UnitId,
    UserId, UserSummary,
};
use crate::server::session::{parse_bearer, SessionRegistry};
use crate::workflow::{RequestDraft, ResubmitDraft};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

/// Largest accepted JSON body
const MAX_BODY_BYTES: u64 = 256 * 1024;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    Workflow(WorkflowError),
    Unauthenticated,
    Internal(String),
}

impl warp::reject::Reject for ApiError {}

impl ApiError {
    /// Status, machine code and client-facing message
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Workflow(err) => {
                let status = match err {
                    WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
                    WorkflowError::Authorization(_) => StatusCode::FORBIDDEN,
                    WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
                    WorkflowError::InvalidState { .. } => StatusCode::CONFLICT,
                    WorkflowError::Store(store) => {
                        tracing::error!(error = %store, "Store failure");
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            err.code(),
                            "internal store error".to_string(),
                        );
                    }
                };
                (status, err.code(), err.to_string())
            }
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid or missing session token".to_string(),
            ),
            ApiError::Internal(details) => {
                tracing::error!(error = %details, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_string(),
                )
            }
        }
    }
}

/// Error body returned for every failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub employee_id: String,
    pub credential: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub user: UserSummary,
    pub capabilities: Vec<Capability>,
}

/// Statistics with derived percentages
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsResponse {
    #[serde(flatten)]
    pub counts: Statistics,
    pub pending_rate: u32,
    pub approval_rate: u32,
    pub rejection_rate: u32,
}

impl From<Statistics> for StatisticsResponse {
    fn from(counts: Statistics) -> Self {
        Self {
            pending_rate: counts.pending_rate(),
            approval_rate: counts.approval_rate(),
            rejection_rate: counts.rejection_rate(),
            counts,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemarksRequest {
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RolesRequest {
    pub roles: BTreeSet<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitAssignmentRequest {
    #[serde(default)]
    pub unit: Option<UnitId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialRequest {
    pub credential: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameUnitRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveUnitRequest {
    #[serde(default)]
    pub parent: Option<UnitId>,
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub app: Checkflow,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(app: Checkflow) -> Self {
        Self {
            app,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

/// Create HTTP API routes, with failures rendered as JSON
pub fn create_api_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    auth_routes(state.clone())
        .or(approval_routes(state.clone()))
        .or(admin_routes(state.clone()))
        .or(health_route(state))
        .recover(handle_rejection)
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn bearer_token() -> impl Filter<Extract = (Uuid,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(
        |header: Option<String>| async move {
            header
                .as_deref()
                .and_then(parse_bearer)
                .ok_or_else(|| warp::reject::custom(ApiError::Unauthenticated))
        },
    )
}

/// Resolve the session token into the calling actor
fn with_actor(state: AppState) -> impl Filter<Extract = (ActorContext,), Error = Rejection> + Clone {
    bearer_token().and_then(move |token: Uuid| {
        let sessions = Arc::clone(&state.sessions);
        async move {
            sessions
                .resolve(&token)
                .ok_or_else(|| warp::reject::custom(ApiError::Unauthenticated))
        }
    })
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Run a synchronous engine call off the async executor
async fn blocking<T, F>(f: F) -> Result<T, Rejection>
where
    F: FnOnce() -> Result<T, WorkflowError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(warp::reject::custom(ApiError::Workflow(err))),
        Err(join) => Err(warp::reject::custom(ApiError::Internal(join.to_string()))),
    }
}

fn created<T: Serialize>(body: &T) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(body), StatusCode::CREATED)
}

fn auth_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // POST /api/v1/auth/login - Exchange employee id and credential for a token
    let login = warp::path!("api" / "v1" / "auth" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_login);

    // POST /api/v1/auth/logout - Revoke the current token
    let logout = warp::path!("api" / "v1" / "auth" / "logout")
        .and(warp::post())
        .and(bearer_token())
        .and(with_state(state.clone()))
        .and_then(handle_logout);

    // GET /api/v1/auth/me - Current account and capabilities
    let me = warp::path!("api" / "v1" / "auth" / "me")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state))
        .and_then(handle_me);

    login.or(logout).or(me)
}

fn approval_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // POST /api/v1/approvals - Create a request
    let create = warp::path!("api" / "v1" / "approvals")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_create_request);

    // GET /api/v1/approvals?status=&type= - Every request (admins)
    let list_all = warp::path!("api" / "v1" / "approvals")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(warp::query::<RequestFilter>())
        .and(with_state(state.clone()))
        .and_then(handle_all_requests);

    // GET /api/v1/approvals/mine - Own requests, newest first
    let mine = warp::path!("api" / "v1" / "approvals" / "mine")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_my_requests);

    // GET /api/v1/approvals/queue - Pending requests the caller may act on
    let queue = warp::path!("api" / "v1" / "approvals" / "queue")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_pending_queue);

    // GET /api/v1/approvals/statistics - Organization-wide counters
    let statistics = warp::path!("api" / "v1" / "approvals" / "statistics")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_statistics);

    // GET /api/v1/approvals/statistics/me - Counters for the caller
    let my_statistics = warp::path!("api" / "v1" / "approvals" / "statistics" / "me")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_actor_statistics);

    // GET /api/v1/approvals/:id - Detail with audit trail
    let detail = warp::path!("api" / "v1" / "approvals" / RequestId)
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_get_request);

    // GET /api/v1/approvals/:id/checkers - Reviewers able to act now
    let checkers = warp::path!("api" / "v1" / "approvals" / RequestId / "checkers")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_eligible_checkers);

    // POST /api/v1/approvals/:id/approve
    let approve = warp::path!("api" / "v1" / "approvals" / RequestId / "approve")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_approve);

    // POST /api/v1/approvals/:id/reject
    let reject = warp::path!("api" / "v1" / "approvals" / RequestId / "reject")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_reject);

    // POST /api/v1/approvals/:id/resubmit - Follow-up to a rejected request
    let resubmit = warp::path!("api" / "v1" / "approvals" / RequestId / "resubmit")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state))
        .and_then(handle_resubmit);

    create
        .or(list_all)
        .or(mine)
        .or(queue)
        .or(statistics)
        .or(my_statistics)
        .or(detail)
        .or(checkers)
        .or(approve)
        .or(reject)
        .or(resubmit)
}

fn admin_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let list_users = warp::path!("api" / "v1" / "admin" / "users")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(warp::query::<UserFilter>())
        .and(with_state(state.clone()))
        .and_then(handle_list_users);

    let create_user = warp::path!("api" / "v1" / "admin" / "users")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_create_user);

    let get_user = warp::path!("api" / "v1" / "admin" / "users" / UserId)
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_get_user);

    let update_user = warp::path!("api" / "v1" / "admin" / "users" / UserId)
        .and(warp::patch())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_update_user);

    let assign_roles = warp::path!("api" / "v1" / "admin" / "users" / UserId / "roles")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_assign_roles);

    let assign_unit = warp::path!("api" / "v1" / "admin" / "users" / UserId / "unit")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_assign_unit);

    let deactivate = warp::path!("api" / "v1" / "admin" / "users" / UserId / "deactivate")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_deactivate_user);

    let reactivate = warp::path!("api" / "v1" / "admin" / "users" / UserId / "reactivate")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_reactivate_user);

    let reset_credential = warp::path!("api" / "v1" / "admin" / "users" / UserId / "credential")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_reset_credential);

    let list_units = warp::path!("api" / "v1" / "admin" / "units")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_list_units);

    let create_unit = warp::path!("api" / "v1" / "admin" / "units")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_create_unit);

    let rename_unit = warp::path!("api" / "v1" / "admin" / "units" / UnitId / "rename")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_rename_unit);

    let move_unit = warp::path!("api" / "v1" / "admin" / "units" / UnitId / "move")
        .and(warp::post())
        .and(with_actor(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handle_move_unit);

    let list_roles = warp::path!("api" / "v1" / "admin" / "roles")
        .and(warp::get())
        .and(with_actor(state.clone()))
        .and(with_state(state))
        .and_then(handle_list_roles);

    list_users
        .or(create_user)
        .or(get_user)
        .or(update_user)
        .or(assign_roles)
        .or(assign_unit)
        .or(deactivate)
        .or(reactivate)
        .or(reset_credential)
        .or(list_units)
        .or(create_unit)
        .or(rename_unit)
        .or(move_unit)
        .or(list_roles)
}

fn health_route(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // GET /api/v1/health - Health check endpoint
    warp::path!("api" / "v1" / "health")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_health)
}

/// Render every rejection as an [`ErrorResponse`]
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, code, message) = if let Some(api) = err.find::<ApiError>() {
        api.parts()
    } else if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            "not_found",
            "route not found".to_string(),
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("invalid request body: {}", e),
        )
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("invalid query: {}", e),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "validation_error",
            "request body too large".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "method not allowed".to_string(),
        )
    } else {
        tracing::error!(rejection = ?err, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal server error".to_string(),
        )
    };

    let body = ErrorResponse {
        error: code.to_string(),
        message,
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

/// Handle POST /api/v1/auth/login
async fn handle_login(
    login: LoginRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let (actor, user) = blocking(move || {
        let actor = directory.authenticate(&login.employee_id, &login.credential)?;
        let user = directory.profile(&actor)?;
        Ok((actor, user))
    })
    .await?;

    let token = state.sessions.issue(actor);
    tracing::info!(user = %user.id, "Login succeeded");
    Ok(warp::reply::json(&LoginResponse { token, user }))
}

/// Handle POST /api/v1/auth/logout
async fn handle_logout(token: Uuid, state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    if !state.sessions.revoke(&token) {
        return Err(warp::reject::custom(ApiError::Unauthenticated));
    }
    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({"status": "logged_out"})),
        StatusCode::OK,
    ))
}

/// Handle GET /api/v1/auth/me
async fn handle_me(
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let user = blocking(move || directory.profile(&actor)).await?;
    let capabilities = Capabilities::from_roles(&user.roles)
        .iter()
        .copied()
        .collect();
    Ok(warp::reply::json(&MeResponse { user, capabilities }))
}

/// Handle POST /api/v1/approvals
async fn handle_create_request(
    actor: ActorContext,
    draft: RequestDraft,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let request = blocking(move || engine.create(&actor, draft)).await?;
    Ok(created(&request))
}

/// Handle GET /api/v1/approvals
async fn handle_all_requests(
    actor: ActorContext,
    filter: RequestFilter,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let requests = blocking(move || engine.all_requests(&actor, &filter)).await?;
    Ok(warp::reply::json(&requests))
}

/// Handle GET /api/v1/approvals/mine
async fn handle_my_requests(
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let requests = blocking(move || engine.my_requests(&actor)).await?;
    Ok(warp::reply::json(&requests))
}

/// Handle GET /api/v1/approvals/queue
async fn handle_pending_queue(
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let requests = blocking(move || engine.pending_queue(&actor)).await?;
    Ok(warp::reply::json(&requests))
}

/// Handle GET /api/v1/approvals/statistics
async fn handle_statistics(
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let stats = blocking(move || engine.statistics(&actor)).await?;
    Ok(warp::reply::json(&StatisticsResponse::from(stats)))
}

/// Handle GET /api/v1/approvals/statistics/me
async fn handle_actor_statistics(
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let stats = blocking(move || engine.actor_statistics(&actor)).await?;
    Ok(warp::reply::json(&stats))
}

/// Handle GET /api/v1/approvals/:id
async fn handle_get_request(
    id: RequestId,
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let detail = blocking(move || engine.get_request(&actor, id)).await?;
    Ok(warp::reply::json(&detail))
}

/// Handle GET /api/v1/approvals/:id/checkers
async fn handle_eligible_checkers(
    id: RequestId,
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let checkers = blocking(move || engine.eligible_checkers(&actor, id)).await?;
    Ok(warp::reply::json(&checkers))
}

/// Handle POST /api/v1/approvals/:id/approve
async fn handle_approve(
    id: RequestId,
    actor: ActorContext,
    body: RemarksRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let request = blocking(move || engine.approve(&actor, id, &body.remarks)).await?;
    Ok(warp::reply::json(&request))
}

/// Handle POST /api/v1/approvals/:id/reject
async fn handle_reject(
    id: RequestId,
    actor: ActorContext,
    body: RemarksRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let request = blocking(move || engine.reject(&actor, id, &body.remarks)).await?;
    Ok(warp::reply::json(&request))
}

/// Handle POST /api/v1/approvals/:id/resubmit
async fn handle_resubmit(
    id: RequestId,
    actor: ActorContext,
    draft: ResubmitDraft,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = Arc::clone(&state.app.engine);
    let request = blocking(move || engine.resubmit(&actor, id, draft)).await?;
    Ok(created(&request))
}

async fn handle_list_users(
    actor: ActorContext,
    filter: UserFilter,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let users = blocking(move || directory.list_users(&actor, &filter)).await?;
    Ok(warp::reply::json(&users))
}

async fn handle_create_user(
    actor: ActorContext,
    new_user: NewUser,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let user = blocking(move || directory.create_user(&actor, new_user)).await?;
    Ok(created(&user))
}

async fn handle_get_user(
    id: UserId,
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let user = blocking(move || directory.get_user(&actor, id)).await?;
    Ok(warp::reply::json(&user))
}

async fn handle_update_user(
    id: UserId,
    actor: ActorContext,
    update: UserUpdate,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let user = blocking(move || directory.update_user(&actor, id, update)).await?;
    Ok(warp::reply::json(&user))
}

async fn handle_assign_roles(
    id: UserId,
    actor: ActorContext,
    body: RolesRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let user = blocking(move || directory.assign_roles(&actor, id, body.roles)).await?;
    Ok(warp::reply::json(&user))
}

async fn handle_assign_unit(
    id: UserId,
    actor: ActorContext,
    body: UnitAssignmentRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let user = blocking(move || directory.assign_unit(&actor, id, body.unit)).await?;
    Ok(warp::reply::json(&user))
}

async fn handle_deactivate_user(
    id: UserId,
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let user = blocking(move || directory.deactivate_user(&actor, id)).await?;
    Ok(warp::reply::json(&user))
}

async fn handle_reactivate_user(
    id: UserId,
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let user = blocking(move || directory.reactivate_user(&actor, id)).await?;
    Ok(warp::reply::json(&user))
}

async fn handle_reset_credential(
    id: UserId,
    actor: ActorContext,
    body: CredentialRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    blocking(move || directory.reset_credential(&actor, id, &body.credential)).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({"status": "credential_reset"})),
        StatusCode::OK,
    ))
}

async fn handle_list_units(
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let units = blocking(move || directory.list_units(&actor)).await?;
    Ok(warp::reply::json(&units))
}

async fn handle_create_unit(
    actor: ActorContext,
    unit: NewUnit,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let unit = blocking(move || directory.create_unit(&actor, unit)).await?;
    Ok(created(&unit))
}

async fn handle_rename_unit(
    id: UnitId,
    actor: ActorContext,
    body: RenameUnitRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let unit = blocking(move || directory.rename_unit(&actor, id, &body.name)).await?;
    Ok(warp::reply::json(&unit))
}

async fn handle_move_unit(
    id: UnitId,
    actor: ActorContext,
    body: MoveUnitRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let unit = blocking(move || directory.move_unit(&actor, id, body.parent)).await?;
    Ok(warp::reply::json(&unit))
}

async fn handle_list_roles(
    actor: ActorContext,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let directory = Arc::clone(&state.app.directory);
    let roles = blocking(move || directory.list_roles(&actor)).await?;
    Ok(warp::reply::json(&roles))
}

/// Handle GET /api/v1/health
async fn handle_health(state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_sessions: state.sessions.len(),
    };
    Ok(warp::reply::json(&response))
}
