use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::access::{Actor, Role};
use super::domain::{
    ApplicationId, ApplicationStatus, PostingDraft, PostingId, PostingPatch, PostingStatus, UserId,
};
use super::engine::{LifecycleEngine, LifecycleError, TransitionRequest};
use super::repository::{ApplicationRepository, PostingRepository};
use super::scheduler::InterviewRequest;
use super::sync::BackendGateway;

impl IntoResponse for LifecycleError {
    fn into_response(self) -> Response {
        let status = match self {
            LifecycleError::Validation(_) => StatusCode::BAD_REQUEST,
            LifecycleError::Forbidden(_) => StatusCode::FORBIDDEN,
            LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
            LifecycleError::Conflict(_) => StatusCode::CONFLICT,
            LifecycleError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LifecycleError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
        (status, body).into_response()
    }
}

/// Materialize the acting principal from the headers the session layer
/// stamps on every request.
fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, LifecycleError> {
    let id = headers
        .get("x-actor-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LifecycleError::Validation("x-actor-id header is required".to_string()))?;

    let raw_roles = headers
        .get("x-actor-roles")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let mut roles = Vec::new();
    for token in raw_roles.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let role = Role::parse(token).ok_or_else(|| {
            LifecycleError::Validation(format!("unknown role '{token}' in x-actor-roles"))
        })?;
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    if roles.is_empty() {
        return Err(LifecycleError::Validation(
            "x-actor-roles header is required".to_string(),
        ));
    }

    Ok(Actor {
        id: UserId(id.to_string()),
        roles,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostingStatusBody {
    pub(crate) status: PostingStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplyBody {
    pub(crate) job_posting_id: PostingId,
}

/// Body of `PUT /applications/status`, matching the client payload
/// `{applicationId, status, rejectReason?}` with optional interview details
/// for the INTERVIEW_SCHEDULED edge.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplicationStatusBody {
    pub(crate) application_id: ApplicationId,
    pub(crate) status: ApplicationStatus,
    #[serde(default)]
    pub(crate) reject_reason: Option<String>,
    #[serde(default)]
    pub(crate) interview: Option<InterviewRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RescheduleBody {
    #[serde(alias = "scheduledDateTime")]
    pub(crate) scheduled_at: DateTime<Utc>,
    pub(crate) location: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobSearchQuery {
    pub(crate) q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplicationListQuery {
    pub(crate) user_id: Option<String>,
    pub(crate) job_posting_id: Option<String>,
}

/// Router exposing the lifecycle endpoints consumed by the dashboards.
pub fn lifecycle_router<P, A, G>(engine: Arc<LifecycleEngine<P, A, G>>) -> Router
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    Router::new()
        .route(
            "/jobs",
            post(create_posting::<P, A, G>).get(search_postings::<P, A, G>),
        )
        .route("/jobs/employer", get(employer_postings::<P, A, G>))
        .route(
            "/jobs/:id",
            put(update_posting::<P, A, G>).delete(delete_posting::<P, A, G>),
        )
        .route("/jobs/:id/status", put(set_posting_status::<P, A, G>))
        .route(
            "/applications",
            post(apply::<P, A, G>).get(list_applications::<P, A, G>),
        )
        .route("/applications/status", put(update_application_status::<P, A, G>))
        .route("/applications/statuses", get(application_statuses::<P, A, G>))
        .route(
            "/applications/my-applications",
            get(my_applications::<P, A, G>),
        )
        .route(
            "/applications/job/:id/enriched",
            get(posting_applications::<P, A, G>),
        )
        .route(
            "/applications/:id/schedule-interview",
            post(schedule_interview::<P, A, G>),
        )
        .route(
            "/applications/:id/interview",
            get(interview_details::<P, A, G>).put(reschedule_interview::<P, A, G>),
        )
        .with_state(engine)
}

async fn create_posting<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Json(draft): Json<PostingDraft>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let posting = engine.create_posting(&actor, draft)?;
    Ok((StatusCode::CREATED, Json(posting)).into_response())
}

async fn search_postings<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    Query(query): Query<JobSearchQuery>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let postings = engine.search_postings(query.q.as_deref())?;
    Ok(Json(postings).into_response())
}

async fn employer_postings<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let postings = engine.postings_for_employer(&actor)?;
    Ok(Json(postings).into_response())
}

async fn update_posting<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<PostingPatch>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let posting = engine.update_posting(&actor, &PostingId(id), patch)?;
    Ok(Json(posting).into_response())
}

async fn set_posting_status<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<PostingStatusBody>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let posting = engine.set_posting_status(&actor, &PostingId(id), body.status)?;
    Ok(Json(posting).into_response())
}

async fn delete_posting<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    engine.delete_posting(&actor, &PostingId(id))?;
    Ok(StatusCode::OK.into_response())
}

async fn apply<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Json(body): Json<ApplyBody>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let application = engine.apply(&actor, &body.job_posting_id)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

async fn list_applications<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let applicant = query.user_id.map(UserId);
    let posting = query.job_posting_id.map(PostingId);
    let applications = engine.applications_for(&actor, applicant.as_ref(), posting.as_ref())?;
    Ok(Json(applications).into_response())
}

async fn update_application_status<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Json(body): Json<ApplicationStatusBody>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let application = engine.transition(
        &actor,
        &body.application_id,
        TransitionRequest {
            status: body.status,
            reject_reason: body.reject_reason,
            interview: body.interview,
        },
    )?;
    Ok(Json(application).into_response())
}

async fn application_statuses<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
) -> Response
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    Json(engine.application_statuses()).into_response()
}

async fn my_applications<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let details = engine.applications_for_applicant(&actor)?;
    Ok(Json(details).into_response())
}

async fn posting_applications<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let details = engine.applications_for_posting(&actor, &PostingId(id))?;
    Ok(Json(details).into_response())
}

async fn schedule_interview<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<InterviewRequest>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let application = engine.schedule_interview(&actor, &ApplicationId(id), request)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

async fn reschedule_interview<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<RescheduleBody>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let application =
        engine.reschedule_interview(&actor, &ApplicationId(id), body.scheduled_at, body.location)?;
    Ok(Json(application).into_response())
}

async fn interview_details<P, A, G>(
    State(engine): State<Arc<LifecycleEngine<P, A, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, LifecycleError>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    let actor = actor_from_headers(&headers)?;
    let interview = engine.interview_for(&actor, &ApplicationId(id))?;
    Ok(Json(interview).into_response())
}
