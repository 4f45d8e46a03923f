use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::access::{AccessDenied, AccessGuard, Actor, Role};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, Interview, InterviewId, JobPosting, PostingDraft,
    PostingId, PostingPatch, PostingStatus, StatusChange, StatusDescriptor, UserId,
};
use super::repository::{ApplicationRepository, PostingRepository, RepositoryError};
use super::scheduler::{InterviewRequest, InterviewScheduler, SchedulingError};
use super::sync::{BackendGateway, FlushReport, GatewayError, PendingMutation, SyncProjector};
use super::views::ApplicationDetails;

/// Error taxonomy surfaced by every engine operation. Variants carry enough
/// context for the HTTP layer to distinguish "you may not do this"
/// (Forbidden) from "this isn't allowed right now" (InvalidTransition) from
/// "try again" (Unavailable).
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl LifecycleError {
    /// Stable machine-readable discriminator included in error payloads.
    pub const fn kind(&self) -> &'static str {
        match self {
            LifecycleError::Validation(_) => "VALIDATION",
            LifecycleError::NotFound(_) => "NOT_FOUND",
            LifecycleError::Forbidden(_) => "FORBIDDEN",
            LifecycleError::InvalidTransition(_) => "INVALID_TRANSITION",
            LifecycleError::Conflict(_) => "CONFLICT",
            LifecycleError::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

impl From<RepositoryError> for LifecycleError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => LifecycleError::Conflict(
                "the record was created or modified concurrently; re-read and retry".to_string(),
            ),
            RepositoryError::NotFound => LifecycleError::NotFound("record"),
            RepositoryError::Unavailable(reason) => LifecycleError::Unavailable(reason),
        }
    }
}

impl From<SchedulingError> for LifecycleError {
    fn from(value: SchedulingError) -> Self {
        match value {
            SchedulingError::PastDateTime { .. } | SchedulingError::EmptyLocation => {
                LifecycleError::Validation(value.to_string())
            }
            SchedulingError::NotSchedulable { .. } => {
                LifecycleError::InvalidTransition(value.to_string())
            }
            SchedulingError::NoInterview => LifecycleError::NotFound("interview"),
        }
    }
}

/// One requested application status move plus the payload some targets
/// require (reject reason, interview details).
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub status: ApplicationStatus,
    pub reject_reason: Option<String>,
    pub interview: Option<InterviewRequest>,
}

impl TransitionRequest {
    pub fn to(status: ApplicationStatus) -> Self {
        Self {
            status,
            reject_reason: None,
            interview: None,
        }
    }
}

static POSTING_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static INTERVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_posting_id() -> PostingId {
    let id = POSTING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PostingId(format!("job-{id:06}"))
}

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_interview_id() -> InterviewId {
    let id = INTERVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InterviewId(format!("int-{id:06}"))
}

/// The transition authority. Composes the access guard, the interview
/// scheduler, the two repositories, and the sync projector; every status
/// change in the system funnels through here.
pub struct LifecycleEngine<P, A, G> {
    postings: Arc<P>,
    applications: Arc<A>,
    guard: AccessGuard,
    scheduler: InterviewScheduler,
    projector: SyncProjector<G>,
}

impl<P, A, G> LifecycleEngine<P, A, G>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    G: BackendGateway + 'static,
{
    pub fn new(postings: Arc<P>, applications: Arc<A>, gateway: Arc<G>) -> Self {
        Self {
            postings,
            applications,
            guard: AccessGuard,
            scheduler: InterviewScheduler,
            projector: SyncProjector::new(gateway),
        }
    }

    // ---- postings -------------------------------------------------------

    /// Create a posting owned by the acting employer; status defaults to
    /// ACTIVE and the posted date is stamped server-side.
    pub fn create_posting(
        &self,
        actor: &Actor,
        draft: PostingDraft,
    ) -> Result<JobPosting, LifecycleError> {
        self.guard.require_role(actor, Role::Employer)?;

        let title = required_field(&draft.title, "title")?;
        let description = required_field(&draft.description, "description")?;
        let location = required_field(&draft.location, "location")?;
        let job_type = draft
            .job_type
            .ok_or_else(|| LifecycleError::Validation("jobType is required".to_string()))?;
        validate_salary_bounds(draft.min_salary, draft.max_salary)?;

        let posting = JobPosting {
            id: next_posting_id(),
            employer_id: actor.id.clone(),
            title,
            company_name: draft.company_name,
            description,
            location,
            job_type,
            status: PostingStatus::Active,
            min_salary: draft.min_salary,
            max_salary: draft.max_salary,
            required_skills: draft.required_skills,
            posted_date: Utc::now(),
            version: 0,
            unsynced: false,
        };

        let stored = self.postings.insert(posting)?;
        tracing::info!(posting = %stored.id.0, employer = %stored.employer_id.0, "posting created");
        self.commit_posting(stored, None)
    }

    /// Patch posting fields. DELETED postings reject every edit.
    pub fn update_posting(
        &self,
        actor: &Actor,
        id: &PostingId,
        patch: PostingPatch,
    ) -> Result<JobPosting, LifecycleError> {
        let current = self.fetch_posting(id)?;
        self.guard.manage_posting(actor, &current)?;
        if current.status == PostingStatus::Deleted {
            return Err(LifecycleError::InvalidTransition(
                "a deleted posting cannot be modified".to_string(),
            ));
        }

        let mut updated = current.clone();
        if let Some(title) = patch.title {
            updated.title = required_field(&title, "title")?;
        }
        if let Some(company_name) = patch.company_name {
            updated.company_name = Some(company_name);
        }
        if let Some(description) = patch.description {
            updated.description = required_field(&description, "description")?;
        }
        if let Some(location) = patch.location {
            updated.location = required_field(&location, "location")?;
        }
        if let Some(job_type) = patch.job_type {
            updated.job_type = job_type;
        }
        if let Some(min_salary) = patch.min_salary {
            updated.min_salary = Some(min_salary);
        }
        if let Some(max_salary) = patch.max_salary {
            updated.max_salary = Some(max_salary);
        }
        if let Some(required_skills) = patch.required_skills {
            updated.required_skills = required_skills;
        }
        validate_salary_bounds(updated.min_salary, updated.max_salary)?;

        let stored = self.postings.update(updated, current.version)?;
        self.commit_posting(stored, Some(current))
    }

    /// Move a posting along its status lifecycle (ACTIVE↔INACTIVE↔HOLD,
    /// any → DELETED).
    pub fn set_posting_status(
        &self,
        actor: &Actor,
        id: &PostingId,
        new_status: PostingStatus,
    ) -> Result<JobPosting, LifecycleError> {
        let current = self.fetch_posting(id)?;
        self.guard.manage_posting(actor, &current)?;

        if !current.status.can_transition_to(new_status) {
            return Err(LifecycleError::InvalidTransition(format!(
                "posting cannot move from {} to {}",
                current.status.descriptor().value,
                new_status.descriptor().value
            )));
        }

        let mut updated = current.clone();
        updated.status = new_status;
        let stored = self.postings.update(updated, current.version)?;
        tracing::info!(posting = %stored.id.0, status = stored.status.descriptor().value, "posting status changed");
        self.commit_posting(stored, Some(current))
    }

    /// Destructive delete. Blocked while non-terminal applications still
    /// reference the posting; soft-deletes (status DELETED) while terminal
    /// applications remain for history, and physically removes the row only
    /// when nothing references it.
    pub fn delete_posting(&self, actor: &Actor, id: &PostingId) -> Result<(), LifecycleError> {
        let current = self.fetch_posting(id)?;
        self.guard.manage_posting(actor, &current)?;

        let open = self.applications.open_count_for_posting(id)?;
        if open > 0 {
            return Err(LifecycleError::Conflict(format!(
                "{open} open application(s) still reference this posting"
            )));
        }

        let referencing = self.applications.by_posting(id)?.len();
        if referencing == 0 {
            self.postings.remove(id)?;
            tracing::info!(posting = %id.0, "posting removed");
            return Ok(());
        }

        if current.status != PostingStatus::Deleted {
            let mut updated = current.clone();
            updated.status = PostingStatus::Deleted;
            let stored = self.postings.update(updated, current.version)?;
            self.commit_posting(stored, Some(current))?;
        }
        Ok(())
    }

    /// Public search over non-deleted postings, optionally filtered by a
    /// case-insensitive title match.
    pub fn search_postings(&self, query: Option<&str>) -> Result<Vec<JobPosting>, LifecycleError> {
        Ok(self.postings.search(query)?)
    }

    pub fn postings_for_employer(&self, actor: &Actor) -> Result<Vec<JobPosting>, LifecycleError> {
        self.guard.require_role(actor, Role::Employer)?;
        Ok(self.postings.by_employer(&actor.id)?)
    }

    // ---- applications ---------------------------------------------------

    /// Submit a candidacy against an ACTIVE posting. One application per
    /// (posting, applicant) pair; the repository rejects duplicates.
    pub fn apply(
        &self,
        actor: &Actor,
        posting_id: &PostingId,
    ) -> Result<Application, LifecycleError> {
        self.guard.submit_application(actor)?;

        let posting = self.fetch_posting(posting_id)?;
        if !posting.accepts_applications() {
            return Err(LifecycleError::InvalidTransition(format!(
                "posting {} is not accepting applications (status {})",
                posting_id.0,
                posting.status.descriptor().value
            )));
        }

        let now = Utc::now();
        let application = Application {
            id: next_application_id(),
            job_posting_id: posting_id.clone(),
            applicant_id: actor.id.clone(),
            status: ApplicationStatus::Received,
            application_date: now,
            reject_reason: None,
            interview: None,
            history: vec![StatusChange {
                status: ApplicationStatus::Received,
                actor_id: actor.id.clone(),
                changed_at: now,
            }],
            version: 0,
            unsynced: false,
        };

        let stored = self.applications.insert(application)?;
        tracing::info!(application = %stored.id.0, posting = %posting_id.0, "application received");
        self.commit_application(stored, None)
    }

    /// Apply one edge of the application state machine. REJECTED requires a
    /// non-empty reason; INTERVIEW_SCHEDULED requires interview details and
    /// fails atomically with the scheduler; WITHDRAWN is applicant-only.
    pub fn transition(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        request: TransitionRequest,
    ) -> Result<Application, LifecycleError> {
        let current = self.fetch_application(application_id)?;
        let posting = self.postings.fetch(&current.job_posting_id)?;

        if request.status == ApplicationStatus::Withdrawn {
            self.guard.withdraw_application(actor, &current)?;
        } else {
            let posting = posting
                .as_ref()
                .ok_or(LifecycleError::NotFound("job posting"))?;
            self.guard.review_application(actor, posting)?;
        }

        if !current.status.can_transition_to(request.status) {
            return Err(LifecycleError::InvalidTransition(format!(
                "application cannot move from {} to {}",
                current.status.descriptor().value,
                request.status.descriptor().value
            )));
        }

        let now = Utc::now();
        let mut updated = current.clone();
        match request.status {
            ApplicationStatus::Rejected => {
                let reason = request
                    .reject_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|reason| !reason.is_empty())
                    .ok_or_else(|| {
                        LifecycleError::Validation(
                            "rejectReason is required when rejecting an application".to_string(),
                        )
                    })?;
                updated.reject_reason = Some(reason.to_string());
            }
            ApplicationStatus::InterviewScheduled => {
                let details = request.interview.as_ref().ok_or_else(|| {
                    LifecycleError::Validation(
                        "interview details are required to schedule an interview".to_string(),
                    )
                })?;
                let interview =
                    self.scheduler
                        .schedule(&current, next_interview_id(), details, now)?;
                updated.interview = Some(interview);
                updated.reject_reason = None;
            }
            _ => {
                updated.reject_reason = None;
            }
        }

        updated.status = request.status;
        updated.history.push(StatusChange {
            status: request.status,
            actor_id: actor.id.clone(),
            changed_at: now,
        });

        let stored = self.applications.update(updated, current.version)?;
        tracing::info!(
            application = %stored.id.0,
            from = current.status.descriptor().value,
            to = stored.status.descriptor().value,
            "application transitioned"
        );
        self.commit_application(stored, Some(current))
    }

    /// Book an interview, driving the RECEIVED/UNDER_REVIEW →
    /// INTERVIEW_SCHEDULED edge in the same commit.
    pub fn schedule_interview(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        request: InterviewRequest,
    ) -> Result<Application, LifecycleError> {
        self.transition(
            actor,
            application_id,
            TransitionRequest {
                status: ApplicationStatus::InterviewScheduled,
                reject_reason: None,
                interview: Some(request),
            },
        )
    }

    /// Move an existing interview without touching the application status.
    /// Identical input returns the stored record unchanged.
    pub fn reschedule_interview(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        scheduled_at: DateTime<Utc>,
        location: String,
    ) -> Result<Application, LifecycleError> {
        let current = self.fetch_application(application_id)?;
        let posting = self
            .postings
            .fetch(&current.job_posting_id)?
            .ok_or(LifecycleError::NotFound("job posting"))?;
        self.guard.review_application(actor, &posting)?;

        let interview =
            self.scheduler
                .reschedule(&current, scheduled_at, location, Utc::now())?;
        if current.interview.as_ref() == Some(&interview) {
            return Ok(current);
        }

        let mut updated = current.clone();
        updated.interview = Some(interview);
        let stored = self.applications.update(updated, current.version)?;
        self.commit_application(stored, Some(current))
    }

    pub fn interview_for(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
    ) -> Result<Option<Interview>, LifecycleError> {
        let application = self.fetch_application(application_id)?;
        let posting = self.postings.fetch(&application.job_posting_id)?;
        self.guard
            .view_application(actor, &application, posting.as_ref())?;
        Ok(application.interview)
    }

    /// Filtered listing: a seeker sees their own rows, an employer the rows
    /// of postings they own, staff everything.
    pub fn applications_for(
        &self,
        actor: &Actor,
        applicant: Option<&UserId>,
        posting: Option<&PostingId>,
    ) -> Result<Vec<Application>, LifecycleError> {
        if let Some(user) = applicant {
            if !(actor.is_staff() || actor.id == *user) {
                return Err(AccessDenied::NotViewer.into());
            }
            return Ok(self.applications.by_applicant(user)?);
        }
        if let Some(posting_id) = posting {
            let posting = self.fetch_posting(posting_id)?;
            self.guard.review_application(actor, &posting)?;
            return Ok(self.applications.by_posting(posting_id)?);
        }
        if !actor.is_staff() {
            return Err(AccessDenied::MissingRole(Role::Staff).into());
        }
        Ok(self.applications.all()?)
    }

    /// The acting seeker's applications, each enriched with a posting
    /// summary when the posting still resolves.
    pub fn applications_for_applicant(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ApplicationDetails>, LifecycleError> {
        self.guard.require_role(actor, Role::JobSeeker)?;
        let applications = self.applications.by_applicant(&actor.id)?;
        let mut details = Vec::with_capacity(applications.len());
        for application in applications {
            let posting = self.postings.fetch(&application.job_posting_id)?;
            details.push(ApplicationDetails::new(application, posting.as_ref()));
        }
        Ok(details)
    }

    /// Enriched employer view over one posting's applications.
    pub fn applications_for_posting(
        &self,
        actor: &Actor,
        posting_id: &PostingId,
    ) -> Result<Vec<ApplicationDetails>, LifecycleError> {
        let posting = self.fetch_posting(posting_id)?;
        self.guard.review_application(actor, &posting)?;
        let applications = self.applications.by_posting(posting_id)?;
        Ok(applications
            .into_iter()
            .map(|application| ApplicationDetails::new(application, Some(&posting)))
            .collect())
    }

    /// Applications whose latest status change falls inside the window,
    /// answered from the audit history.
    pub fn recent_applications(
        &self,
        actor: &Actor,
        posting_id: &PostingId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Application>, LifecycleError> {
        let posting = self.fetch_posting(posting_id)?;
        self.guard.review_application(actor, &posting)?;
        Ok(self
            .applications
            .by_posting(posting_id)?
            .into_iter()
            .filter(|application| {
                application
                    .latest_change()
                    .map(|change| change.changed_at)
                    .unwrap_or(application.application_date)
                    >= since
            })
            .collect())
    }

    // ---- status metadata ------------------------------------------------

    /// The single enum-to-metadata table the dashboards consume.
    pub fn application_statuses(&self) -> Vec<StatusDescriptor> {
        ApplicationStatus::ALL
            .iter()
            .map(|status| status.descriptor())
            .collect()
    }

    pub fn posting_statuses(&self) -> Vec<StatusDescriptor> {
        PostingStatus::ALL
            .iter()
            .map(|status| status.descriptor())
            .collect()
    }

    // ---- synchronization ------------------------------------------------

    /// Retry every queued mutation against the backend of record.
    pub fn flush_outbox(&self) -> Result<FlushReport, LifecycleError> {
        Ok(self
            .projector
            .flush(self.postings.as_ref(), self.applications.as_ref())?)
    }

    pub fn pending_sync(&self) -> Vec<PendingMutation> {
        self.projector.pending()
    }

    // ---- internals ------------------------------------------------------

    fn fetch_posting(&self, id: &PostingId) -> Result<JobPosting, LifecycleError> {
        self.postings
            .fetch(id)?
            .ok_or(LifecycleError::NotFound("job posting"))
    }

    fn fetch_application(&self, id: &ApplicationId) -> Result<Application, LifecycleError> {
        self.applications
            .fetch(id)?
            .ok_or(LifecycleError::NotFound("application"))
    }

    /// Project a committed posting through the gateway, persisting the
    /// canonical (or deferred-unsynced) record. A backend rejection rolls
    /// the optimistic write back.
    fn commit_posting(
        &self,
        stored: JobPosting,
        prior: Option<JobPosting>,
    ) -> Result<JobPosting, LifecycleError> {
        match self.projector.project_posting(stored.clone()) {
            Ok(projection) => {
                let record = projection.into_record();
                Ok(self.postings.update(record, stored.version)?)
            }
            Err(GatewayError::Rejected(reason)) => {
                match prior {
                    Some(previous) => {
                        self.postings.update(previous, stored.version)?;
                    }
                    None => self.postings.remove(&stored.id)?,
                }
                Err(LifecycleError::Conflict(format!(
                    "backend rejected the mutation: {reason}"
                )))
            }
            Err(GatewayError::Unavailable(reason)) => Err(LifecycleError::Unavailable(reason)),
        }
    }

    fn commit_application(
        &self,
        stored: Application,
        prior: Option<Application>,
    ) -> Result<Application, LifecycleError> {
        match self.projector.project_application(stored.clone()) {
            Ok(projection) => {
                let record = projection.into_record();
                Ok(self.applications.update(record, stored.version)?)
            }
            Err(GatewayError::Rejected(reason)) => {
                match prior {
                    Some(previous) => {
                        self.applications.update(previous, stored.version)?;
                    }
                    None => self.applications.remove(&stored.id)?,
                }
                Err(LifecycleError::Conflict(format!(
                    "backend rejected the mutation: {reason}"
                )))
            }
            Err(GatewayError::Unavailable(reason)) => Err(LifecycleError::Unavailable(reason)),
        }
    }
}

fn required_field(value: &str, field: &str) -> Result<String, LifecycleError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_salary_bounds(min: Option<f64>, max: Option<f64>) -> Result<(), LifecycleError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(LifecycleError::Validation(format!(
                "minSalary ({min}) must not exceed maxSalary ({max})"
            )));
        }
    }
    Ok(())
}
