use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use serde_json::Value;

use crate::lifecycle::access::{Actor, Role};
use crate::lifecycle::domain::{
    Application, ApplicationId, ApplicationStatus, InterviewType, JobPosting, JobType,
    PostingDraft, PostingId, UserId,
};
use crate::lifecycle::engine::LifecycleEngine;
use crate::lifecycle::repository::{
    ApplicationRepository, PostingRepository, RepositoryError,
};
use crate::lifecycle::scheduler::InterviewRequest;
use crate::lifecycle::sync::{BackendGateway, GatewayError};

pub(super) fn employer() -> Actor {
    Actor::new("emp-001", vec![Role::Employer])
}

pub(super) fn rival_employer() -> Actor {
    Actor::new("emp-002", vec![Role::Employer])
}

pub(super) fn seeker() -> Actor {
    Actor::new("seeker-001", vec![Role::JobSeeker])
}

pub(super) fn second_seeker() -> Actor {
    Actor::new("seeker-002", vec![Role::JobSeeker])
}

pub(super) fn staff() -> Actor {
    Actor::new("staff-001", vec![Role::Staff])
}

pub(super) fn draft() -> PostingDraft {
    PostingDraft {
        title: "Forklift Operator".to_string(),
        company_name: Some("Prairie Logistics".to_string()),
        description: "Second-shift warehouse role with certification support.".to_string(),
        location: "Des Moines, IA".to_string(),
        job_type: Some(JobType::FullTime),
        min_salary: Some(38_000.0),
        max_salary: Some(52_000.0),
        required_skills: vec!["Forklift certification".to_string()],
    }
}

pub(super) fn future_interview() -> InterviewRequest {
    InterviewRequest {
        scheduled_at: Utc::now() + Duration::days(3),
        interview_type: InterviewType::VideoCall,
        location: "https://meet.example.com/worklink".to_string(),
        notes: Some("Panel with the shift supervisor".to_string()),
    }
}

pub(super) type TestEngine = LifecycleEngine<MemoryPostings, MemoryApplications, ToggleGateway>;

pub(super) fn build_engine() -> (
    Arc<TestEngine>,
    Arc<MemoryPostings>,
    Arc<MemoryApplications>,
    Arc<ToggleGateway>,
) {
    let postings = Arc::new(MemoryPostings::default());
    let applications = Arc::new(MemoryApplications::default());
    let gateway = Arc::new(ToggleGateway::online());
    let engine = Arc::new(LifecycleEngine::new(
        postings.clone(),
        applications.clone(),
        gateway.clone(),
    ));
    (engine, postings, applications, gateway)
}

/// Seed an ACTIVE posting and return it.
pub(super) fn seeded_posting(engine: &TestEngine) -> JobPosting {
    engine
        .create_posting(&employer(), draft())
        .expect("posting creates")
}

#[derive(Default)]
pub(super) struct MemoryPostings {
    records: Mutex<HashMap<PostingId, JobPosting>>,
}

impl PostingRepository for MemoryPostings {
    fn insert(&self, posting: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut guard = self.records.lock().expect("posting mutex poisoned");
        if guard.contains_key(&posting.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(posting.id.clone(), posting.clone());
        Ok(posting)
    }

    fn update(
        &self,
        mut posting: JobPosting,
        expected_version: u64,
    ) -> Result<JobPosting, RepositoryError> {
        let mut guard = self.records.lock().expect("posting mutex poisoned");
        let stored = guard.get(&posting.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::Conflict);
        }
        posting.version = expected_version + 1;
        guard.insert(posting.id.clone(), posting.clone());
        Ok(posting)
    }

    fn fetch(&self, id: &PostingId) -> Result<Option<JobPosting>, RepositoryError> {
        let guard = self.records.lock().expect("posting mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &PostingId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("posting mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn search(&self, query: Option<&str>) -> Result<Vec<JobPosting>, RepositoryError> {
        let guard = self.records.lock().expect("posting mutex poisoned");
        let needle = query.map(str::to_lowercase);
        Ok(guard
            .values()
            .filter(|posting| posting.status != crate::lifecycle::domain::PostingStatus::Deleted)
            .filter(|posting| match &needle {
                Some(needle) => posting.title.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect())
    }

    fn by_employer(&self, employer_id: &UserId) -> Result<Vec<JobPosting>, RepositoryError> {
        let guard = self.records.lock().expect("posting mutex poisoned");
        Ok(guard
            .values()
            .filter(|posting| posting.employer_id == *employer_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryApplications {
    records: Mutex<HashMap<ApplicationId, Application>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("application mutex poisoned");
        let duplicate = guard.values().any(|stored| {
            stored.job_posting_id == application.job_posting_id
                && stored.applicant_id == application.applicant_id
        });
        if duplicate || guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(
        &self,
        mut application: Application,
        expected_version: u64,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("application mutex poisoned");
        let stored = guard
            .get(&application.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::Conflict);
        }
        application.version = expected_version + 1;
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("application mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn by_applicant(&self, applicant_id: &UserId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| application.applicant_id == *applicant_id)
            .cloned()
            .collect())
    }

    fn by_posting(&self, posting_id: &PostingId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| application.job_posting_id == *posting_id)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn open_count_for_posting(&self, posting_id: &PostingId) -> Result<usize, RepositoryError> {
        let guard = self.records.lock().expect("application mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| {
                application.job_posting_id == *posting_id && !application.status.is_terminal()
            })
            .count())
    }
}

/// How the test gateway answers the next pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum GatewayMode {
    /// Echo the pushed record back as the canonical copy.
    Online,
    /// Fail with a network-class error.
    Offline,
    /// Refuse the mutation outright.
    Rejecting,
}

/// Echo gateway whose behavior can be flipped mid-test.
pub(super) struct ToggleGateway {
    mode: Mutex<GatewayMode>,
}

impl ToggleGateway {
    pub(super) fn online() -> Self {
        Self {
            mode: Mutex::new(GatewayMode::Online),
        }
    }

    pub(super) fn set_mode(&self, mode: GatewayMode) {
        *self.mode.lock().expect("gateway mutex poisoned") = mode;
    }

    pub(super) fn set_online(&self, online: bool) {
        self.set_mode(if online {
            GatewayMode::Online
        } else {
            GatewayMode::Offline
        });
    }

    fn mode(&self) -> GatewayMode {
        *self.mode.lock().expect("gateway mutex poisoned")
    }
}

impl BackendGateway for ToggleGateway {
    fn push_posting(&self, posting: &JobPosting) -> Result<JobPosting, GatewayError> {
        match self.mode() {
            GatewayMode::Online => Ok(posting.clone()),
            GatewayMode::Offline => Err(GatewayError::Unavailable("backend offline".to_string())),
            GatewayMode::Rejecting => Err(GatewayError::Rejected(
                "record failed server validation".to_string(),
            )),
        }
    }

    fn push_application(&self, application: &Application) -> Result<Application, GatewayError> {
        match self.mode() {
            GatewayMode::Online => Ok(application.clone()),
            GatewayMode::Offline => Err(GatewayError::Unavailable("backend offline".to_string())),
            GatewayMode::Rejecting => Err(GatewayError::Rejected(
                "record failed server validation".to_string(),
            )),
        }
    }
}

pub(super) fn transition_to(
    engine: &TestEngine,
    actor: &Actor,
    application_id: &ApplicationId,
    status: ApplicationStatus,
) -> Application {
    engine
        .transition(
            actor,
            application_id,
            crate::lifecycle::engine::TransitionRequest::to(status),
        )
        .expect("transition succeeds")
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
