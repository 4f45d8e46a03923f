use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use worklink::lifecycle::{
    Application, ApplicationId, ApplicationRepository, BackendGateway, GatewayError, JobPosting,
    PostingId, PostingRepository, PostingStatus, RepositoryError, UserId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryPostingRepository {
    records: Mutex<HashMap<PostingId, JobPosting>>,
}

impl PostingRepository for InMemoryPostingRepository {
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
            .filter(|posting| posting.status != PostingStatus::Deleted)
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
pub(crate) struct InMemoryApplicationRepository {
    records: Mutex<HashMap<ApplicationId, Application>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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

/// Stand-in backend of record used when `APP_BACKEND_URL` is unset: echoes
/// every push as its own canonical answer. The demo flips it offline to
/// exercise the outbox path.
pub(crate) struct LoopbackGateway {
    online: AtomicBool,
}

impl Default for LoopbackGateway {
    fn default() -> Self {
        Self {
            online: AtomicBool::new(true),
        }
    }
}

impl LoopbackGateway {
    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl BackendGateway for LoopbackGateway {
    fn push_posting(&self, posting: &JobPosting) -> Result<JobPosting, GatewayError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(posting.clone())
        } else {
            Err(GatewayError::Unavailable("backend offline".to_string()))
        }
    }

    fn push_application(&self, application: &Application) -> Result<Application, GatewayError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(application.clone())
        } else {
            Err(GatewayError::Unavailable("backend offline".to_string()))
        }
    }
}
