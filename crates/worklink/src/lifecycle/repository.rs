use super::domain::{Application, ApplicationId, JobPosting, PostingId, UserId};

/// Error enumeration for storage failures. `Conflict` covers both duplicate
/// inserts and stale-version compare-and-swap rejections.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or stored version is newer")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage seam for job postings so the engine can be exercised in
/// isolation. Implementations must treat `update` as a compare-and-swap:
/// the write commits only while the stored version equals
/// `expected_version`, and the committed record carries `expected_version
/// + 1`.
pub trait PostingRepository: Send + Sync {
    fn insert(&self, posting: JobPosting) -> Result<JobPosting, RepositoryError>;
    fn update(
        &self,
        posting: JobPosting,
        expected_version: u64,
    ) -> Result<JobPosting, RepositoryError>;
    fn fetch(&self, id: &PostingId) -> Result<Option<JobPosting>, RepositoryError>;
    fn remove(&self, id: &PostingId) -> Result<(), RepositoryError>;
    /// Case-insensitive title search; DELETED postings are excluded.
    fn search(&self, query: Option<&str>) -> Result<Vec<JobPosting>, RepositoryError>;
    fn by_employer(&self, employer_id: &UserId) -> Result<Vec<JobPosting>, RepositoryError>;
}

/// Storage seam for applications. `insert` enforces the one-application-per
/// (posting, applicant) invariant with `Conflict`.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(
        &self,
        application: Application,
        expected_version: u64,
    ) -> Result<Application, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    /// Applications are never deleted through the lifecycle; this exists
    /// solely to roll back an insert the backend refused to confirm.
    fn remove(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
    fn by_applicant(&self, applicant_id: &UserId) -> Result<Vec<Application>, RepositoryError>;
    fn by_posting(&self, posting_id: &PostingId) -> Result<Vec<Application>, RepositoryError>;
    fn all(&self) -> Result<Vec<Application>, RepositoryError>;
    /// Number of non-terminal applications still referencing a posting.
    fn open_count_for_posting(&self, posting_id: &PostingId) -> Result<usize, RepositoryError>;
}
