use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    Application, JobPosting, JobType, PostingId, PostingStatus, StatusDescriptor,
};

/// Posting fields the dashboards render next to an application row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingSummary {
    pub id: PostingId,
    pub title: String,
    pub company_name: Option<String>,
    pub location: String,
    pub job_type: JobType,
    pub status: PostingStatus,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub required_skills: Vec<String>,
    pub posted_date: DateTime<Utc>,
}

impl PostingSummary {
    pub fn from_posting(posting: &JobPosting) -> Self {
        Self {
            id: posting.id.clone(),
            title: posting.title.clone(),
            company_name: posting.company_name.clone(),
            location: posting.location.clone(),
            job_type: posting.job_type,
            status: posting.status,
            min_salary: posting.min_salary,
            max_salary: posting.max_salary,
            required_skills: posting.required_skills.clone(),
            posted_date: posting.posted_date,
        }
    }
}

/// Enriched application row served to both dashboards. `posting` is `None`
/// (serialized as null) when the referenced posting no longer resolves, so
/// clients render their own fallback instead of fabricated defaults.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    pub application: Application,
    pub posting: Option<PostingSummary>,
    pub status: StatusDescriptor,
}

impl ApplicationDetails {
    pub fn new(application: Application, posting: Option<&JobPosting>) -> Self {
        let status = application.status.descriptor();
        Self {
            application,
            posting: posting.map(PostingSummary::from_posting),
            status,
        }
    }
}
