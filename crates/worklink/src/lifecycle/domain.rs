use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostingId(pub String);

/// Identifier wrapper for applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for interview records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterviewId(pub String);

/// Identifier wrapper for portal users (employers, applicants, staff).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Employment categories shared with the backend of record. The client
/// historically sent `INTERNSHIP`, which the boundary accepts as `INTERN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    #[serde(alias = "INTERNSHIP")]
    Intern,
    Temporary,
}

/// Lifecycle of a job posting. DELETED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostingStatus {
    Active,
    Inactive,
    Hold,
    Deleted,
}

impl PostingStatus {
    pub const ALL: [PostingStatus; 4] = [
        PostingStatus::Active,
        PostingStatus::Inactive,
        PostingStatus::Hold,
        PostingStatus::Deleted,
    ];

    pub const fn is_terminal(self) -> bool {
        matches!(self, PostingStatus::Deleted)
    }

    /// ACTIVE, INACTIVE, and HOLD move freely between each other; any state
    /// may move to DELETED; DELETED accepts nothing, self-edges included.
    pub fn can_transition_to(self, next: PostingStatus) -> bool {
        match (self, next) {
            (PostingStatus::Deleted, _) => false,
            (_, PostingStatus::Deleted) => true,
            (current, next) => current != next,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PostingStatus::Active => "Active",
            PostingStatus::Inactive => "Inactive",
            PostingStatus::Hold => "On Hold",
            PostingStatus::Deleted => "Deleted",
        }
    }

    pub const fn descriptor(self) -> StatusDescriptor {
        let (value, color) = match self {
            PostingStatus::Active => ("ACTIVE", StatusColor::Success),
            PostingStatus::Inactive => ("INACTIVE", StatusColor::Error),
            PostingStatus::Hold => ("HOLD", StatusColor::Warning),
            PostingStatus::Deleted => ("DELETED", StatusColor::Default),
        };
        StatusDescriptor {
            value,
            label: self.label(),
            color,
        }
    }
}

/// Lifecycle of an application. OFFERED, REJECTED, and WITHDRAWN are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Received,
    UnderReview,
    InterviewScheduled,
    Offered,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Received,
        ApplicationStatus::UnderReview,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Offered,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Offered | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// The single transition table every mutation is checked against.
    pub const fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Received, UnderReview | InterviewScheduled | Rejected | Withdrawn)
                | (UnderReview, InterviewScheduled | Offered | Rejected | Withdrawn)
                | (InterviewScheduled, Offered | Rejected | Withdrawn)
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Received => "Received",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::Offered => "Offered",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Withdrawn => "Withdrawn",
        }
    }

    pub const fn descriptor(self) -> StatusDescriptor {
        let (value, color) = match self {
            ApplicationStatus::Received => ("RECEIVED", StatusColor::Info),
            ApplicationStatus::UnderReview => ("UNDER_REVIEW", StatusColor::Warning),
            ApplicationStatus::InterviewScheduled => ("INTERVIEW_SCHEDULED", StatusColor::Primary),
            ApplicationStatus::Offered => ("OFFERED", StatusColor::Success),
            ApplicationStatus::Rejected => ("REJECTED", StatusColor::Error),
            ApplicationStatus::Withdrawn => ("WITHDRAWN", StatusColor::Default),
        };
        StatusDescriptor {
            value,
            label: self.label(),
            color,
        }
    }
}

/// UI badge palette names the dashboards render with. Owned here so no
/// screen redefines the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Default,
    Info,
    Primary,
    Success,
    Warning,
    Error,
}

/// Wire value, human label, and badge color for one status literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDescriptor {
    pub value: &'static str,
    pub label: &'static str,
    pub color: StatusColor,
}

/// How an interview is conducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewType {
    InPerson,
    VideoCall,
    Phone,
}

/// A job advertisement owned by one employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: PostingId,
    pub employer_id: UserId,
    pub title: String,
    pub company_name: Option<String>,
    pub description: String,
    pub location: String,
    pub job_type: JobType,
    pub status: PostingStatus,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub required_skills: Vec<String>,
    pub posted_date: DateTime<Utc>,
    /// Optimistic concurrency counter; bumped on every committed mutation.
    pub version: u64,
    /// True while the local record diverges from the backend of record.
    pub unsynced: bool,
}

impl JobPosting {
    pub fn accepts_applications(&self) -> bool {
        self.status == PostingStatus::Active
    }
}

/// One job seeker's candidacy against one posting. Never deleted, only
/// moved to a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub job_posting_id: PostingId,
    pub applicant_id: UserId,
    pub status: ApplicationStatus,
    pub application_date: DateTime<Utc>,
    /// Present iff `status` is REJECTED.
    pub reject_reason: Option<String>,
    /// Present once the application has reached INTERVIEW_SCHEDULED;
    /// retained afterwards as a historical record.
    pub interview: Option<Interview>,
    /// Immutable audit trail, seeded with the RECEIVED entry at apply time.
    pub history: Vec<StatusChange>,
    pub version: u64,
    pub unsynced: bool,
}

impl Application {
    pub fn latest_change(&self) -> Option<&StatusChange> {
        self.history.last()
    }
}

/// Audit entry appended on every successful status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub actor_id: UserId,
    pub changed_at: DateTime<Utc>,
}

/// Interview sub-record embedded in its owning application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: InterviewId,
    pub application_id: ApplicationId,
    pub scheduled_at: DateTime<Utc>,
    pub interview_type: InterviewType,
    pub location: String,
    pub notes: Option<String>,
}

/// Fields an employer supplies when creating a posting. `job_type` stays
/// optional here so the engine can report its absence as a validation
/// failure instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostingDraft {
    pub title: String,
    pub company_name: Option<String>,
    pub description: String,
    pub location: String,
    pub job_type: Option<JobType>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub required_skills: Vec<String>,
}

/// Partial update applied to an existing posting; `None` leaves the field
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostingPatch {
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub required_skills: Option<Vec<String>>,
}
