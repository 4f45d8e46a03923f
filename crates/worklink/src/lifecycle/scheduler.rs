use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{Application, ApplicationStatus, Interview, InterviewId, InterviewType};

/// Details an employer supplies when booking an interview.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRequest {
    /// The dashboards historically sent `scheduledDateTime`; both spellings
    /// are accepted.
    #[serde(alias = "scheduledDateTime")]
    pub scheduled_at: DateTime<Utc>,
    pub interview_type: InterviewType,
    pub location: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    #[error("interview must be scheduled in the future (requested {requested})")]
    PastDateTime { requested: DateTime<Utc> },
    #[error("cannot schedule an interview while the application is {status:?}")]
    NotSchedulable { status: ApplicationStatus },
    #[error("no interview exists to reschedule")]
    NoInterview,
    #[error("interview location must not be empty")]
    EmptyLocation,
}

/// Attaches and reshapes the interview sub-record of an application. The
/// status edge itself is driven by the engine; this component only decides
/// whether the booking is valid and produces the record.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterviewScheduler;

impl InterviewScheduler {
    /// Build the interview for the RECEIVED/UNDER_REVIEW ->
    /// INTERVIEW_SCHEDULED edge. `now` is injected so callers (and tests)
    /// control the clock.
    pub fn schedule(
        &self,
        application: &Application,
        id: InterviewId,
        request: &InterviewRequest,
        now: DateTime<Utc>,
    ) -> Result<Interview, SchedulingError> {
        match application.status {
            ApplicationStatus::Received | ApplicationStatus::UnderReview => {}
            status => return Err(SchedulingError::NotSchedulable { status }),
        }
        if request.scheduled_at <= now {
            return Err(SchedulingError::PastDateTime {
                requested: request.scheduled_at,
            });
        }
        if request.location.trim().is_empty() {
            return Err(SchedulingError::EmptyLocation);
        }

        Ok(Interview {
            id,
            application_id: application.id.clone(),
            scheduled_at: request.scheduled_at,
            interview_type: request.interview_type,
            location: request.location.trim().to_string(),
            notes: request.notes.clone(),
        })
    }

    /// Replace the date/location of an existing interview without minting a
    /// new record. Identical input is a no-op and returns the stored
    /// interview unchanged.
    pub fn reschedule(
        &self,
        application: &Application,
        scheduled_at: DateTime<Utc>,
        location: String,
        now: DateTime<Utc>,
    ) -> Result<Interview, SchedulingError> {
        if application.status != ApplicationStatus::InterviewScheduled {
            return Err(SchedulingError::NotSchedulable {
                status: application.status,
            });
        }
        let current = application
            .interview
            .as_ref()
            .ok_or(SchedulingError::NoInterview)?;

        let location = location.trim().to_string();
        if location.is_empty() {
            return Err(SchedulingError::EmptyLocation);
        }
        if current.scheduled_at == scheduled_at && current.location == location {
            return Ok(current.clone());
        }
        if scheduled_at <= now {
            return Err(SchedulingError::PastDateTime {
                requested: scheduled_at,
            });
        }

        let mut updated = current.clone();
        updated.scheduled_at = scheduled_at;
        updated.location = location;
        Ok(updated)
    }
}
