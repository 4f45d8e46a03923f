use serde::{Deserialize, Serialize};

use super::domain::{Application, JobPosting, UserId};

/// Portal roles as issued by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    JobSeeker,
    Employer,
    Staff,
    Provider,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "JOB_SEEKER" => Some(Role::JobSeeker),
            "EMPLOYER" => Some(Role::Employer),
            "STAFF" => Some(Role::Staff),
            "PROVIDER" => Some(Role::Provider),
            _ => None,
        }
    }
}

/// The authenticated principal behind a request. Passed explicitly into
/// every mutation so no component reads ambient "current user" state.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: UserId,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn new(id: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id: UserId(id.into()),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_staff(&self) -> bool {
        self.has_role(Role::Staff)
    }
}

/// Denials raised before any state is touched; mutations are all-or-nothing
/// with respect to authorization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessDenied {
    #[error("requires the {0:?} role")]
    MissingRole(Role),
    #[error("only the owning employer or staff may manage this posting")]
    NotPostingOwner,
    #[error("only the owning employer or staff may review applications for this posting")]
    NotApplicationReviewer,
    #[error("only the applicant may withdraw an application")]
    NotApplicant,
    #[error("not permitted to view this application")]
    NotViewer,
}

/// Role-based capability checks consulted by the engine ahead of every
/// mutation. Predicates are evaluated against freshly read rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGuard;

impl AccessGuard {
    pub fn require_role(&self, actor: &Actor, role: Role) -> Result<(), AccessDenied> {
        if actor.has_role(role) || actor.is_staff() {
            Ok(())
        } else {
            Err(AccessDenied::MissingRole(role))
        }
    }

    /// Applying is strictly a job-seeker action; staff cannot apply on a
    /// seeker's behalf.
    pub fn submit_application(&self, actor: &Actor) -> Result<(), AccessDenied> {
        if actor.has_role(Role::JobSeeker) {
            Ok(())
        } else {
            Err(AccessDenied::MissingRole(Role::JobSeeker))
        }
    }

    /// Posting mutations: the owning employer or staff.
    pub fn manage_posting(&self, actor: &Actor, posting: &JobPosting) -> Result<(), AccessDenied> {
        if actor.is_staff() {
            return Ok(());
        }
        if actor.has_role(Role::Employer) && posting.employer_id == actor.id {
            return Ok(());
        }
        Err(AccessDenied::NotPostingOwner)
    }

    /// Application status moves (other than withdrawal): posting owner or
    /// staff.
    pub fn review_application(
        &self,
        actor: &Actor,
        posting: &JobPosting,
    ) -> Result<(), AccessDenied> {
        if actor.is_staff() {
            return Ok(());
        }
        if actor.has_role(Role::Employer) && posting.employer_id == actor.id {
            return Ok(());
        }
        Err(AccessDenied::NotApplicationReviewer)
    }

    /// WITHDRAWN is applicant-initiated only; staff cannot withdraw on a
    /// seeker's behalf.
    pub fn withdraw_application(
        &self,
        actor: &Actor,
        application: &Application,
    ) -> Result<(), AccessDenied> {
        if application.applicant_id == actor.id {
            Ok(())
        } else {
            Err(AccessDenied::NotApplicant)
        }
    }

    /// Read access to a single application: the applicant, the posting
    /// owner, or staff.
    pub fn view_application(
        &self,
        actor: &Actor,
        application: &Application,
        posting: Option<&JobPosting>,
    ) -> Result<(), AccessDenied> {
        if actor.is_staff() || application.applicant_id == actor.id {
            return Ok(());
        }
        if let Some(posting) = posting {
            if actor.has_role(Role::Employer) && posting.employer_id == actor.id {
                return Ok(());
            }
        }
        Err(AccessDenied::NotViewer)
    }
}
