//! The application and posting lifecycle engine.
//!
//! Every status change in the portal funnels through [`LifecycleEngine`]:
//! the access guard authorizes the actor against the freshly read row, the
//! transition tables in [`domain`] decide whether the edge is legal, the
//! repositories commit with a compare-and-swap on the record version, and
//! the sync projector reconciles the commit with the backend of record
//! (or parks it in the outbox, visibly unsynced, when the network is down).

pub mod access;
pub mod domain;
pub mod engine;
pub mod repository;
pub mod router;
pub mod scheduler;
pub mod sync;
pub mod views;

#[cfg(test)]
mod tests;

pub use access::{AccessDenied, AccessGuard, Actor, Role};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, Interview, InterviewId, InterviewType,
    JobPosting, JobType, PostingDraft, PostingId, PostingPatch, PostingStatus, StatusChange,
    StatusColor, StatusDescriptor, UserId,
};
pub use engine::{LifecycleEngine, LifecycleError, TransitionRequest};
pub use repository::{ApplicationRepository, PostingRepository, RepositoryError};
pub use router::lifecycle_router;
pub use scheduler::{InterviewRequest, InterviewScheduler, SchedulingError};
pub use sync::{
    BackendGateway, FlushReport, GatewayError, PendingMutation, Projection, SyncProjector,
};
pub use views::{ApplicationDetails, PostingSummary};
