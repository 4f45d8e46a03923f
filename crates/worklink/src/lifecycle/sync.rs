use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::domain::{Application, ApplicationId, JobPosting, PostingId};
use super::repository::{ApplicationRepository, PostingRepository, RepositoryError};

/// Outbound seam to the backend of record. `push_*` submits the locally
/// committed record and returns the server's canonical copy.
pub trait BackendGateway: Send + Sync {
    fn push_posting(&self, posting: &JobPosting) -> Result<JobPosting, GatewayError>;
    fn push_application(&self, application: &Application) -> Result<Application, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Network-class failure; the mutation may be retried later.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The backend refused the mutation outright; never retried.
    #[error("backend rejected the mutation: {0}")]
    Rejected(String),
}

/// A record waiting in the outbox for reconciliation with the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingMutation {
    Posting(PostingId),
    Application(ApplicationId),
}

/// Outcome of projecting one record through the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection<T> {
    /// The backend confirmed the mutation; this is its canonical record.
    Synced(T),
    /// The backend was unreachable; the optimistic record is kept locally,
    /// flagged unsynced, and queued for a later flush.
    Deferred(T),
}

impl<T> Projection<T> {
    pub fn into_record(self) -> T {
        match self {
            Projection::Synced(record) | Projection::Deferred(record) => record,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Projection::Deferred(_))
    }
}

/// Summary returned by [`SyncProjector::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    pub reconciled: usize,
    pub still_pending: usize,
}

/// Reconciles locally committed records with the backend of record.
/// Divergence is never silent: a record that could not be pushed stays
/// visible as `unsynced = true` and sits in the outbox until a flush
/// succeeds.
pub struct SyncProjector<G> {
    gateway: Arc<G>,
    outbox: Mutex<VecDeque<PendingMutation>>,
}

impl<G> SyncProjector<G>
where
    G: BackendGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            outbox: Mutex::new(VecDeque::new()),
        }
    }

    pub fn pending(&self) -> Vec<PendingMutation> {
        self.outbox
            .lock()
            .expect("outbox mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Push a freshly committed posting. `Rejected` bubbles up so the
    /// engine can roll the optimistic write back.
    pub fn project_posting(&self, posting: JobPosting) -> Result<Projection<JobPosting>, GatewayError> {
        match self.gateway.push_posting(&posting) {
            Ok(mut canonical) => {
                canonical.unsynced = false;
                Ok(Projection::Synced(canonical))
            }
            Err(GatewayError::Unavailable(reason)) => {
                tracing::warn!(%reason, posting = %posting.id.0, "posting kept locally, queued for sync");
                self.enqueue(PendingMutation::Posting(posting.id.clone()));
                let mut deferred = posting;
                deferred.unsynced = true;
                Ok(Projection::Deferred(deferred))
            }
            Err(err) => Err(err),
        }
    }

    pub fn project_application(
        &self,
        application: Application,
    ) -> Result<Projection<Application>, GatewayError> {
        match self.gateway.push_application(&application) {
            Ok(mut canonical) => {
                canonical.unsynced = false;
                Ok(Projection::Synced(canonical))
            }
            Err(GatewayError::Unavailable(reason)) => {
                tracing::warn!(%reason, application = %application.id.0, "application kept locally, queued for sync");
                self.enqueue(PendingMutation::Application(application.id.clone()));
                let mut deferred = application;
                deferred.unsynced = true;
                Ok(Projection::Deferred(deferred))
            }
            Err(err) => Err(err),
        }
    }

    /// Drain the outbox against the gateway, re-reading each record from
    /// its repository first. Stops at the first still-unavailable push and
    /// re-queues the remainder in order.
    pub fn flush<P, A>(&self, postings: &P, applications: &A) -> Result<FlushReport, RepositoryError>
    where
        P: PostingRepository,
        A: ApplicationRepository,
    {
        let drained: Vec<PendingMutation> = {
            let mut outbox = self.outbox.lock().expect("outbox mutex poisoned");
            outbox.drain(..).collect()
        };

        let mut report = FlushReport::default();
        let mut halted = false;
        let mut requeue: VecDeque<PendingMutation> = VecDeque::new();

        for pending in drained {
            if halted {
                requeue.push_back(pending);
                continue;
            }
            match &pending {
                PendingMutation::Posting(id) => {
                    let Some(stored) = postings.fetch(id)? else {
                        // Removed since it was queued; nothing to reconcile.
                        continue;
                    };
                    match self.gateway.push_posting(&stored) {
                        Ok(mut canonical) => {
                            canonical.unsynced = false;
                            postings.update(canonical, stored.version)?;
                            report.reconciled += 1;
                        }
                        Err(GatewayError::Unavailable(_)) => {
                            requeue.push_back(pending);
                            halted = true;
                        }
                        Err(GatewayError::Rejected(reason)) => {
                            // Dropped from the queue; the record stays
                            // visibly unsynced until an operator intervenes.
                            tracing::error!(%reason, posting = %id.0, "backend rejected queued posting");
                        }
                    }
                }
                PendingMutation::Application(id) => {
                    let Some(stored) = applications.fetch(id)? else {
                        continue;
                    };
                    match self.gateway.push_application(&stored) {
                        Ok(mut canonical) => {
                            canonical.unsynced = false;
                            applications.update(canonical, stored.version)?;
                            report.reconciled += 1;
                        }
                        Err(GatewayError::Unavailable(_)) => {
                            requeue.push_back(pending);
                            halted = true;
                        }
                        Err(GatewayError::Rejected(reason)) => {
                            tracing::error!(%reason, application = %id.0, "backend rejected queued application");
                        }
                    }
                }
            }
        }

        let mut outbox = self.outbox.lock().expect("outbox mutex poisoned");
        report.still_pending = requeue.len() + outbox.len();
        for pending in requeue.into_iter().rev() {
            outbox.push_front(pending);
        }

        Ok(report)
    }

    fn enqueue(&self, pending: PendingMutation) {
        let mut outbox = self.outbox.lock().expect("outbox mutex poisoned");
        if !outbox.contains(&pending) {
            outbox.push_back(pending);
        }
    }
}
