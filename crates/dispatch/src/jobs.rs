//! Dispatch-job registry: per-recipient delivery status, completion
//! signalling, and cancellation.
//!
//! The send endpoint returns as soon as deliveries are submitted; the
//! registry is how callers observe eventual per-recipient outcomes.

use chrono::Utc;
use dashmap::DashMap;
use phishline_core::delivery::{DeliveryState, DispatchReport, JobState, RecipientDelivery};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use uuid::Uuid;

pub struct DispatchJob {
    id: Uuid,
    report: Mutex<DispatchReport>,
    cancelled: AtomicBool,
    state_tx: watch::Sender<JobState>,
}

impl DispatchJob {
    pub fn new(campaign_id: Uuid, deliveries: Vec<RecipientDelivery>) -> Arc<Self> {
        let id = Uuid::new_v4();
        let (state_tx, _) = watch::channel(JobState::Running);
        Arc::new(Self {
            id,
            report: Mutex::new(DispatchReport {
                job_id: id,
                campaign_id,
                state: JobState::Running,
                deliveries,
                submitted_at: Utc::now(),
                finished_at: None,
            }),
            cancelled: AtomicBool::new(false),
            state_tx,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn snapshot(&self) -> DispatchReport {
        self.lock_report().clone()
    }

    pub fn set_delivery_state(&self, index: usize, state: DeliveryState) {
        let mut report = self.lock_report();
        if let Some(delivery) = report.deliveries.get_mut(index) {
            delivery.state = state;
        }
    }

    /// Flag the job so not-yet-started deliveries are skipped. In-flight
    /// sends cannot be recalled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Mark the job finished once every delivery task has completed.
    pub fn finish(&self) {
        let state = if self.is_cancelled() {
            JobState::Cancelled
        } else {
            JobState::Complete
        };
        {
            let mut report = self.lock_report();
            report.state = state;
            report.finished_at = Some(Utc::now());
        }
        let _ = self.state_tx.send(state);
    }

    /// Wait until every delivery task has completed (or the job was
    /// cancelled and drained).
    pub async fn wait_complete(&self) -> JobState {
        let mut rx = self.state_tx.subscribe();
        loop {
            let state = *rx.borrow();
            if state != JobState::Running {
                return state;
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }

    fn lock_report(&self) -> std::sync::MutexGuard<'_, DispatchReport> {
        match self.report.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Registry of all dispatch jobs on this node.
pub struct JobRegistry {
    jobs: DashMap<Uuid, Arc<DispatchJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }

    pub fn register(&self, job: Arc<DispatchJob>) {
        self.jobs.insert(job.id(), job);
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<DispatchJob>> {
        self.jobs.get(&id).map(|r| r.value().clone())
    }

    pub fn report(&self, id: Uuid) -> Option<DispatchReport> {
        self.get(id).map(|job| job.snapshot())
    }

    /// Cancel a job and return its current report.
    pub fn cancel(&self, id: Uuid) -> Option<DispatchReport> {
        let job = self.get(id)?;
        job.cancel();
        metrics::counter!("dispatch.jobs_cancelled").increment(1);
        Some(job.snapshot())
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliveries(n: usize) -> Vec<RecipientDelivery> {
        (0..n)
            .map(|i| RecipientDelivery {
                recipient_id: Uuid::new_v4(),
                email: format!("r{}@example.com", i),
                tracking_url: format!("https://h/track/r{}/c/p/", i),
                state: DeliveryState::Pending,
            })
            .collect()
    }

    #[test]
    fn report_counts_follow_delivery_states() {
        let job = DispatchJob::new(Uuid::new_v4(), deliveries(3));
        job.set_delivery_state(0, DeliveryState::Sent);
        job.set_delivery_state(
            1,
            DeliveryState::Failed {
                reason: "connection refused".to_string(),
            },
        );

        let report = job.snapshot();
        assert_eq!(report.sent(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.cancelled(), 0);
        assert_eq!(report.state, JobState::Running);
    }

    #[tokio::test]
    async fn wait_complete_observes_finish() {
        let job = DispatchJob::new(Uuid::new_v4(), deliveries(1));
        let waiter = {
            let job = job.clone();
            tokio::spawn(async move { job.wait_complete().await })
        };

        job.set_delivery_state(0, DeliveryState::Sent);
        job.finish();

        assert_eq!(waiter.await.unwrap(), JobState::Complete);
        assert!(job.snapshot().finished_at.is_some());
    }

    #[test]
    fn registry_cancel_flags_job() {
        let registry = JobRegistry::new();
        let job = DispatchJob::new(Uuid::new_v4(), deliveries(2));
        registry.register(job.clone());

        assert!(registry.cancel(job.id()).is_some());
        assert!(job.is_cancelled());
        assert!(registry.cancel(Uuid::new_v4()).is_none());
    }
}
