//! Dispatch-job reporting types shared between the dispatcher and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of one recipient's delivery inside a dispatch job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeliveryState {
    /// Submitted to the job, not yet picked up by a worker.
    Pending,
    /// Handed to the SMTP transport.
    Sending,
    /// The transport accepted the message.
    Sent,
    /// Delivery failed; sibling deliveries are unaffected.
    Failed { reason: String },
    /// The job was cancelled before this delivery started.
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientDelivery {
    pub recipient_id: Uuid,
    pub email: String,
    pub tracking_url: String,
    pub state: DeliveryState,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Complete,
    Cancelled,
}

/// Per-recipient success/failure summary for one dispatch job. Callers use
/// this to distinguish "submission complete" from "delivery confirmed":
/// the send endpoint returns as soon as deliveries are submitted, and the
/// report reflects outcomes as workers finish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub job_id: Uuid,
    pub campaign_id: Uuid,
    pub state: JobState,
    pub deliveries: Vec<RecipientDelivery>,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DispatchReport {
    pub fn sent(&self) -> usize {
        self.count(|s| matches!(s, DeliveryState::Sent))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DeliveryState::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|s| matches!(s, DeliveryState::Cancelled))
    }

    fn count(&self, pred: impl Fn(&DeliveryState) -> bool) -> usize {
        self.deliveries.iter().filter(|d| pred(&d.state)).count()
    }
}

/// Returned by the send endpoint once all deliveries have been submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReceipt {
    pub campaign_id: Uuid,
    pub job_id: Uuid,
    pub recipient_count: usize,
}
