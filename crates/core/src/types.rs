use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SMTP identity a campaign is sent through. The port doubles as the TLS
/// policy selector: 587 means STARTTLS, 465 means implicit TLS, anything
/// else is a plain connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub id: Uuid,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
}

/// One simulated-phishing target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
}

impl Recipient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A named, ordered set of recipients. Campaigns snapshot the membership
/// at dispatch time; later edits never change a sent campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientGroup {
    pub id: Uuid,
    pub name: String,
    pub recipients: Vec<Uuid>,
}

/// One send operation. Immutable after creation except for `link`, which
/// is back-filled with the first recipient's tracking URL once known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub group_id: Uuid,
    /// Recipient membership frozen at dispatch time.
    pub recipients: Vec<Uuid>,
    pub campaign_name: String,
    pub subject: String,
    pub body: String,
    pub platform: String,
    pub host: String,
    pub link: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// A deduplicated click fact. At most one exists per
/// (recipient, campaign, platform) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub recipient_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub platform: String,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}

/// An append-only credential-submission fact. Never deduplicated:
/// repeated attempts are part of the training-exercise signal. The
/// password is stored as submitted — a deliberate simulation artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEvent {
    pub recipient_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub platform: String,
    pub email: String,
    pub password: String,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}
