//! Campaign records: one row per send operation, written before any
//! delivery so tracking links can reference a durable id.

use chrono::Utc;
use dashmap::DashMap;
use phishline_core::types::{Campaign, Recipient};
use uuid::Uuid;

pub struct NewCampaign {
    pub sender_id: Uuid,
    pub group_id: Uuid,
    pub campaign_name: String,
    pub subject: String,
    pub body: String,
    pub platform: String,
    pub host: String,
}

pub struct CampaignStore {
    campaigns: DashMap<Uuid, Campaign>,
}

impl CampaignStore {
    pub fn new() -> Self {
        Self {
            campaigns: DashMap::new(),
        }
    }

    /// Persist a campaign with its recipient snapshot. The snapshot is the
    /// group membership at this instant; later group edits do not change
    /// the record.
    pub fn create(&self, new: NewCampaign, recipients: &[Recipient]) -> Campaign {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            sender_id: new.sender_id,
            group_id: new.group_id,
            recipients: recipients.iter().map(|r| r.id).collect(),
            campaign_name: new.campaign_name,
            subject: new.subject,
            body: new.body,
            platform: new.platform,
            host: new.host,
            link: None,
            sent_at: Utc::now(),
        };
        self.campaigns.insert(campaign.id, campaign.clone());
        campaign
    }

    pub fn get(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    pub fn list(&self) -> Vec<Campaign> {
        let mut all: Vec<Campaign> = self.campaigns.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        all
    }

    pub fn count(&self) -> usize {
        self.campaigns.len()
    }

    /// Back-fill the representative tracking link (the first recipient's).
    /// The only mutation a campaign record ever sees.
    pub fn set_link(&self, id: Uuid, link: String) -> bool {
        match self.campaigns.get_mut(&id) {
            Some(mut entry) => {
                entry.link = Some(link);
                true
            }
            None => false,
        }
    }
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipients(n: usize) -> Vec<Recipient> {
        (0..n)
            .map(|i| Recipient {
                id: Uuid::new_v4(),
                first_name: format!("R{}", i),
                last_name: "Test".to_string(),
                email: format!("r{}@example.com", i),
                position: "Analyst".to_string(),
            })
            .collect()
    }

    fn sample_new() -> NewCampaign {
        NewCampaign {
            sender_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            campaign_name: "Q3 drill".to_string(),
            subject: "Action required".to_string(),
            body: "Click: [Suspicious Link]".to_string(),
            platform: "facebook".to_string(),
            host: "https://h".to_string(),
        }
    }

    #[test]
    fn snapshot_is_frozen_at_creation() {
        let store = CampaignStore::new();
        let recipients = sample_recipients(3);
        let campaign = store.create(sample_new(), &recipients);

        let ids: Vec<Uuid> = recipients.iter().map(|r| r.id).collect();
        assert_eq!(store.get(campaign.id).unwrap().recipients, ids);
    }

    #[test]
    fn link_backfill() {
        let store = CampaignStore::new();
        let campaign = store.create(sample_new(), &sample_recipients(1));
        assert!(store.get(campaign.id).unwrap().link.is_none());

        assert!(store.set_link(campaign.id, "https://h/track/a/b/facebook/".to_string()));
        assert_eq!(
            store.get(campaign.id).unwrap().link.as_deref(),
            Some("https://h/track/a/b/facebook/")
        );

        assert!(!store.set_link(Uuid::new_v4(), "x".to_string()));
    }
}
