//! Append-only audit facts: click events (deduplicated) and credential
//! events (never deduplicated).

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use phishline_core::types::{ClickEvent, CredentialEvent};
use uuid::Uuid;

/// Composite key enforcing the at-most-one-click invariant.
type ClickKey = (Uuid, Uuid, String);

pub struct EventStore {
    /// Keyed by (recipient, campaign, platform); the map entry doubles as
    /// the unique index, so insert-or-ignore is a single atomic operation.
    clicks: DashMap<ClickKey, ClickEvent>,
    credentials: DashMap<Uuid, CredentialEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            clicks: DashMap::new(),
            credentials: DashMap::new(),
        }
    }

    /// Insert-or-ignore a click for the triple. Returns `true` when this
    /// call recorded the first click, `false` on a repeat. Concurrent
    /// first clicks race on the shard lock held by `entry`, so exactly
    /// one of them wins.
    pub fn record_click(
        &self,
        recipient_id: Uuid,
        campaign_id: Uuid,
        platform: &str,
        event: ClickEvent,
    ) -> bool {
        let key = (recipient_id, campaign_id, platform.to_string());
        match self.clicks.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(event);
                true
            }
        }
    }

    pub fn click_count(&self) -> usize {
        self.clicks.len()
    }

    /// Click events, newest first.
    pub fn list_clicks(&self) -> Vec<ClickEvent> {
        let mut all: Vec<ClickEvent> = self.clicks.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all
    }

    /// Append a credential submission. Every invocation stores a new row,
    /// repeats included.
    pub fn record_credential(&self, event: CredentialEvent) -> Uuid {
        let id = Uuid::new_v4();
        self.credentials.insert(id, event);
        id
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Credential events, newest first.
    pub fn list_credentials(&self) -> Vec<CredentialEvent> {
        let mut all: Vec<CredentialEvent> =
            self.credentials.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn click(recipient: Uuid, campaign: Uuid, platform: &str) -> ClickEvent {
        ClickEvent {
            recipient_id: Some(recipient),
            campaign_id: Some(campaign),
            platform: platform.to_string(),
            ip_address: "203.0.113.9".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn credential(recipient: Option<Uuid>, campaign: Option<Uuid>) -> CredentialEvent {
        CredentialEvent {
            recipient_id: recipient,
            campaign_id: campaign,
            platform: "facebook".to_string(),
            email: "victim@example.com".to_string(),
            password: "hunter2".to_string(),
            ip_address: "203.0.113.9".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn repeat_clicks_store_one_row() {
        let store = EventStore::new();
        let (r, c) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(store.record_click(r, c, "facebook", click(r, c, "facebook")));
        assert!(!store.record_click(r, c, "facebook", click(r, c, "facebook")));
        assert!(!store.record_click(r, c, "facebook", click(r, c, "facebook")));
        assert_eq!(store.click_count(), 1);
    }

    #[test]
    fn distinct_platforms_are_distinct_triples() {
        let store = EventStore::new();
        let (r, c) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(store.record_click(r, c, "facebook", click(r, c, "facebook")));
        assert!(store.record_click(r, c, "google", click(r, c, "google")));
        assert_eq!(store.click_count(), 2);
    }

    #[test]
    fn concurrent_first_clicks_insert_exactly_once() {
        let store = Arc::new(EventStore::new());
        let (r, c) = (Uuid::new_v4(), Uuid::new_v4());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.record_click(r, c, "facebook", click(r, c, "facebook"))
                })
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|h| h.join().expect("click thread panicked"))
            .filter(|won| *won)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(store.click_count(), 1);
    }

    #[test]
    fn credentials_are_never_deduplicated() {
        let store = EventStore::new();
        let (r, c) = (Uuid::new_v4(), Uuid::new_v4());

        store.record_credential(credential(Some(r), Some(c)));
        store.record_credential(credential(Some(r), Some(c)));
        store.record_credential(credential(Some(r), Some(c)));
        assert_eq!(store.credential_count(), 3);
    }

    #[test]
    fn credentials_tolerate_null_references() {
        let store = EventStore::new();
        store.record_credential(credential(None, None));
        assert_eq!(store.credential_count(), 1);
        assert!(store.list_credentials()[0].recipient_id.is_none());
    }
}
