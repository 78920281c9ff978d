//! Directory of senders, recipients, and recipient groups.
//!
//! The engine only reads these for reference resolution; full CRUD lives
//! with the surrounding platform.

use dashmap::DashMap;
use phishline_core::types::{Recipient, RecipientGroup, Sender};
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory directory.
pub struct DirectoryStore {
    senders: DashMap<Uuid, Sender>,
    recipients: DashMap<Uuid, Recipient>,
    groups: DashMap<Uuid, RecipientGroup>,
}

impl DirectoryStore {
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
            recipients: DashMap::new(),
            groups: DashMap::new(),
        }
    }

    // ─── Senders ───────────────────────────────────────────────────────────

    pub fn add_sender(&self, sender: Sender) -> Uuid {
        let id = sender.id;
        self.senders.insert(id, sender);
        id
    }

    pub fn sender(&self, id: Uuid) -> Option<Sender> {
        self.senders.get(&id).map(|r| r.value().clone())
    }

    pub fn list_senders(&self) -> Vec<Sender> {
        self.senders.iter().map(|r| r.value().clone()).collect()
    }

    // ─── Recipients ────────────────────────────────────────────────────────

    pub fn add_recipient(&self, recipient: Recipient) -> Uuid {
        let id = recipient.id;
        self.recipients.insert(id, recipient);
        id
    }

    pub fn recipient(&self, id: Uuid) -> Option<Recipient> {
        self.recipients.get(&id).map(|r| r.value().clone())
    }

    pub fn list_recipients(&self) -> Vec<Recipient> {
        self.recipients.iter().map(|r| r.value().clone()).collect()
    }

    // ─── Groups ────────────────────────────────────────────────────────────

    pub fn add_group(&self, group: RecipientGroup) -> Uuid {
        let id = group.id;
        self.groups.insert(id, group);
        id
    }

    pub fn group(&self, id: Uuid) -> Option<RecipientGroup> {
        self.groups.get(&id).map(|r| r.value().clone())
    }

    pub fn list_groups(&self) -> Vec<RecipientGroup> {
        self.groups.iter().map(|r| r.value().clone()).collect()
    }

    /// Resolve a group to its member recipients, preserving group order.
    /// Dangling member ids (recipient deleted after being added) are
    /// skipped rather than treated as an error.
    pub fn resolve_group(&self, id: Uuid) -> Option<Vec<Recipient>> {
        let group = self.group(id)?;
        Some(
            group
                .recipients
                .iter()
                .filter_map(|rid| self.recipient(*rid))
                .collect(),
        )
    }

    /// Populate a handful of senders/recipients for local development.
    pub fn seed_demo_data(&self) {
        let sender = Sender {
            id: Uuid::new_v4(),
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: "it-support@example.com".to_string(),
            smtp_password: "changeme".to_string(),
        };
        let sender_id = self.add_sender(sender);

        let names = [
            ("Alice", "Hart", "alice.hart@example.com", "Accountant"),
            ("Bruno", "Keller", "bruno.keller@example.com", "Engineer"),
            ("Carla", "Ostrow", "carla.ostrow@example.com", "HR Manager"),
        ];
        let mut member_ids = Vec::new();
        for (first, last, email, position) in names {
            let id = self.add_recipient(Recipient {
                id: Uuid::new_v4(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: email.to_string(),
                position: position.to_string(),
            });
            member_ids.push(id);
        }

        let group_id = self.add_group(RecipientGroup {
            id: Uuid::new_v4(),
            name: "Finance team".to_string(),
            recipients: member_ids,
        });

        info!(%sender_id, %group_id, "Demo directory data seeded");
    }
}

impl Default for DirectoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(email: &str) -> Recipient {
        Recipient {
            id: Uuid::new_v4(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            position: "Analyst".to_string(),
        }
    }

    #[test]
    fn group_resolution_preserves_order() {
        let store = DirectoryStore::new();
        let a = store.add_recipient(recipient("a@example.com"));
        let b = store.add_recipient(recipient("b@example.com"));
        let c = store.add_recipient(recipient("c@example.com"));

        let gid = store.add_group(RecipientGroup {
            id: Uuid::new_v4(),
            name: "g".to_string(),
            recipients: vec![c, a, b],
        });

        let resolved = store.resolve_group(gid).unwrap();
        let emails: Vec<&str> = resolved.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(
            emails,
            vec!["c@example.com", "a@example.com", "b@example.com"]
        );
    }

    #[test]
    fn dangling_members_are_skipped() {
        let store = DirectoryStore::new();
        let a = store.add_recipient(recipient("a@example.com"));
        let gid = store.add_group(RecipientGroup {
            id: Uuid::new_v4(),
            name: "g".to_string(),
            recipients: vec![a, Uuid::new_v4()],
        });

        assert_eq!(store.resolve_group(gid).unwrap().len(), 1);
    }

    #[test]
    fn unknown_group_is_none() {
        let store = DirectoryStore::new();
        assert!(store.resolve_group(Uuid::new_v4()).is_none());
    }
}
