//! Campaign dispatcher.
//!
//! `dispatch` persists the campaign record first (a durable id for the
//! tracking links), then submits one delivery task per recipient and
//! returns without waiting for outcomes. Each task is an independent unit
//! of work: one recipient's SMTP failure never blocks or rolls back a
//! sibling delivery. Outcomes land in the job registry.

use crate::jobs::{DispatchJob, JobRegistry};
use crate::mailer::{Mailer, MailerFactory, OutgoingEmail};
use phishline_core::config::SmtpConfig;
use phishline_core::delivery::{DeliveryState, DispatchReceipt, RecipientDelivery};
use phishline_core::links::{compose_tracking_url, render_body};
use phishline_core::types::Recipient;
use phishline_core::{PhishlineError, PhishlineResult};
use phishline_store::{CampaignStore, DirectoryStore};
use phishline_store::campaigns::NewCampaign;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_CAMPAIGN_NAME: &str = "Unnamed Campaign";
const DEFAULT_PLATFORM: &str = "facebook";

#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    pub sender: Uuid,
    pub recipient_group: Uuid,
    #[serde(default)]
    pub campaign_name: Option<String>,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub platform: Option<String>,
    /// Tracking host; falls back to the configured public host.
    #[serde(default)]
    pub host: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub recipient_id: Uuid,
    pub campaign_name: String,
    pub subject: String,
    pub body: String,
    pub tracking_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestEmailRequest {
    pub email: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
}

pub struct Dispatcher {
    directory: Arc<DirectoryStore>,
    campaigns: Arc<CampaignStore>,
    registry: Arc<JobRegistry>,
    factory: Arc<dyn MailerFactory>,
    smtp: SmtpConfig,
    default_host: String,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<DirectoryStore>,
        campaigns: Arc<CampaignStore>,
        registry: Arc<JobRegistry>,
        factory: Arc<dyn MailerFactory>,
        smtp: SmtpConfig,
        default_host: String,
    ) -> Self {
        Self {
            directory,
            campaigns,
            registry,
            factory,
            smtp,
            default_host,
        }
    }

    /// Run one campaign: validate, persist the campaign record, submit all
    /// recipient deliveries, back-fill the representative link, and return
    /// a receipt. "Submission complete" — delivery outcomes arrive later
    /// through the job registry.
    pub async fn dispatch(&self, request: SendRequest) -> PhishlineResult<DispatchReceipt> {
        let (sender, recipients) = self.resolve(&request)?;

        let platform = request
            .platform
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());
        let host = request
            .host
            .unwrap_or_else(|| self.default_host.clone());

        // Durable campaign id first, so every tracking link can carry it.
        let campaign = self.campaigns.create(
            NewCampaign {
                sender_id: sender.id,
                group_id: request.recipient_group,
                campaign_name: request
                    .campaign_name
                    .unwrap_or_else(|| DEFAULT_CAMPAIGN_NAME.to_string()),
                subject: request.subject.clone(),
                body: request.body.clone(),
                platform: platform.clone(),
                host: host.clone(),
            },
            &recipients,
        );

        let deliveries: Vec<RecipientDelivery> = recipients
            .iter()
            .map(|r| RecipientDelivery {
                recipient_id: r.id,
                email: r.email.clone(),
                tracking_url: compose_tracking_url(&host, r.id, campaign.id, &platform),
                state: DeliveryState::Pending,
            })
            .collect();

        // One transport per dispatch job, scoped to this sender's
        // credentials and dropped with the last delivery task.
        let mailer = self.factory.for_sender(&sender)?;

        let job = DispatchJob::new(campaign.id, deliveries.clone());
        let job_id = job.id();
        self.registry.register(job.clone());

        self.submit_deliveries(job.clone(), mailer, &request.subject, &request.body, &deliveries);

        // Representative link: the first recipient's tracking URL.
        self.campaigns
            .set_link(campaign.id, deliveries[0].tracking_url.clone());

        metrics::counter!("dispatch.jobs_submitted").increment(1);
        info!(
            campaign_id = %campaign.id,
            %job_id,
            recipients = deliveries.len(),
            platform = %campaign.platform,
            "Campaign dispatch submitted"
        );

        Ok(DispatchReceipt {
            campaign_id: campaign.id,
            job_id,
            recipient_count: deliveries.len(),
        })
    }

    /// Compose the first recipient's message without persisting a campaign,
    /// so an operator can inspect the rendered email before a real send.
    pub async fn preview(&self, request: SendRequest) -> PhishlineResult<PreviewResponse> {
        let (_, recipients) = self.resolve(&request)?;
        let platform = request
            .platform
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());
        let host = request
            .host
            .unwrap_or_else(|| self.default_host.clone());

        let first = &recipients[0];
        let tracking_url = compose_tracking_url(&host, first.id, Uuid::nil(), &platform);

        Ok(PreviewResponse {
            recipient_id: first.id,
            campaign_name: request
                .campaign_name
                .unwrap_or_else(|| DEFAULT_CAMPAIGN_NAME.to_string()),
            subject: request.subject,
            body: render_body(&request.body, &tracking_url),
            tracking_url,
        })
    }

    /// Send a fixed message through ad-hoc SMTP settings to verify them.
    pub async fn send_test_email(&self, request: TestEmailRequest) -> PhishlineResult<()> {
        for (field, value) in [
            ("email", &request.email),
            ("smtp_host", &request.smtp_host),
            ("smtp_username", &request.smtp_username),
            ("smtp_password", &request.smtp_password),
        ] {
            if value.trim().is_empty() {
                return Err(PhishlineError::Validation(format!(
                    "'{}' is required",
                    field
                )));
            }
        }

        let sender = phishline_core::types::Sender {
            id: Uuid::nil(),
            smtp_host: request.smtp_host,
            smtp_port: request.smtp_port,
            smtp_username: request.smtp_username,
            smtp_password: request.smtp_password,
        };

        let mailer = self.factory.for_sender(&sender)?;
        let email = OutgoingEmail {
            to: request.email,
            subject: "Test Email".to_string(),
            body: "This is a test email to verify SMTP settings.".to_string(),
        };

        timeout(
            Duration::from_millis(self.smtp.send_timeout_ms),
            mailer.send_email(&email),
        )
        .await
        .map_err(|_| PhishlineError::Smtp("test email timed out".to_string()))?
    }

    /// Resolve sender and group references and reject invalid input before
    /// anything is persisted.
    fn resolve(
        &self,
        request: &SendRequest,
    ) -> PhishlineResult<(phishline_core::types::Sender, Vec<Recipient>)> {
        if request.subject.trim().is_empty() {
            return Err(PhishlineError::Validation("'subject' is required".to_string()));
        }
        if request.body.trim().is_empty() {
            return Err(PhishlineError::Validation("'body' is required".to_string()));
        }

        let sender = self
            .directory
            .sender(request.sender)
            .ok_or_else(|| PhishlineError::NotFound("Sender not found".to_string()))?;

        let recipients = self
            .directory
            .resolve_group(request.recipient_group)
            .ok_or_else(|| PhishlineError::NotFound("Recipient group not found".to_string()))?;

        if recipients.is_empty() {
            return Err(PhishlineError::Validation(
                "No recipients in the group".to_string(),
            ));
        }

        Ok((sender, recipients))
    }

    fn submit_deliveries(
        &self,
        job: Arc<DispatchJob>,
        mailer: Arc<dyn Mailer>,
        subject: &str,
        body_template: &str,
        deliveries: &[RecipientDelivery],
    ) {
        let semaphore = Arc::new(Semaphore::new(self.smtp.max_in_flight));
        let send_timeout = Duration::from_millis(self.smtp.send_timeout_ms);

        let mut tasks = JoinSet::new();
        for (index, delivery) in deliveries.iter().enumerate() {
            let email = OutgoingEmail {
                to: delivery.email.clone(),
                subject: subject.to_string(),
                body: render_body(body_template, &delivery.tracking_url),
            };
            let job = job.clone();
            let mailer = mailer.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                // Cancellation granularity: deliveries that have not
                // started yet. Anything past this point goes out.
                if job.is_cancelled() {
                    job.set_delivery_state(index, DeliveryState::Cancelled);
                    return;
                }

                job.set_delivery_state(index, DeliveryState::Sending);
                let started = Instant::now();

                let state = match timeout(send_timeout, mailer.send_email(&email)).await {
                    Ok(Ok(())) => {
                        metrics::counter!("dispatch.emails_sent").increment(1);
                        DeliveryState::Sent
                    }
                    Ok(Err(e)) => {
                        warn!(to = %email.to, error = %e, "Delivery failed");
                        metrics::counter!("dispatch.emails_failed").increment(1);
                        DeliveryState::Failed {
                            reason: e.to_string(),
                        }
                    }
                    Err(_) => {
                        warn!(to = %email.to, timeout_ms = send_timeout.as_millis() as u64, "Delivery timed out");
                        metrics::counter!("dispatch.emails_failed").increment(1);
                        DeliveryState::Failed {
                            reason: format!("send timed out after {}ms", send_timeout.as_millis()),
                        }
                    }
                };

                metrics::histogram!("dispatch.send_latency_ms")
                    .record(started.elapsed().as_millis() as f64);
                job.set_delivery_state(index, state);
            });
        }

        // Supervisor: drain the task set, then seal the report.
        tokio::spawn(async move {
            while tasks.join_next().await.is_some() {}
            job.finish();
            let report = job.snapshot();
            info!(
                job_id = %report.job_id,
                campaign_id = %report.campaign_id,
                sent = report.sent(),
                failed = report.failed(),
                cancelled = report.cancelled(),
                "Dispatch job finished"
            );
        });
    }
}
