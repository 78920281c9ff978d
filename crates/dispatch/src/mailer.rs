//! SMTP transport seam.
//!
//! One pooled transport is built per dispatch job from that job's sender
//! credentials; it is never shared across jobs. The lettre pool serializes
//! access to the underlying connections, so concurrent recipient tasks can
//! hold the same transport handle safely.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use phishline_core::config::SmtpConfig;
use phishline_core::types::Sender;
use phishline_core::{PhishlineError, PhishlineResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One personalized message ready for delivery.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    /// Rendered HTML body with the tracking link substituted in.
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, email: &OutgoingEmail) -> PhishlineResult<()>;
}

/// Builds a mailer for a sender's credentials. The indirection lets tests
/// drive the dispatcher with a scripted mailer instead of a live SMTP
/// endpoint.
pub trait MailerFactory: Send + Sync {
    fn for_sender(&self, sender: &Sender) -> PhishlineResult<Arc<dyn Mailer>>;
}

/// TLS policy derived from the sender's port. This convention is fixed;
/// it is never inferred from other signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Port 587: plain connection upgraded via STARTTLS.
    Starttls,
    /// Port 465: TLS from the first byte.
    Implicit,
    /// Any other port: no TLS.
    Plain,
}

pub fn tls_mode_for_port(port: u16) -> TlsMode {
    match port {
        587 => TlsMode::Starttls,
        465 => TlsMode::Implicit,
        _ => TlsMode::Plain,
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_email(&self, email: &OutgoingEmail) -> PhishlineResult<()> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| PhishlineError::Validation(format!("invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.body.clone())
            .map_err(|e| PhishlineError::Smtp(format!("message build failed: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| PhishlineError::Smtp(e.to_string()))?;

        debug!(to = %email.to, "Message accepted by SMTP transport");
        Ok(())
    }
}

pub struct SmtpMailerFactory {
    config: SmtpConfig,
}

impl SmtpMailerFactory {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

impl MailerFactory for SmtpMailerFactory {
    fn for_sender(&self, sender: &Sender) -> PhishlineResult<Arc<dyn Mailer>> {
        let from: Mailbox = sender.smtp_username.parse().map_err(|e| {
            PhishlineError::Validation(format!("sender username is not a mail address: {}", e))
        })?;

        let tls = match tls_mode_for_port(sender.smtp_port) {
            TlsMode::Starttls => Tls::Required(tls_parameters(&sender.smtp_host)?),
            TlsMode::Implicit => Tls::Wrapper(tls_parameters(&sender.smtp_host)?),
            TlsMode::Plain => Tls::None,
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&sender.smtp_host)
            .port(sender.smtp_port)
            .tls(tls)
            .credentials(Credentials::new(
                sender.smtp_username.clone(),
                sender.smtp_password.clone(),
            ))
            .timeout(Some(Duration::from_millis(self.config.send_timeout_ms)))
            .pool_config(PoolConfig::new().max_size(self.config.pool_size))
            .build();

        Ok(Arc::new(SmtpMailer { transport, from }))
    }
}

fn tls_parameters(host: &str) -> PhishlineResult<TlsParameters> {
    TlsParameters::new(host.to_string())
        .map_err(|e| PhishlineError::Smtp(format!("TLS setup for {} failed: {}", host, e)))
}
