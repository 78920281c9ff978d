//! Campaign dispatch: personalized message composition and concurrent
//! SMTP delivery with per-recipient failure isolation.

pub mod dispatcher;
pub mod jobs;
pub mod mailer;

pub use dispatcher::{Dispatcher, PreviewResponse, SendRequest, TestEmailRequest};
pub use jobs::JobRegistry;
pub use mailer::{Mailer, MailerFactory, OutgoingEmail, SmtpMailerFactory};
