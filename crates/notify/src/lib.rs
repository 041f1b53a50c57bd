//! Email notifications for NDA lifecycle events
//!
//! - **Templates** (`templates`) - embedded tera templates, plain text per
//!   document event and an HTML daily digest
//! - **Mailer** (`mailer`) - [`MailTransport`] and the lettre-backed SMTP
//!   implementation
//! - **Notifier** (`notifier`) - [`ndaflow_core::Notifier`] over the two

pub mod mailer;
pub mod notifier;
pub mod templates;

pub use mailer::{MailTransport, OutgoingEmail, SmtpMailer};
pub use notifier::EmailNotifier;
pub use templates::{EmailTemplates, RenderedEmail};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("template error: {0}")]
    Template(String),
    #[error("invalid email address `{0}`")]
    InvalidAddress(String),
    #[error("could not build message: {0}")]
    Message(String),
    #[error("smtp delivery failed: {0}")]
    Transport(String),
}
