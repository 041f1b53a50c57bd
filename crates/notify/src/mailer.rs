use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};

use crate::NotifyError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub html: bool,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), NotifyError>;
}

/// SMTP with a STARTTLS upgrade and username/password login. Every
/// delivery opens its own connection and closes it afterwards.
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: SecretString,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self { host: host.into(), port, username: username.into(), password }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let credentials =
            Credentials::new(self.username.clone(), self.password.expose_secret().to_string());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|error| NotifyError::Transport(error.to_string()))?
            .port(self.port)
            .credentials(credentials)
            .build();
        Ok(transport)
    }
}

pub fn build_message(email: &OutgoingEmail) -> Result<Message, NotifyError> {
    let from: Mailbox = email
        .from
        .parse()
        .map_err(|_| NotifyError::InvalidAddress(email.from.clone()))?;
    let to: Mailbox =
        email.to.parse().map_err(|_| NotifyError::InvalidAddress(email.to.clone()))?;
    let content_type = if email.html { ContentType::TEXT_HTML } else { ContentType::TEXT_PLAIN };

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.clone())
        .header(content_type)
        .body(email.body.clone())
        .map_err(|error| NotifyError::Message(error.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let message = build_message(email)?;
        self.transport()?
            .send(message)
            .await
            .map_err(|error| NotifyError::Transport(error.to_string()))?;
        Ok(())
    }
}
