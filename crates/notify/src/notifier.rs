use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use ndaflow_core::config::NotificationConfig;
use ndaflow_core::{DocumentId, Notification, Notifier, TrackingStatistics};
use tracing::{error, info, warn};

use crate::mailer::{MailTransport, OutgoingEmail, SmtpMailer};
use crate::templates::{EmailTemplates, RenderedEmail};
use crate::NotifyError;

/// Email notifier. Enabled only when the notification address, SMTP
/// username and SMTP password are all present; every send on a disabled
/// notifier returns `false` without touching the network.
pub struct EmailNotifier {
    recipient: Option<String>,
    sender: Option<String>,
    templates: EmailTemplates,
    transport: Option<Arc<dyn MailTransport>>,
}

impl std::fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("recipient", &self.recipient)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl EmailNotifier {
    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotifyError> {
        let transport = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) if config.is_configured() => {
                Some(Arc::new(SmtpMailer::new(
                    &config.smtp_host,
                    config.smtp_port,
                    username,
                    password.clone(),
                )) as Arc<dyn MailTransport>)
            }
            _ => None,
        };
        Self::with_transport(config, transport)
    }

    /// Substitutes the delivery mechanism; enablement still follows `config`.
    pub fn with_transport(
        config: &NotificationConfig,
        transport: Option<Arc<dyn MailTransport>>,
    ) -> Result<Self, NotifyError> {
        let enabled = config.is_configured();
        if !enabled {
            warn!(
                event_name = "notify.disabled",
                "email notifications not fully configured"
            );
        }

        Ok(Self {
            recipient: config.email.clone(),
            sender: config.smtp_username.clone(),
            templates: EmailTemplates::embedded()?,
            transport: if enabled { transport } else { None },
        })
    }

    pub async fn send_email(&self, subject: &str, body: &str, to: Option<&str>) -> bool {
        let rendered =
            RenderedEmail { subject: subject.to_string(), body: body.to_string(), html: false };
        self.deliver("custom", rendered, to).await
    }

    pub async fn send_html_email(&self, subject: &str, html_body: &str, to: Option<&str>) -> bool {
        let rendered =
            RenderedEmail { subject: subject.to_string(), body: html_body.to_string(), html: true };
        self.deliver("custom_html", rendered, to).await
    }

    pub async fn notify_document_created(
        &self,
        document_id: &DocumentId,
        template_name: &str,
        recipient: &str,
    ) -> bool {
        self.notify(&Notification::DocumentCreated {
            document_id: document_id.clone(),
            template_name: template_name.to_string(),
            recipient: recipient.to_string(),
        })
        .await
    }

    pub async fn notify_document_sent(
        &self,
        document_id: &DocumentId,
        template_name: &str,
        recipient: &str,
    ) -> bool {
        self.notify(&Notification::DocumentSent {
            document_id: document_id.clone(),
            template_name: template_name.to_string(),
            recipient: recipient.to_string(),
        })
        .await
    }

    pub async fn notify_document_signed(
        &self,
        document_id: &DocumentId,
        template_name: &str,
        recipient: &str,
    ) -> bool {
        self.notify(&Notification::DocumentSigned {
            document_id: document_id.clone(),
            template_name: template_name.to_string(),
            recipient: recipient.to_string(),
        })
        .await
    }

    pub async fn notify_document_error(&self, document_id: &DocumentId, error_message: &str) -> bool {
        self.notify(&Notification::DocumentError {
            document_id: document_id.clone(),
            error_message: error_message.to_string(),
        })
        .await
    }

    pub async fn send_daily_summary(&self, statistics: &TrackingStatistics) -> bool {
        self.notify(&Notification::DailySummary { statistics: statistics.clone() }).await
    }

    async fn deliver(&self, kind: &str, rendered: RenderedEmail, to: Option<&str>) -> bool {
        let Some(transport) = self.transport.as_ref() else {
            warn!(event_name = "notify.skipped", kind = kind, "email notifications not configured");
            return false;
        };
        let (Some(sender), Some(default_recipient)) = (&self.sender, &self.recipient) else {
            return false;
        };

        let email = OutgoingEmail {
            from: sender.clone(),
            to: to.unwrap_or(default_recipient.as_str()).to_string(),
            subject: rendered.subject,
            body: rendered.body,
            html: rendered.html,
        };

        match transport.deliver(&email).await {
            Ok(()) => {
                info!(
                    event_name = "notify.sent",
                    kind = kind,
                    to = %email.to,
                    html = email.html,
                    "email sent"
                );
                true
            }
            Err(error) => {
                error!(
                    event_name = "notify.failed",
                    kind = kind,
                    to = %email.to,
                    error = %error,
                    "failed to send email"
                );
                false
            }
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    async fn notify(&self, notification: &Notification) -> bool {
        if !self.is_enabled() {
            warn!(
                event_name = "notify.skipped",
                kind = notification.kind(),
                "email notifications not configured"
            );
            return false;
        }

        match self.templates.render(notification, Local::now()) {
            Ok(rendered) => self.deliver(notification.kind(), rendered, None).await,
            Err(error) => {
                error!(
                    event_name = "notify.render_failed",
                    kind = notification.kind(),
                    error = %error,
                    "could not render notification"
                );
                false
            }
        }
    }
}
