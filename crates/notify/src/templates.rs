//! Embedded email templates, one per notification kind.

use chrono::{DateTime, Local};
use ndaflow_core::domain::tracking::TIMESTAMP_FORMAT;
use ndaflow_core::Notification;
use tera::{Context, Tera};

use crate::NotifyError;

const DOCUMENT_CREATED: &str = "document_created.txt";
const DOCUMENT_SENT: &str = "document_sent.txt";
const DOCUMENT_SIGNED: &str = "document_signed.txt";
const DOCUMENT_ERROR: &str = "document_error.txt";
// The `.html` suffix turns on tera's autoescaping for recipient-controlled text.
const DAILY_SUMMARY: &str = "daily_summary.html";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
    pub html: bool,
}

#[derive(Clone, Debug)]
pub struct EmailTemplates {
    tera: Tera,
}

impl EmailTemplates {
    pub fn embedded() -> Result<Self, NotifyError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (DOCUMENT_CREATED, include_str!("../templates/document_created.txt.tera")),
            (DOCUMENT_SENT, include_str!("../templates/document_sent.txt.tera")),
            (DOCUMENT_SIGNED, include_str!("../templates/document_signed.txt.tera")),
            (DOCUMENT_ERROR, include_str!("../templates/document_error.txt.tera")),
            (DAILY_SUMMARY, include_str!("../templates/daily_summary.html.tera")),
        ])
        .map_err(|error| NotifyError::Template(error.to_string()))?;

        Ok(Self { tera })
    }

    pub fn render(
        &self,
        notification: &Notification,
        now: DateTime<Local>,
    ) -> Result<RenderedEmail, NotifyError> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let mut context = Context::new();
        context.insert("timestamp", &timestamp);

        let (template, subject) = match notification {
            Notification::DocumentCreated { document_id, template_name, recipient } => {
                insert_document(&mut context, document_id.0.as_str(), template_name, recipient);
                (DOCUMENT_CREATED, format!("NDA Document Created: {template_name}"))
            }
            Notification::DocumentSent { document_id, template_name, recipient } => {
                insert_document(&mut context, document_id.0.as_str(), template_name, recipient);
                (DOCUMENT_SENT, format!("NDA Document Sent: {template_name}"))
            }
            Notification::DocumentSigned { document_id, template_name, recipient } => {
                insert_document(&mut context, document_id.0.as_str(), template_name, recipient);
                (DOCUMENT_SIGNED, format!("NDA Document Signed: {template_name}"))
            }
            Notification::DocumentError { document_id, error_message } => {
                context.insert("document_id", &document_id.0);
                context.insert("error_message", error_message);
                (DOCUMENT_ERROR, format!("NDA Document Error: {document_id}"))
            }
            Notification::DailySummary { statistics } => {
                let date = now.format("%Y-%m-%d").to_string();
                context.insert("date", &date);
                context.insert("stats", statistics);
                (DAILY_SUMMARY, format!("NDA Daily Summary - {date}"))
            }
        };

        let body = self
            .tera
            .render(template, &context)
            .map_err(|error| NotifyError::Template(error.to_string()))?;

        Ok(RenderedEmail {
            subject,
            body: body.trim().to_string(),
            html: notification.is_html(),
        })
    }
}

fn insert_document(context: &mut Context, document_id: &str, template_name: &str, recipient: &str) {
    context.insert("document_id", document_id);
    context.insert("template_name", template_name);
    context.insert("recipient", recipient);
}
