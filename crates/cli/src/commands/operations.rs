use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use ndaflow_agent::tools::parse_fields;
use ndaflow_core::IntegrationError;
use serde_json::{json, Map, Value};

use super::{open_session, CommandResult, EXIT_FAILED, EXIT_INVALID_INPUT};

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Operation {
    #[command(about = "Check the document provider, tracking sheet and email settings")]
    Health,
    #[command(about = "NDA statistics from the tracking sheet plus recent documents")]
    Stats,
    #[command(about = "Documents still waiting for a signature")]
    Pending,
    #[command(about = "Email the daily NDA summary")]
    Summary,
    #[command(about = "List templates, or show one template's fields and roles")]
    Templates {
        #[arg(long, help = "Template id to show in detail")]
        id: Option<String>,
    },
    #[command(about = "List documents")]
    Documents {
        #[arg(long, help = "Filter by status, e.g. sent or document.completed")]
        status: Option<String>,
        #[arg(long, help = "Maximum number of documents to return")]
        limit: Option<u32>,
    },
    #[command(about = "Show a document's status")]
    Status {
        document_id: String,
        #[arg(long, help = "Include recipients and tokens")]
        details: bool,
    },
    #[command(about = "Create an NDA from a template")]
    Create {
        #[arg(long = "template")]
        template_id: String,
        #[arg(long)]
        email: String,
        #[arg(long, help = "Recipient full name")]
        name: String,
        #[arg(long)]
        company: String,
        #[arg(long = "field", value_name = "KEY=VALUE", help = "Additional template field, repeatable")]
        fields: Vec<String>,
        #[arg(long, help = "Send for signature right after creation")]
        send: bool,
        #[arg(long, requires = "send", help = "Message included in the signature email")]
        message: Option<String>,
    },
    #[command(about = "Send a document for signature")]
    Send {
        document_id: String,
        #[arg(long)]
        message: Option<String>,
    },
    #[command(about = "Download a document as PDF")]
    Download {
        document_id: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    #[command(about = "Record a manual action in the tracking sheet")]
    Log {
        action: String,
        document_id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        recipient: Option<String>,
        #[arg(long)]
        template_name: Option<String>,
        #[arg(long)]
        company: Option<String>,
    },
}

impl Operation {
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Stats => "stats",
            Self::Pending => "pending",
            Self::Summary => "summary",
            Self::Templates { .. } => "templates",
            Self::Documents { .. } => "documents",
            Self::Status { .. } => "status",
            Self::Create { .. } => "create",
            Self::Send { .. } => "send",
            Self::Download { .. } => "download",
            Self::Log { .. } => "log",
        }
    }

    /// Tool name and JSON input the operation dispatches to.
    pub fn tool_call(&self) -> Result<(&'static str, Value)> {
        let call = match self {
            Self::Health => ("health_check", json!({})),
            Self::Stats => ("get_statistics", json!({})),
            Self::Pending => ("check_pending_signatures", json!({})),
            Self::Summary => ("send_daily_summary", json!({})),
            Self::Templates { id: None } => ("list_templates", json!({})),
            Self::Templates { id: Some(id) } => ("template_details", json!({ "template_id": id })),
            Self::Documents { status, limit } => {
                let mut input = Map::new();
                if let Some(status) = status {
                    input.insert("status".to_string(), json!(status));
                }
                if let Some(limit) = limit {
                    input.insert("limit".to_string(), json!(limit));
                }
                ("list_documents", Value::Object(input))
            }
            Self::Status { document_id, details } => {
                ("document_status", json!({ "document_id": document_id, "details": details }))
            }
            Self::Create { template_id, email, name, company, fields, send, message } => {
                let additional_fields = parse_fields(fields.iter().map(String::as_str))?;
                (
                    "create_nda",
                    json!({
                        "template_id": template_id,
                        "recipient_email": email,
                        "recipient_name": name,
                        "company_name": company,
                        "additional_fields": additional_fields,
                        "send": send,
                        "message": message,
                    }),
                )
            }
            Self::Send { document_id, message } => {
                ("send_document", json!({ "document_id": document_id, "message": message }))
            }
            Self::Download { document_id, output } => {
                ("download_document", json!({ "document_id": document_id, "output": output }))
            }
            Self::Log { action, document_id, status, recipient, template_name, company } => {
                let mut details = Map::new();
                for (key, value) in [
                    ("status", status),
                    ("recipient", recipient),
                    ("template_name", template_name),
                    ("company", company),
                ] {
                    if let Some(value) = value {
                        details.insert(key.to_string(), json!(value));
                    }
                }
                (
                    "log_manual_action",
                    json!({ "action": action, "document_id": document_id, "details": details }),
                )
            }
        };
        Ok(call)
    }
}

pub fn run(operation: Operation) -> CommandResult {
    let command = operation.command_name();
    let (tool, input) = match operation.tool_call() {
        Ok(call) => call,
        Err(error) => {
            return CommandResult::failure(
                command,
                "invalid_input",
                format!("{error:#}"),
                EXIT_INVALID_INPUT,
            )
        }
    };

    let session = match open_session(command) {
        Ok(session) => session,
        Err(failure) => return failure,
    };

    let outcome =
        session.runtime.block_on(session.application.runtime.tools().execute(tool, input));
    match outcome {
        Ok(output) => interpret(command, output),
        Err(error) => {
            let (error_class, exit_code) = classify(&error);
            CommandResult::failure(command, error_class, format!("{error:#}"), exit_code)
        }
    }
}

/// Maps a tool's JSON output onto a command payload. Workflow outcomes that
/// report `success: false` and unhealthy health reports become failures.
pub fn interpret(command: &str, output: Value) -> CommandResult {
    if output.get("success").and_then(Value::as_bool) == Some(false) {
        let message = output
            .get("error")
            .or_else(|| output.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("operation failed")
            .to_string();
        return CommandResult::failure_with_data(
            command,
            "workflow_failed",
            message,
            Some(output),
            EXIT_FAILED,
        );
    }

    if let Some(overall) = output.get("overall").and_then(Value::as_str) {
        let message = format!("overall status: {overall}");
        if overall == "unhealthy" {
            return CommandResult::failure_with_data(
                command,
                "unhealthy",
                message,
                Some(output),
                EXIT_FAILED,
            );
        }
        return CommandResult::success_with_data(command, message, Some(output));
    }

    let message = output
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{command} completed"));
    CommandResult::success_with_data(command, message, Some(output))
}

/// Provider failures keep their own class; anything else is bad input.
pub fn classify(error: &anyhow::Error) -> (&'static str, u8) {
    match error.downcast_ref::<IntegrationError>() {
        Some(integration) => (integration.error_class(), EXIT_FAILED),
        None => ("invalid_input", EXIT_INVALID_INPUT),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{interpret, Operation};

    #[test]
    fn create_maps_flags_onto_tool_input() {
        let operation = Operation::Create {
            template_id: "tmpl-123".to_string(),
            email: "jane@acme.test".to_string(),
            name: "Jane Doe".to_string(),
            company: "Acme Corp".to_string(),
            fields: vec!["jurisdiction=Delaware".to_string()],
            send: true,
            message: None,
        };

        let (tool, input) = operation.tool_call().expect("valid flags");
        assert_eq!(tool, "create_nda");
        assert_eq!(input["additional_fields"]["jurisdiction"], "Delaware");
        assert_eq!(input["send"], true);
        assert!(input["message"].is_null());
    }

    #[test]
    fn templates_with_id_asks_for_details() {
        let (tool, input) = Operation::Templates { id: Some("tmpl-1".to_string()) }
            .tool_call()
            .expect("no parsing involved");
        assert_eq!(tool, "template_details");
        assert_eq!(input["template_id"], "tmpl-1");
    }

    #[test]
    fn log_only_carries_given_details() {
        let operation = Operation::Log {
            action: "signed".to_string(),
            document_id: "doc-1".to_string(),
            status: Some("completed".to_string()),
            recipient: None,
            template_name: None,
            company: None,
        };
        let (_, input) = operation.tool_call().expect("no parsing involved");
        assert_eq!(input["details"], json!({"status": "completed"}));
    }

    #[test]
    fn failed_workflow_output_becomes_a_failure() {
        let result = interpret("create", json!({"success": false, "error": "HTTP 400"}));
        assert_eq!(result.exit_code, 1);
        let payload: serde_json::Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(payload["error_class"], "workflow_failed");
        assert_eq!(payload["message"], "HTTP 400");
    }

    #[test]
    fn partial_health_is_still_ok() {
        let result = interpret("health", json!({"overall": "partially_healthy"}));
        assert_eq!(result.exit_code, 0);

        let result = interpret("health", json!({"overall": "unhealthy"}));
        assert_eq!(result.exit_code, 1);
    }
}
