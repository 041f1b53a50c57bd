use serde_json::Value;
use tracing::{info, warn};

use crate::conversation::{help_prompt, IntentExtractor};
use crate::tools::ToolRegistry;

const EXIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

/// Display identity of the conversational agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: String,
    pub description: String,
}

pub struct AgentRuntime {
    profile: AgentProfile,
    extractor: IntentExtractor,
    tools: ToolRegistry,
}

impl AgentRuntime {
    pub fn new(profile: AgentProfile, tools: ToolRegistry) -> Self {
        Self { profile, extractor: IntentExtractor::new(), tools }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn is_exit_command(text: &str) -> bool {
        let trimmed = text.trim();
        EXIT_COMMANDS.iter().any(|command| trimmed.eq_ignore_ascii_case(command))
    }

    pub fn help_text(&self) -> String {
        let mut lines = vec![format!("{} - {}", self.profile.name, self.profile.description)];
        lines.push(String::new());
        lines.push(help_prompt());
        lines.push(String::new());
        lines.push("Tools:".to_string());
        lines.extend(
            self.tools.catalog().into_iter().map(|(name, description)| {
                format!("  {name:<26} {description}")
            }),
        );
        lines.join("\n")
    }

    /// One conversational turn. Tool failures come back as text.
    pub async fn handle_message(&self, text: &str) -> String {
        let intent = self.extractor.extract(text);
        let Some(tool_name) = intent.action.tool_name() else {
            return match intent.clarification_prompt {
                Some(prompt) => format!("{prompt}\n\n{}", self.help_text()),
                None => self.help_text(),
            };
        };
        if let Some(prompt) = intent.clarification_prompt {
            return prompt;
        }

        info!(event_name = "agent.tool.dispatch", tool = tool_name, "dispatching tool");
        match self.tools.execute(tool_name, Value::Object(intent.arguments)).await {
            Ok(output) => render(tool_name, &output),
            Err(error) => {
                warn!(
                    event_name = "agent.tool.failed",
                    tool = tool_name,
                    error = %error,
                    "tool execution failed"
                );
                format!("{tool_name} failed: {error:#}")
            }
        }
    }
}

fn render(tool_name: &str, output: &Value) -> String {
    let body = serde_json::to_string_pretty(output).unwrap_or_else(|_| output.to_string());
    format!("{tool_name}:\n{body}")
}
