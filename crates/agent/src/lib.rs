//! NDA workflow agent
//!
//! Composes the document provider, tracking sink and notifier into the NDA
//! workflows, and exposes them to operators through a tool registry and a
//! keyword-driven conversational runtime.
//!
//! 1. **Workflow** (`workflow`) - create/send/track sequences and read-only
//!    aggregates over the three component ports
//! 2. **Bootstrap** (`bootstrap`) - builds concrete components from `AppConfig`
//! 3. **Tools** (`tools`) - one JSON-in/JSON-out tool per operation
//! 4. **Conversation** (`conversation`) - free text to a tool call, or a
//!    clarification prompt
//! 5. **Runtime** (`runtime`) - extraction, dispatch and text rendering
//!
//! The conversational layer only routes. Every outcome comes from the
//! workflow and the external services behind it.

pub mod bootstrap;
pub mod conversation;
pub mod runtime;
pub mod tools;
pub mod workflow;

pub use bootstrap::{Application, BootstrapError};
pub use runtime::{AgentProfile, AgentRuntime};
pub use tools::ToolRegistry;
pub use workflow::NdaWorkflow;
