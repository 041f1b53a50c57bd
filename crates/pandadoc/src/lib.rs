//! PandaDoc document provider
//!
//! Thin client over the PandaDoc public REST API (`/templates`, `/documents`).
//! One HTTP request per operation, no retries; failures come back as
//! [`ndaflow_core::IntegrationError`] values for the caller to act on.
//!
//! # Key Types
//!
//! - `PandaDocClient` - implements [`ndaflow_core::DocumentProvider`]

pub mod client;

pub use client::PandaDocClient;
