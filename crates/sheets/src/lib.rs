//! Google Sheets tracking sink
//!
//! Appends NDA action rows to a spreadsheet tab and folds the tab back into
//! statistics.
//!
//! - **Auth** (`auth`) - service-account JWT exchanged for a bearer token
//! - **Client** (`client`) - `values.get`, `values.append`, `batchUpdate` calls
//! - **Sink** (`sink`) - [`ndaflow_core::TrackingSink`] over the client

pub mod auth;
pub mod client;
pub mod sink;

pub use auth::{AccessTokenSource, ServiceAccountAuth, ServiceAccountKey, StaticToken};
pub use client::SheetsClient;
pub use sink::SheetsTrackingSink;
