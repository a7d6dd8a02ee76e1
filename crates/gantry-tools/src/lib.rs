//! Schema-declared App Store Connect tool operations for Gantry
//!
//! This crate is the gateway's tool surface: a catalog of named operations
//! with JSON input schemas, thin handlers that marshal arguments into
//! `gantry-connect` calls, client-side aggregate summaries (rating
//! distributions, sales rollups, diagnostic-weight rankings), and the
//! dispatch boundary that turns every per-call failure into a textual tool
//! result.
//!
//! A tool-protocol server embeds it in two calls:
//!
//! ```ignore
//! use gantry_connect::{ConnectClient, ConnectConfig};
//! use gantry_tools::{run_tool, tool_catalog};
//!
//! let client = ConnectClient::new(ConnectConfig::from_env()?);
//!
//! // advertise tool_catalog(), then per invocation:
//! let outcome = run_tool(&client, "list_apps", args).await;
//! let wire = outcome.into_value();
//! ```

pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod summaries;

pub use catalog::{tool_by_name, tool_catalog, ToolDef};
pub use dispatch::{run_tool, ToolOutcome};
pub use error::{Result, ToolError};
pub use summaries::{DiagnosticRanking, RatingSummary, SalesRollup};
