//! App Store Connect API core for Gantry
//!
//! This crate is the engine under the Gantry tool surface: short-lived
//! ES256-signed tokens with an expiry-aware cache, a uniform JSON:API
//! request layer, gzip report downloads, and a best-effort pagination
//! walker. Tool handlers in `gantry-tools` stay thin by leaning on it.
//!
//! ## Usage
//!
//! ```ignore
//! use gantry_connect::{ConnectClient, ConnectConfig, ResourceEnvelope};
//!
//! let config = ConnectConfig::from_env()?;
//! let client = ConnectClient::new(config);
//!
//! let apps: ResourceEnvelope = client
//!     .get("/apps", &[("limit".into(), "50".into())])
//!     .await?;
//! ```
//!
//! The network and the clock are both injectable seams ([`Transport`],
//! [`auth::Clock`]), so everything here is unit-testable without I/O.

pub mod auth;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod paginate;
pub mod reports;
pub mod transport;

#[cfg(test)]
mod testing;

pub use auth::TokenIssuer;
pub use client::{ConnectClient, API_BASE_URL};
pub use config::ConnectConfig;
pub use envelope::{ErrorEnvelope, PagingMeta, ResourceEnvelope, ResourceLinks};
pub use error::{ConnectError, Result};
pub use paginate::PageWalk;
pub use reports::{FinanceReportFilter, SalesReportFilter, SegmentAuthPolicy};
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
