//! Percona telemetry - report a product installation once per instance id.
//!
//! This crate implements the call-home protocol run from package hooks and
//! timers. Key principles:
//!
//! - **At most once**: a product family is reported once per instance id; the
//!   marker is written only after the endpoint accepts the report
//! - **Anonymous**: the host is identified by a random v4 UUID, nothing else
//! - **Best effort**: a single POST, no retries; a failed run leaves state
//!   ready for the next invocation
//! - **Opt-out**: `PERCONA_TELEMETRY_DISABLE=1` turns the whole thing off
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    Store    │────▶│   Identity   │────▶│     Gate     │
//! │ (key:value) │     │ (instanceId) │     │  (reported?) │
//! └─────────────┘     └──────────────┘     └──────────────┘
//!       ▲                                         │
//!       │ commit on success                       ▼
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Reporter   │◀────│  Transport   │◀────│   Payload    │
//! │ (sequence)  │     │ (HTTP POST)  │     │ (JSON body)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use percona_telemetry::{HttpTransport, Reporter, ReporterConfig};
//!
//! # async fn example() -> percona_telemetry::Result<()> {
//! let config = ReporterConfig {
//!     product_family: Some("PRODUCT_FAMILY_PS".to_string()),
//!     product_version: Some("8.0.33".to_string()),
//!     deployment_method: Some("PACKAGE".to_string()),
//!     ..Default::default()
//! };
//!
//! let transport = HttpTransport::new(config.send_timeout)?;
//! let outcome = Reporter::new(config).run(&transport).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod endpoint;
pub mod error;
pub mod gate;
pub mod host;
pub mod identity;
pub mod payload;
pub mod reporter;
pub mod store;
pub mod transport;

pub use endpoint::telemetry_disabled;
pub use error::{Result, TelemetryError};
pub use identity::{IdSource, Resolution};
pub use payload::{GenericReport, Metric, ReportEnvelope, ReportRequest};
pub use reporter::{Preview, ProductInfo, Reporter, ReporterConfig, RunOutcome};
pub use store::TelemetryState;
pub use transport::{HttpTransport, SendOutcome, Transport};
