//! Telemetry reporter - one report per product family per instance id.
//!
//! Sequence for a single invocation:
//!
//! ```text
//! load state ─▶ resolve instance id ─▶ gate ──skip──▶ done (nothing written)
//!                                        │
//!                                      report
//!                                        ▼
//!                      build payload ─▶ probe state file ─▶ send
//!                                                            │
//!                          success: mark family, save ◀──────┤
//!                          failure: save as-is, error ◀──────┘
//! ```
//!
//! The state file is read-modify-written without locking. Two reporters running
//! at the same time can lose each other's markers; the loser simply reports
//! again on a later run.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::endpoint::{self, DEPLOYMENT_METHOD_ENV, PRODUCT_FAMILY_ENV, PRODUCT_VERSION_ENV};
use crate::error::{Result, TelemetryError};
use crate::gate;
use crate::host;
use crate::identity::{self, Resolution};
use crate::payload::{ReportEnvelope, ReportRequest};
use crate::store::{self, TelemetryState};
use crate::transport::{SendOutcome, Transport};

#[cfg(test)]
#[path = "reporter_test.rs"]
mod tests;

/// Configuration for a reporter run.
///
/// Required fields are optional here so that a missing value surfaces as a
/// [`TelemetryError::MissingField`] from [`ReporterConfig::validate`].
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Product family identifier (required)
    pub product_family: Option<String>,

    /// Product version string (required)
    pub product_version: Option<String>,

    /// OS descriptor; detected from the host when absent
    pub operating_system: Option<String>,

    /// Deployment method (required)
    pub deployment_method: Option<String>,

    /// Candidate instance id, used only when the stored one is invalid
    pub instance_id: Option<String>,

    /// Local state file
    pub config_file_path: PathBuf,

    /// Collection endpoint
    pub endpoint: String,

    /// Deadline for connecting and for each request of the send
    pub send_timeout: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            product_family: None,
            product_version: None,
            operating_system: None,
            deployment_method: None,
            instance_id: None,
            config_file_path: endpoint::default_config_file_path(),
            endpoint: endpoint::DEFAULT_TELEMETRY_URL.to_string(),
            send_timeout: endpoint::DEFAULT_SEND_TIMEOUT,
        }
    }
}

/// Validated required product attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    pub family: String,
    pub version: String,
    pub deployment_method: String,
}

impl ReporterConfig {
    /// Check required fields and the endpoint before any state is touched.
    pub fn validate(&self) -> Result<ProductInfo> {
        let family = required(&self.product_family, "product family", 'f', PRODUCT_FAMILY_ENV)?;
        let version = required(
            &self.product_version,
            "product version",
            'v',
            PRODUCT_VERSION_ENV,
        )?;
        let deployment_method = required(
            &self.deployment_method,
            "deployment method",
            'd',
            DEPLOYMENT_METHOD_ENV,
        )?;

        Url::parse(&self.endpoint).map_err(|e| {
            TelemetryError::InvalidConfig(format!("telemetry url '{}': {e}", self.endpoint))
        })?;

        Ok(ProductInfo {
            family,
            version,
            deployment_method,
        })
    }
}

fn required(
    value: &Option<String>,
    field: &'static str,
    flag: char,
    env: &'static str,
) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(TelemetryError::MissingField { field, flag, env }),
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Family already reported under the current instance id; nothing sent or written
    AlreadyReported { instance_id: String },
    /// Report accepted and the family marked in the state file
    Reported {
        instance_id: String,
        report_id: String,
    },
}

/// Report prepared without sending, for inspection.
#[derive(Debug, Clone)]
pub struct Preview {
    pub envelope: ReportEnvelope,
    /// Whether a real run would send it
    pub would_send: bool,
}

/// Runs the load, reconcile, gate, send, commit sequence.
pub struct Reporter {
    config: ReporterConfig,
    /// Filesystem root for OS detection
    host_root: PathBuf,
}

impl Reporter {
    pub fn new(config: ReporterConfig) -> Self {
        Self {
            config,
            host_root: PathBuf::from("/"),
        }
    }

    /// Detect the OS descriptor under `root` instead of `/`
    pub fn with_host_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.host_root = root.into();
        self
    }

    /// Run once against `transport`.
    ///
    /// Returns an error for configuration, storage and transport failures. On a
    /// transport failure the (possibly reset) state is still saved, without a
    /// marker for this family.
    pub async fn run<T: Transport>(&self, transport: &T) -> Result<RunOutcome> {
        let product = self.config.validate()?;
        let path = &self.config.config_file_path;

        let Resolution {
            instance_id,
            mut state,
            source,
        } = self.resolve_identity()?;
        debug!(instance_id = %instance_id, source = ?source, "Instance id resolved");

        // A reset state carries no markers, so skipping implies the stored id was kept
        if !gate::should_report(&state, &product.family) {
            info!(
                product_family = %product.family,
                instance_id = %instance_id,
                "Product already reported, skipping"
            );
            return Ok(RunOutcome::AlreadyReported { instance_id });
        }

        let envelope = self.build_envelope(&product, &instance_id);
        let report_id = envelope.report_id().unwrap_or_default().to_string();

        store::probe_writable(path)?;

        match transport.send(&self.config.endpoint, &envelope).await {
            SendOutcome::Success { status } => {
                state.mark_reported(&product.family);
                state.save(path)?;
                info!(
                    product_family = %product.family,
                    instance_id = %instance_id,
                    report_id = %report_id,
                    status,
                    "Telemetry report sent"
                );
                Ok(RunOutcome::Reported {
                    instance_id,
                    report_id,
                })
            }
            SendOutcome::Failure(error) => {
                if let Err(save_error) = state.save(path) {
                    warn!(error = %save_error, "Failed to save telemetry state after failed send");
                }
                Err(error)
            }
        }
    }

    /// Build the report a run would send, without probing, sending or saving.
    pub fn preview(&self) -> Result<Preview> {
        let product = self.config.validate()?;
        let Resolution {
            instance_id, state, ..
        } = self.resolve_identity()?;

        Ok(Preview {
            would_send: gate::should_report(&state, &product.family),
            envelope: self.build_envelope(&product, &instance_id),
        })
    }

    fn resolve_identity(&self) -> Result<Resolution> {
        let state = TelemetryState::load(&self.config.config_file_path)?;
        Ok(identity::resolve(state, self.config.instance_id.as_deref()))
    }

    fn build_envelope(&self, product: &ProductInfo, instance_id: &str) -> ReportEnvelope {
        let operating_system = self
            .config
            .operating_system
            .as_deref()
            .map(str::trim)
            .filter(|os| !os.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| host::detect_operating_system_in(&self.host_root));

        let request = ReportRequest {
            product_family: product.family.clone(),
            product_version: product.version.clone(),
            operating_system,
            deployment_method: product.deployment_method.clone(),
            instance_id: instance_id.to_string(),
        };

        ReportEnvelope::build(&request, host::hardware_arch())
    }
}
