//! Report payload types.
//!
//! Defines the exact structure of the JSON document posted to the collection
//! endpoint. Field names are part of the wire contract:
//!
//! ```json
//! {"reports":[{"id":"<uuid>","createTime":"2024-01-01T00:00:00Z",
//!   "instanceId":"<uuid>","product_family":"PRODUCT_FAMILY_PS",
//!   "metrics":[{"key":"pillar_version","value":"8.0.33"}, ...]}]}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TelemetryError};

pub const METRIC_PILLAR_VERSION: &str = "pillar_version";
pub const METRIC_OS: &str = "OS";
pub const METRIC_HARDWARE_ARCH: &str = "hardware_arch";
pub const METRIC_DEPLOYMENT: &str = "deployment";

/// Everything needed to build one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub product_family: String,
    pub product_version: String,
    /// Supplied or detected OS descriptor
    pub operating_system: String,
    pub deployment_method: String,
    /// Resolved instance id
    pub instance_id: String,
}

/// Envelope posted to the collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub reports: Vec<GenericReport>,
}

/// A single product report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericReport {
    /// Fresh random id for this report
    pub id: String,

    /// RFC3339 UTC, second precision, `Z` suffix
    #[serde(rename = "createTime")]
    pub create_time: String,

    #[serde(rename = "instanceId")]
    pub instance_id: String,

    pub product_family: String,

    pub metrics: Vec<Metric>,
}

/// Key/value metric pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub key: String,
    pub value: String,
}

impl Metric {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl ReportEnvelope {
    /// Build the envelope for `request` stamped with the current time
    pub fn build(request: &ReportRequest, hardware_arch: &str) -> Self {
        Self::build_at(request, hardware_arch, Utc::now())
    }

    /// Build the envelope for `request` stamped with `created`
    pub fn build_at(request: &ReportRequest, hardware_arch: &str, created: DateTime<Utc>) -> Self {
        let report = GenericReport {
            id: Uuid::new_v4().to_string(),
            create_time: created.to_rfc3339_opts(SecondsFormat::Secs, true),
            instance_id: request.instance_id.clone(),
            product_family: request.product_family.clone(),
            metrics: vec![
                Metric::new(METRIC_PILLAR_VERSION, &request.product_version),
                Metric::new(METRIC_OS, &request.operating_system),
                Metric::new(METRIC_HARDWARE_ARCH, hardware_arch),
                Metric::new(METRIC_DEPLOYMENT, &request.deployment_method),
            ],
        };

        Self {
            reports: vec![report],
        }
    }

    /// Id of the (single) report in this envelope
    pub fn report_id(&self) -> Option<&str> {
        self.reports.first().map(|report| report.id.as_str())
    }

    /// Compact JSON body as sent on the wire
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| TelemetryError::Serialization(e.to_string()))
    }

    /// Indented JSON for display
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TelemetryError::Serialization(e.to_string()))
    }
}
