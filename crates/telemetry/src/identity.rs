//! Instance identifier reconciliation.
//!
//! Precedence: a valid stored id, then a valid caller-supplied candidate, then a
//! freshly generated v4 UUID. Whenever the effective id does not come from the
//! stored state, every reported marker is discarded with the old id.

use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{INSTANCE_ID_KEY, TelemetryState};

/// Length of the hyphenated 8-4-4-4-12 form
const HYPHENATED_LEN: usize = 36;

/// Where the effective instance id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    Stored,
    Candidate,
    Generated,
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub instance_id: String,
    pub state: TelemetryState,
    pub source: IdSource,
}

impl Resolution {
    /// True when the state was reset and needs persisting
    pub fn changed(&self) -> bool {
        self.source != IdSource::Stored
    }
}

/// Check for the hyphenated UUID text form, hex digits in either case.
pub fn is_valid_instance_id(id: &str) -> bool {
    id.len() == HYPHENATED_LEN && Uuid::try_parse(id).is_ok()
}

/// Generate a new random instance id
pub fn generate_instance_id() -> String {
    Uuid::new_v4().to_string()
}

/// Decide the effective instance id for `state` and an optional candidate.
pub fn resolve(state: TelemetryState, candidate: Option<&str>) -> Resolution {
    if let Some(stored) = state.instance_id().map(str::trim)
        && is_valid_instance_id(stored)
    {
        let instance_id = stored.to_string();
        debug!(instance_id = %instance_id, "Using stored instance id");
        return Resolution {
            instance_id,
            state,
            source: IdSource::Stored,
        };
    }

    let (instance_id, source) = match candidate.map(str::trim) {
        Some(id) if is_valid_instance_id(id) => (id.to_string(), IdSource::Candidate),
        _ => (generate_instance_id(), IdSource::Generated),
    };

    info!(
        instance_id = %instance_id,
        source = ?source,
        dropped_markers = state.reported_families().count(),
        "Instance id reset"
    );

    let mut state = TelemetryState::new();
    state.insert(INSTANCE_ID_KEY, instance_id.as_str());

    Resolution {
        instance_id,
        state,
        source,
    }
}
