//! Local telemetry state - a flat `key:value` file.
//!
//! The file holds the instance identifier under [`INSTANCE_ID_KEY`] and one
//! line per product family already reported under that identifier.
//!
//! # File Format
//!
//! ```text
//! instanceId:0b4ad0a4-5a0c-4a2f-9a40-2f8e1f7bcb5e
//! PRODUCT_FAMILY_PS:1
//! ```
//!
//! Values are written verbatim: a `:` inside a key or a newline inside a value
//! is not escaped, so both must be avoided by callers.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::error::{Result, TelemetryError};

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

/// Reserved key holding the instance identifier
pub const INSTANCE_ID_KEY: &str = "instanceId";

/// Value written for a reported product family
pub const REPORTED_MARKER: &str = "1";

/// In-memory copy of the persisted telemetry state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryState {
    entries: BTreeMap<String, String>,
}

impl TelemetryState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Load state from `path`.
    ///
    /// A missing file yields an empty state. Lines are split at the first `:`
    /// and both sides trimmed; lines whose key is empty are skipped, anything
    /// else is kept as-is.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No telemetry state file, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(TelemetryError::storage(path, e)),
        };

        let state = Self::parse(&content);
        trace!(path = %path.display(), entries = state.len(), "Loaded telemetry state");
        Ok(state)
    }

    /// Parse the text form of the state file
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in content.lines() {
            let (key, value) = line.split_once(':').unwrap_or((line, ""));
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), value.trim().to_string());
        }
        Self { entries }
    }

    /// Render the text form of the state file, one `key:value` per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Replace the file at `path` with this state.
    ///
    /// The content goes to a temporary file in the same directory which is then
    /// renamed over `path`, so readers see either the old or the new file. The
    /// replacement keeps the permission bits of the file it replaces.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| TelemetryError::storage(path, e))?;
        if let Some(permissions) = target_permissions(path) {
            temp.as_file()
                .set_permissions(permissions)
                .map_err(|e| TelemetryError::storage(path, e))?;
        }
        temp.write_all(self.render().as_bytes())
            .and_then(|()| temp.flush())
            .map_err(|e| TelemetryError::storage(path, e))?;
        temp.persist(path)
            .map_err(|e| TelemetryError::storage(path, e.error))?;

        debug!(path = %path.display(), entries = self.len(), "Saved telemetry state");
        Ok(())
    }

    /// Stored instance identifier, if any (not validated)
    pub fn instance_id(&self) -> Option<&str> {
        self.get(INSTANCE_ID_KEY)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Record that `product_family` has been reported
    pub fn mark_reported(&mut self, product_family: &str) {
        self.insert(product_family, REPORTED_MARKER);
    }

    /// Product families with a reported marker
    pub fn reported_families(&self) -> impl Iterator<Item = &str> {
        self.entries
            .keys()
            .filter(|key| key.as_str() != INSTANCE_ID_KEY)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Permissions for the file replacing `path`: the current file's, or 0644 for a new one
fn target_permissions(path: &Path) -> Option<fs::Permissions> {
    match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

/// Make sure the state file can be written before going to the network.
///
/// Creates the parent directory when missing and appends an empty line to the
/// file (creating it if needed). The empty line is skipped by [`TelemetryState::load`].
pub fn probe_writable(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| TelemetryError::storage(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TelemetryError::storage(path, e))?;
    file.write_all(b"\n")
        .map_err(|e| TelemetryError::storage(path, e))?;

    trace!(path = %path.display(), "State file is writable");
    Ok(())
}
