//! Host introspection: hardware architecture and OS descriptor.

use std::fs;
use std::path::Path;

use tracing::trace;

/// OS descriptor used when nothing can be detected
pub const UNKNOWN_OS: &str = "unknown";

/// Release description sources, probed in order relative to the filesystem root.
const RELEASE_SOURCES: &[ReleaseSource] = &[
    ReleaseSource::Field("etc/os-release", "PRETTY_NAME="),
    ReleaseSource::FirstLine("etc/redhat-release"),
    ReleaseSource::FirstLine("etc/system-release"),
    ReleaseSource::Field("etc/lsb-release", "DISTRIB_DESCRIPTION="),
    ReleaseSource::FirstLine("etc/issue"),
];

enum ReleaseSource {
    /// `KEY=value` line in a shell-style file
    Field(&'static str, &'static str),
    /// Whole first line of the file
    FirstLine(&'static str),
}

impl ReleaseSource {
    fn read(&self, root: &Path) -> Option<String> {
        let value = match self {
            Self::Field(file, prefix) => {
                let content = fs::read_to_string(root.join(file)).ok()?;
                content
                    .lines()
                    .find_map(|line| line.trim_start().strip_prefix(prefix))
                    .map(clean)
            }
            Self::FirstLine(file) => {
                let content = fs::read_to_string(root.join(file)).ok()?;
                content.lines().next().map(clean)
            }
        };
        value.filter(|value| !value.is_empty())
    }
}

/// Strip surrounding whitespace, newlines and quote characters
fn clean(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// CPU architecture of this build (x86_64, aarch64, ...)
#[inline]
pub fn hardware_arch() -> &'static str {
    std::env::consts::ARCH
}

/// Detect the OS descriptor from release files under `root`.
///
/// Falls back to [`UNKNOWN_OS`] when no source yields a non-empty value.
pub fn detect_operating_system_in(root: &Path) -> String {
    let detected = RELEASE_SOURCES.iter().find_map(|source| source.read(root));
    trace!(os = ?detected, "Operating system probe");
    detected.unwrap_or_else(|| UNKNOWN_OS.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn root_with(files: &[(&str, &str)]) -> TempDir {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("etc")).unwrap();
        for (name, content) in files {
            fs::write(root.path().join(name), content).unwrap();
        }
        root
    }

    #[test]
    fn test_hardware_arch_not_empty() {
        assert!(!hardware_arch().is_empty());
    }

    #[test]
    fn test_os_release_pretty_name() {
        let root = root_with(&[(
            "etc/os-release",
            "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nPRETTY_NAME=\"Ubuntu 22.04.3 LTS\"\n",
        )]);
        assert_eq!(detect_operating_system_in(root.path()), "Ubuntu 22.04.3 LTS");
    }

    #[test]
    fn test_single_quoted_value() {
        let root = root_with(&[("etc/os-release", "PRETTY_NAME='Debian GNU/Linux 12'\n")]);
        assert_eq!(detect_operating_system_in(root.path()), "Debian GNU/Linux 12");
    }

    #[test]
    fn test_redhat_release_fallback() {
        let root = root_with(&[
            ("etc/os-release", "NAME=\"Rocky Linux\"\nPRETTY_NAME=\"\"\n"),
            ("etc/redhat-release", "Rocky Linux release 9.2 (Blue Onyx)\n"),
        ]);
        assert_eq!(
            detect_operating_system_in(root.path()),
            "Rocky Linux release 9.2 (Blue Onyx)"
        );
    }

    #[test]
    fn test_lsb_release_fallback() {
        let root = root_with(&[(
            "etc/lsb-release",
            "DISTRIB_ID=Ubuntu\nDISTRIB_DESCRIPTION=\"Ubuntu 20.04.6 LTS\"\n",
        )]);
        assert_eq!(detect_operating_system_in(root.path()), "Ubuntu 20.04.6 LTS");
    }

    #[test]
    fn test_unknown_when_nothing_readable() {
        let root = TempDir::new().unwrap();
        assert_eq!(detect_operating_system_in(root.path()), UNKNOWN_OS);
    }

    #[test]
    fn test_blank_sources_are_skipped() {
        let root = root_with(&[("etc/system-release", "\n"), ("etc/issue", "  \n")]);
        assert_eq!(detect_operating_system_in(root.path()), UNKNOWN_OS);
    }
}
