use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Selects the host's control surface, per spec §6's `api_mode` key.
///
/// Neither variant changes the component graph this facade wires up — both
/// drive the same `Simulator` through the same `step_until`/`run` calls —
/// it is recorded purely so a host embedding this crate (a gdb-style proxy,
/// a synchronous test harness) knows which calling convention it agreed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Sync,
    Async,
}

/// The configuration document a host supplies at `Simulator::open`.
///
/// Unknown JSON keys are ignored (no `deny_unknown_fields`) and every field
/// defaults to something runnable on its own, matching spec §6's "unknown
/// keys are ignored" — a host can hand this crate a config file written for
/// a later schema version without `load` rejecting it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub api_mode: ApiMode,
    pub proxy_socket: Option<u16>,
    pub line_size: u32,
    pub max_opcode: u8,
    pub perf_events: Vec<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            api_mode: ApiMode::Sync,
            proxy_socket: None,
            line_size: 16,
            max_opcode: 8,
            perf_events: Vec::new(),
        }
    }
}

impl Configuration {
    /// Reads and parses the JSON document at `path`. Fatal at `open()` per
    /// spec §7: a malformed or missing configuration is a host-surfaced
    /// error, not something the core can recover from on its own.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&text).map_err(ConfigError::Parse)
    }
}

/// Why `Configuration::load` failed. Plain enum with a hand-written
/// `Display`, matching the teacher's `Result<T, String>`-style error
/// handling rather than an error-derive crate.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "could not read configuration file: {err}"),
            ConfigError::Parse(err) => write!(f, "malformed configuration: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiMode, ConfigError, Configuration};

    #[test]
    fn defaults_are_runnable_on_their_own() {
        let config = Configuration::default();
        assert_eq!(config.api_mode, ApiMode::Sync);
        assert_eq!(config.line_size, 16);
        assert_eq!(config.max_opcode, 8);
        assert!(config.proxy_socket.is_none());
    }

    #[test]
    fn load_parses_a_minimal_document_and_ignores_unknown_keys() {
        let path = fixture_path("minimal");
        std::fs::write(
            &path,
            r#"{"api_mode": "async", "proxy_socket": 9999, "future_key": 1}"#,
        )
        .expect("write fixture");
        let config = Configuration::load(&path).expect("valid document");
        let _ = std::fs::remove_file(&path);
        assert_eq!(config.api_mode, ApiMode::Async);
        assert_eq!(config.proxy_socket, Some(9999));
        assert_eq!(config.line_size, 16, "unset key keeps its default");
    }

    #[test]
    fn load_reports_io_error_for_a_missing_file() {
        let missing = std::path::Path::new("/nonexistent/gvsim-config.json");
        assert!(matches!(Configuration::load(missing), Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_reports_parse_error_for_malformed_json() {
        let path = fixture_path("malformed");
        std::fs::write(&path, "{ not json").expect("write fixture");
        let result = Configuration::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    fn fixture_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("gvsim-config-test-{name}-{}", std::process::id()));
        path
    }
}
