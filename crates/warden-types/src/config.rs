//! Configuration types for the warden engine.
//!
//! [`WardenConfig`] is the top-level configuration loaded from `warden.toml`,
//! controlling the supervisor model, fail-open policy, and the per-policy
//! blocks for the watchdog, gatekeeper, and sanitizer.
//!
//! Every numeric option is clamped to its documented range when a config is
//! loaded; policy code can rely on in-range values without re-checking.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::WardenError;

// ---- Option ranges ----

/// Allowed range for the per-attempt supervisor call timeout (ms).
const TIMEOUT_MS_RANGE: (u64, u64) = (1_000, 30_000);
/// Allowed range for the watchdog check interval (chars of streamed output).
const CHECK_INTERVAL_CHARS_RANGE: (u64, u64) = (100, 5_000);
/// Allowed range for the watchdog buffer cap (chars).
const MAX_BUFFER_CHARS_RANGE: (u64, u64) = (500, 10_000);
/// Allowed range for the sanitizer output cap (chars).
const MAX_OUTPUT_CHARS_RANGE: (u64, u64) = (1_000, 50_000);

/// Top-level configuration for a warden instance.
///
/// Loaded from `warden.toml`. The default configuration is fail-closed with
/// all three policies enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// When the supervisor is unreachable: `true` allows the action with a
    /// warning, `false` blocks or aborts.
    pub fail_open: bool,
    /// Per-attempt timeout for supervisor calls, in milliseconds.
    pub timeout_ms: u64,
    /// Model identifier used for all supervisor sessions.
    pub model: String,
    /// Streamed-output monitoring.
    pub watchdog: WatchdogConfig,
    /// Tool-invocation gating.
    pub gatekeeper: GatekeeperConfig,
    /// Tool-output post-processing.
    pub sanitizer: SanitizerConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            fail_open: false,
            timeout_ms: 10_000,
            model: "claude-3-5-haiku".to_string(),
            watchdog: WatchdogConfig::default(),
            gatekeeper: GatekeeperConfig::default(),
            sanitizer: SanitizerConfig::default(),
        }
    }
}

/// Configuration for the stream watchdog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub enabled: bool,
    /// A supervisor check fires every time this many new chars accumulate.
    pub check_interval_chars: u64,
    /// Oldest buffered fragments are evicted once the buffer exceeds this.
    pub max_buffer_chars: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_chars: 1_000,
            max_buffer_chars: 5_000,
        }
    }
}

/// Configuration for the action gatekeeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    pub enabled: bool,
    /// Tools blocked unconditionally, matched case-insensitively.
    pub blocked_tools: Vec<String>,
    /// Tools allowed without a supervisor call, matched case-insensitively.
    pub always_allow_tools: Vec<String>,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blocked_tools: Vec::new(),
            always_allow_tools: Vec::new(),
        }
    }
}

/// Configuration for the result sanitizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    pub enabled: bool,
    /// Outputs longer than this are cut and marked truncated.
    pub max_output_chars: u64,
    /// Apply the built-in secret patterns to tool output.
    pub redact_secrets: bool,
    /// Send long, locally-clean output to the supervisor for review.
    pub deep_analysis: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_output_chars: 30_000,
            redact_secrets: true,
            deep_analysis: false,
        }
    }
}

impl WardenConfig {
    /// Parse a configuration from a TOML string, clamping numeric options.
    pub fn from_toml_str(content: &str) -> Result<Self, WardenError> {
        let config: Self =
            toml::from_str(content).map_err(|e| WardenError::Config(e.to_string()))?;
        Ok(config.clamped())
    }

    /// Load a configuration from a TOML file, clamping numeric options.
    pub fn load(path: &Path) -> Result<Self, WardenError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WardenError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, WardenError> {
        toml::to_string_pretty(self).map_err(|e| WardenError::Config(e.to_string()))
    }

    /// Clamp every numeric option to its documented range, logging a warning
    /// for each adjusted value.
    pub fn clamped(mut self) -> Self {
        self.timeout_ms = clamp_option("timeout_ms", self.timeout_ms, TIMEOUT_MS_RANGE);
        self.watchdog.check_interval_chars = clamp_option(
            "watchdog.check_interval_chars",
            self.watchdog.check_interval_chars,
            CHECK_INTERVAL_CHARS_RANGE,
        );
        self.watchdog.max_buffer_chars = clamp_option(
            "watchdog.max_buffer_chars",
            self.watchdog.max_buffer_chars,
            MAX_BUFFER_CHARS_RANGE,
        );
        self.sanitizer.max_output_chars = clamp_option(
            "sanitizer.max_output_chars",
            self.sanitizer.max_output_chars,
            MAX_OUTPUT_CHARS_RANGE,
        );
        self
    }
}

fn clamp_option(name: &str, value: u64, (min, max): (u64, u64)) -> u64 {
    if value < min {
        tracing::warn!(option = name, value, min, "config value below range, clamping");
        min
    } else if value > max {
        tracing::warn!(option = name, value, max, "config value above range, clamping");
        max
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_fail_closed_and_in_range() {
        let config = WardenConfig::default();
        assert!(!config.fail_open);
        assert!(config.watchdog.enabled);
        assert!(config.gatekeeper.enabled);
        assert!(config.sanitizer.enabled);

        // Defaults must survive clamping unchanged.
        let clamped = config.clone().clamped();
        assert_eq!(clamped.timeout_ms, config.timeout_ms);
        assert_eq!(
            clamped.watchdog.check_interval_chars,
            config.watchdog.check_interval_chars
        );
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = WardenConfig {
            fail_open: true,
            model: "test-model".into(),
            gatekeeper: GatekeeperConfig {
                blocked_tools: vec!["rm".into()],
                ..Default::default()
            },
            ..Default::default()
        };

        let toml_str = config.to_toml().unwrap();
        let parsed = WardenConfig::from_toml_str(&toml_str).unwrap();
        assert!(parsed.fail_open);
        assert_eq!(parsed.model, "test-model");
        assert_eq!(parsed.gatekeeper.blocked_tools, vec!["rm".to_string()]);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed = WardenConfig::from_toml_str(
            r#"
            fail_open = true

            [watchdog]
            check_interval_chars = 200
            "#,
        )
        .unwrap();
        assert!(parsed.fail_open);
        assert_eq!(parsed.watchdog.check_interval_chars, 200);
        assert_eq!(parsed.watchdog.max_buffer_chars, 5_000);
        assert!(parsed.sanitizer.redact_secrets);
    }

    #[test]
    fn out_of_range_values_are_clamped_at_load() {
        let parsed = WardenConfig::from_toml_str(
            r#"
            timeout_ms = 50

            [watchdog]
            check_interval_chars = 999999

            [sanitizer]
            max_output_chars = 10
            "#,
        )
        .unwrap();
        assert_eq!(parsed.timeout_ms, 1_000);
        assert_eq!(parsed.watchdog.check_interval_chars, 5_000);
        assert_eq!(parsed.sanitizer.max_output_chars, 1_000);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = WardenConfig::from_toml_str("fail_open = [").unwrap_err();
        assert!(matches!(err, WardenError::Config(_)));
    }

    #[test]
    fn load_reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model = \"from-file\"").unwrap();
        let config = WardenConfig::load(file.path()).unwrap();
        assert_eq!(config.model, "from-file");
    }

    #[test]
    fn load_missing_file_is_a_config_error() {
        let err = WardenConfig::load(Path::new("/nonexistent/warden.toml")).unwrap_err();
        assert!(matches!(err, WardenError::Config(_)));
    }
}
