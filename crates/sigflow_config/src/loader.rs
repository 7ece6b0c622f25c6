//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::KernelConfig;
use std::path::Path;

/// Name of the configuration file looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "sigflow.toml";

/// Loads and validates `<dir>/sigflow.toml`.
pub fn load_config(dir: &Path) -> Result<KernelConfig, ConfigError> {
    let content = std::fs::read_to_string(dir.join(CONFIG_FILE_NAME))?;
    load_config_from_str(&content)
}

/// Parses and validates configuration text.
pub fn load_config_from_str(content: &str) -> Result<KernelConfig, ConfigError> {
    let config: KernelConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &KernelConfig) -> Result<(), ConfigError> {
    if config.sim.max_deltas == 0 {
        return Err(ConfigError::ValidationError(
            "sim.max_deltas must be positive".to_string(),
        ));
    }
    if config.sim.time_limit == Some(0) {
        return Err(ConfigError::ValidationError(
            "sim.time_limit must be positive".to_string(),
        ));
    }
    if let Some(rule) = config.check.deny.iter().find(|r| config.check.allow.contains(r)) {
        return Err(ConfigError::ValidationError(format!(
            "rule '{rule}' is both denied and allowed"
        )));
    }
    if config.trace.path.as_deref() == Some("") {
        return Err(ConfigError::ValidationError(
            "trace.path must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TimeUnit, WidthPolicy};

    #[test]
    fn empty_file_gives_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.check.width_policy, WidthPolicy::Strict);
        assert_eq!(config.sim.max_deltas, 10_000);
        assert!(config.trace.path.is_none());
        assert!(!config.trace.compress);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[check]
width_policy = "zero-extend"
deny = "latch-inference"
allow = ["W103"]

[sim]
max_deltas = 64
time_limit = 500

[trace]
path = "out/wave.vcd"
timescale = "100ps"
compress = true
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.check.width_policy, WidthPolicy::ZeroExtend);
        assert_eq!(config.check.deny, vec!["latch-inference"]);
        assert_eq!(config.check.allow, vec!["W103"]);
        assert_eq!(config.sim.max_deltas, 64);
        assert_eq!(config.sim.time_limit, Some(500));
        assert_eq!(config.trace.path.as_deref(), Some("out/wave.vcd"));
        assert_eq!(config.trace.timescale.unit, TimeUnit::Ps);
        assert!(config.trace.compress);
    }

    #[test]
    fn unknown_width_policy_is_parse_error() {
        let err = load_config_from_str("[check]\nwidth_policy = \"sign-extend\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn bad_timescale_is_parse_error() {
        let err = load_config_from_str("[trace]\ntimescale = \"7ns\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn zero_max_deltas_rejected() {
        let err = load_config_from_str("[sim]\nmax_deltas = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn denied_and_allowed_rule_rejected() {
        let toml = "[check]\ndeny = [\"W101\"]\nallow = [\"W101\"]\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("W101"));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[sim]\nmax_deltas = 8\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.sim.max_deltas, 8);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
