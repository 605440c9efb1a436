//! Configuration for the bouncer.

use std::path::Path;

use bouncer_sdk::{DEFAULT_DENY_MESSAGE, DEFAULT_DENY_STATUS, DenyDefaults};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Prefix of environment variables overriding configuration keys,
/// e.g. `BOUNCER_DENY_STATUS=404`.
pub const ENV_PREFIX: &str = "BOUNCER_";

/// Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BouncerConfig {
    /// Message of denies that carry no reason, including guest denies.
    pub deny_message: String,

    /// Status of denies that carry no status. Must be 4xx or 5xx.
    pub deny_status: u16,

    /// Profiler spans are labelled `"<prefix> <action>"`.
    pub span_label_prefix: String,
}

impl Default for BouncerConfig {
    fn default() -> Self {
        Self {
            deny_message: DEFAULT_DENY_MESSAGE.to_owned(),
            deny_status: DEFAULT_DENY_STATUS,
            span_label_prefix: "Authorizing".to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read bouncer configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("deny_status must be a 4xx or 5xx status code, got {0}")]
    InvalidDenyStatus(u16),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Figment(Box::new(e))
    }
}

impl BouncerConfig {
    /// Layered configuration: defaults, then the YAML file at `path` (if
    /// given and present), then `BOUNCER_*` environment variables.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load and validate the layered configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Figment`] if a layer cannot be parsed or has unknown keys
    /// - [`ConfigError::InvalidDenyStatus`] if `deny_status` is not an error status
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(path))
    }

    /// Extract and validate from an already assembled figment.
    ///
    /// # Errors
    ///
    /// Same as [`BouncerConfig::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// [`ConfigError::InvalidDenyStatus`] if `deny_status` is outside `400..=599`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if (400..=599).contains(&self.deny_status) {
            Ok(())
        } else {
            Err(ConfigError::InvalidDenyStatus(self.deny_status))
        }
    }

    #[must_use]
    pub fn deny_defaults(&self) -> DenyDefaults {
        DenyDefaults {
            message: self.deny_message.clone(),
            status: self.deny_status,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use super::*;

    fn yaml(content: &str) -> Figment {
        Figment::from(Serialized::defaults(BouncerConfig::default())).merge(Yaml::string(content))
    }

    #[test]
    fn defaults_match_sdk_constants() {
        let cfg = BouncerConfig::default();

        assert_eq!(cfg.deny_message, DEFAULT_DENY_MESSAGE);
        assert_eq!(cfg.deny_status, 403);
        assert_eq!(cfg.deny_defaults(), DenyDefaults::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg = BouncerConfig::from_figment(&yaml("deny_status: 404\n")).unwrap();

        assert_eq!(cfg.deny_status, 404);
        assert_eq!(cfg.deny_message, DEFAULT_DENY_MESSAGE);
        assert_eq!(cfg.span_label_prefix, "Authorizing");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = BouncerConfig::from_figment(&yaml("deny_code: 404\n")).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
    }

    #[test]
    fn non_error_status_is_rejected() {
        let err = BouncerConfig::from_figment(&yaml("deny_status: 200\n")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDenyStatus(200)));
    }

    #[test]
    fn load_reads_yaml_file_and_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "deny_message: Access denied").unwrap();
        writeln!(file, "deny_status: 401").unwrap();

        let cfg = temp_env::with_var("BOUNCER_DENY_STATUS", Some("404"), || {
            BouncerConfig::load(Some(file.path())).unwrap()
        });

        assert_eq!(cfg.deny_message, "Access denied");
        assert_eq!(cfg.deny_status, 404);
    }
}
