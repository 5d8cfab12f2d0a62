//! Decoder configuration.
//!
//! The tolerance window and the accepted schema version are caller policy,
//! so they are configuration rather than constants. Every field has a
//! default; an empty `[decoder]` table is a valid configuration.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::domain::DecodedTask;
use crate::stream::reader::StreamLimits;
use crate::typed::StreamClass;
use crate::typed::registry::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Accepted serialVersionUID of the allowlisted type.
    #[serde(default = "default_schema_version")]
    pub schema_version: i64,

    /// Grace period for requested times in the past.
    #[serde(default)]
    pub expiry_tolerance_secs: u64,

    /// Optional bound on how far into the future a task may be requested.
    #[serde(default)]
    pub max_lead_secs: Option<u64>,

    #[serde(default = "default_max_token_bytes")]
    pub max_token_bytes: usize,

    #[serde(default = "default_max_string_bytes")]
    pub max_string_bytes: usize,

    #[serde(default = "default_max_handles")]
    pub max_handles: usize,
}

fn default_schema_version() -> i64 {
    DecodedTask::SERIAL_VERSION
}

fn default_max_token_bytes() -> usize {
    64 * 1024
}

fn default_max_string_bytes() -> usize {
    StreamLimits::default().max_string_bytes
}

fn default_max_handles() -> usize {
    StreamLimits::default().max_handles
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            expiry_tolerance_secs: 0,
            max_lead_secs: None,
            max_token_bytes: default_max_token_bytes(),
            max_string_bytes: default_max_string_bytes(),
            max_handles: default_max_handles(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("`{0}` must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("`{field}` of {secs} seconds is out of range")]
    DurationOutOfRange { field: &'static str, secs: u64 },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_token_bytes == 0 {
            return Err(ConfigError::ZeroLimit("max_token_bytes"));
        }
        if self.max_string_bytes == 0 {
            return Err(ConfigError::ZeroLimit("max_string_bytes"));
        }
        if self.max_handles == 0 {
            return Err(ConfigError::ZeroLimit("max_handles"));
        }
        self.expiry_tolerance()?;
        self.max_lead()?;
        Ok(())
    }

    pub fn limits(&self) -> StreamLimits {
        StreamLimits {
            max_string_bytes: self.max_string_bytes,
            max_handles: self.max_handles,
        }
    }

    pub fn expiry_tolerance(&self) -> Result<TimeDelta, ConfigError> {
        seconds("expiry_tolerance_secs", self.expiry_tolerance_secs)
    }

    pub fn max_lead(&self) -> Result<Option<TimeDelta>, ConfigError> {
        self.max_lead_secs
            .map(|secs| seconds("max_lead_secs", secs))
            .transpose()
    }
}

fn seconds(field: &'static str, secs: u64) -> Result<TimeDelta, ConfigError> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or(ConfigError::DurationOutOfRange { field, secs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_reasonable() {
        let c = DecoderConfig::default();
        assert_eq!(c.schema_version, 2);
        assert_eq!(c.expiry_tolerance_secs, 0);
        assert_eq!(c.max_lead_secs, None);
        assert_eq!(c.max_token_bytes, 65_536);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_json_object_gets_defaults() {
        let c: DecoderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(c, DecoderConfig::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let c: DecoderConfig =
            serde_json::from_str(r#"{ "expiry_tolerance_secs": 600, "max_lead_secs": 30 }"#)
                .unwrap();
        assert_eq!(c.expiry_tolerance().unwrap(), TimeDelta::seconds(600));
        assert_eq!(c.max_lead().unwrap(), Some(TimeDelta::seconds(30)));
        assert_eq!(c.schema_version, 2);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let c = DecoderConfig {
            max_handles: 0,
            ..DecoderConfig::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::ZeroLimit("max_handles"))));
    }

    #[test]
    fn absurd_durations_are_rejected() {
        let c = DecoderConfig {
            expiry_tolerance_secs: u64::MAX,
            ..DecoderConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::DurationOutOfRange { .. })
        ));
    }
}
