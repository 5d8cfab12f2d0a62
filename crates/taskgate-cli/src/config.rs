//! CLI configuration file.
//!
//! ```toml
//! [decoder]
//! schema_version = 2
//! expiry_tolerance_secs = 0
//! max_lead_secs = 3600
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use taskgate_core::DecoderConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub decoder: DecoderConfig,
}

impl CliConfig {
    /// Reads `path`, or falls back to defaults when no file was given.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.decoder.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(CliConfig::parse("").unwrap(), CliConfig::default());
    }

    #[test]
    fn decoder_section_overrides_defaults() {
        let config = CliConfig::parse(
            r#"
            [decoder]
            schema_version = 1
            max_lead_secs = 3600
            "#,
        )
        .unwrap();

        assert_eq!(config.decoder.schema_version, 1);
        assert_eq!(config.decoder.max_lead_secs, Some(3600));
        assert_eq!(config.decoder.expiry_tolerance_secs, 0);
        assert_eq!(config.decoder.max_handles, DecoderConfig::default().max_handles);
    }

    #[test]
    fn zero_limit_fails_validation() {
        let err = CliConfig::parse("[decoder]\nmax_token_bytes = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_token_bytes"));
    }

    #[test]
    fn wrong_types_fail_to_parse() {
        assert!(CliConfig::parse("[decoder]\nschema_version = \"two\"\n").is_err());
    }

    #[tokio::test]
    async fn missing_path_means_defaults() {
        assert_eq!(CliConfig::load(None).await.unwrap(), CliConfig::default());
    }

    #[tokio::test]
    async fn unreadable_file_names_the_path() {
        let err = CliConfig::load(Some(Path::new("/nonexistent/taskgate.toml")))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/taskgate.toml"));
    }
}
