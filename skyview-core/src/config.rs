use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::ProviderId;

/// City shown when nothing else has been requested yet.
pub const FALLBACK_CITY: &str = "Lahore";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Overrides the provider's public endpoint, mostly for testing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Measurement system requested from providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitGroup {
    #[default]
    Metric,
    Us,
}

impl UnitGroup {
    /// Value of Visual Crossing's `unitGroup` parameter.
    pub fn visual_crossing(&self) -> &'static str {
        match self {
            UnitGroup::Metric => "metric",
            UnitGroup::Us => "us",
        }
    }

    /// Value of OpenWeather's `units` parameter.
    pub fn openweather(&self) -> &'static str {
        match self {
            UnitGroup::Metric => "metric",
            UnitGroup::Us => "imperial",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitGroup::Metric => "°C",
            UnitGroup::Us => "°F",
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "visualcrossing" or "openweather".
    pub default_provider: Option<String>,

    #[serde(default)]
    pub units: UnitGroup,

    /// City used on startup and when refreshing with nothing displayed.
    pub default_city: Option<String>,

    /// Per-request timeout; falls back to [`DEFAULT_TIMEOUT_SECS`].
    pub timeout_secs: Option<u64>,

    /// Example TOML:
    /// [providers.visualcrossing]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `skyview configure <provider>` (e.g. `skyview configure visualcrossing`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    pub fn default_city(&self) -> &str {
        self.default_city.as_deref().unwrap_or(FALLBACK_CITY)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skyview", "skyview")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        let base_url = self
            .providers
            .remove(provider_id.as_str())
            .and_then(|existing| existing.base_url);

        self.providers.insert(
            provider_id.as_str().to_string(),
            ProviderConfig { api_key, base_url },
        );

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present in the file.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).map(|cfg| cfg.api_key.as_str())
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.base_url.as_deref())
    }

    /// API key from the environment (see [`api_key_env_var`]) or the config file.
    pub fn resolve_api_key(&self, provider_id: ProviderId) -> Option<String> {
        self.resolve_api_key_with(provider_id, |name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with<F>(&self, provider_id: ProviderId, env: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        env(&api_key_env_var(provider_id))
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.provider_api_key(provider_id).map(str::to_owned))
    }
}

/// Environment variable that overrides a provider's configured key,
/// e.g. `SKYVIEW_VISUALCROSSING_API_KEY`.
pub fn api_key_env_var(provider_id: ProviderId) -> String {
    format!("SKYVIEW_{}_API_KEY", provider_id.as_str().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_provider_id().unwrap_err();

        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::VisualCrossing, "VC_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::VisualCrossing);

        let key = cfg.provider_api_key(ProviderId::VisualCrossing);
        assert_eq!(key, Some("VC_KEY"));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::VisualCrossing, "VC_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OW_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");

        assert_eq!(default, ProviderId::VisualCrossing);
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("OW_KEY"));
    }

    #[test]
    fn set_default_provider_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::VisualCrossing, "VC_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OW_KEY".into());

        cfg.set_default_provider(ProviderId::OpenWeather);

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);
    }

    #[test]
    fn upsert_keeps_base_url_override() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "visualcrossing".into(),
            ProviderConfig {
                api_key: "OLD".into(),
                base_url: Some("http://localhost:9000".into()),
            },
        );

        cfg.upsert_provider_api_key(ProviderId::VisualCrossing, "NEW".into());

        assert_eq!(cfg.provider_api_key(ProviderId::VisualCrossing), Some("NEW"));
        assert_eq!(
            cfg.provider_base_url(ProviderId::VisualCrossing),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn environment_key_takes_precedence() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::VisualCrossing, "FILE_KEY".into());

        let from_env = cfg.resolve_api_key_with(ProviderId::VisualCrossing, |name| {
            (name == "SKYVIEW_VISUALCROSSING_API_KEY").then(|| "ENV_KEY".to_string())
        });
        assert_eq!(from_env.as_deref(), Some("ENV_KEY"));

        let blank_env = cfg.resolve_api_key_with(ProviderId::VisualCrossing, |_| Some("  ".into()));
        assert_eq!(blank_env.as_deref(), Some("FILE_KEY"));

        let none = cfg.resolve_api_key_with(ProviderId::OpenWeather, |_| None);
        assert_eq!(none, None);
    }

    #[test]
    fn defaults_for_city_units_and_timeout() {
        let cfg = Config::default();
        assert_eq!(cfg.default_city(), FALLBACK_CITY);
        assert_eq!(cfg.units, UnitGroup::Metric);
        assert_eq!(cfg.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OW_KEY".into());
        cfg.units = UnitGroup::Us;
        cfg.default_city = Some("Karachi".into());
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.default_provider_id().expect("default"), ProviderId::OpenWeather);
        assert_eq!(loaded.provider_api_key(ProviderId::OpenWeather), Some("OW_KEY"));
        assert_eq!(loaded.units, UnitGroup::Us);
        assert_eq!(loaded.default_city(), "Karachi");
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert!(cfg.default_provider.is_none());
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "units = [").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
