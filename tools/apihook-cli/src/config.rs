//! CLI configuration.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use apihook_sdk::prelude::{AuthConfig, ExecutorConfig};
use serde::{Deserialize, Serialize};

/// Names searched for a config file, in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["apihook.toml", ".apihook.toml", "apihook.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Auth store seed.
    #[serde(default)]
    pub store: AuthConfig,

    /// HTTP executor settings.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Orchestrator defaults for `apihook request`.
    #[serde(default)]
    pub hook: HookDefaults,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Problems that make the config unusable, then suspicious settings.
    pub fn check(&self) -> (Vec<String>, Vec<String>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        match self.store.base_url.as_deref() {
            None => warnings.push("store.base_url is not set; endpoints must be absolute".to_string()),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                errors.push(format!("store.base_url '{url}' must start with http:// or https://"));
            }
            Some(url) if url.ends_with('/') => {
                warnings.push("store.base_url ends with '/'; endpoints are appended as-is".to_string());
            }
            Some(_) => {}
        }

        if self.hook.authentication_required && self.store.token.is_none() {
            warnings.push("hook.authentication_required is set but store.token is empty".to_string());
        }

        if self.executor.timeout_ms == Some(0) {
            errors.push("executor.timeout_ms must be greater than 0".to_string());
        }

        for name in self.executor.default_headers.keys().chain(self.hook.headers.keys()) {
            if name.is_empty() || name.contains(char::is_whitespace) {
                errors.push(format!("header name '{name}' is invalid"));
            }
        }

        (errors, warnings)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Orchestrator defaults applied under command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDefaults {
    /// Debouncing window in milliseconds.
    #[serde(default)]
    pub debouncing_limit_ms: u64,

    /// Transition to loading before each call.
    #[serde(default = "default_true")]
    pub show_loader: bool,

    /// Attach the bearer token.
    #[serde(default)]
    pub authentication_required: bool,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for HookDefaults {
    fn default() -> Self {
        Self {
            debouncing_limit_ms: 0,
            show_loader: true,
            authentication_required: false,
            headers: BTreeMap::new(),
        }
    }
}

/// Generate a default apihook.toml config file.
pub fn generate_default_config(base_url: &str) -> String {
    format!(
        r#"# apihook configuration

[store]
base_url = "{base_url}"
# token = "..."

[executor]
timeout_ms = 30000
# user_agent = "apihook"

[executor.default_headers]
# Accept = "application/json"

[hook]
debouncing_limit_ms = 0
show_loader = true
authentication_required = false
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: CliConfig = toml::from_str(&generate_default_config("https://api.test")).unwrap();
        assert_eq!(config.store.base_url.as_deref(), Some("https://api.test"));
        assert_eq!(config.executor.timeout_ms, Some(30_000));
        assert!(config.hook.show_loader);
        let (errors, warnings) = config.check();
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert!(config.hook.show_loader);
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = std::env::temp_dir().join(format!("apihook-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("apihook.json");

        let mut config = CliConfig::default();
        config.store.token = Some("abc".into());
        config.hook.debouncing_limit_ms = 250;
        config.save(&path).unwrap();

        assert_eq!(CliConfig::load(&path).unwrap(), config);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_check_flags_bad_values() {
        let mut config = CliConfig::default();
        config.store.base_url = Some("api.test".into());
        config.executor.timeout_ms = Some(0);
        config.hook.authentication_required = true;
        config.hook.headers.insert("bad name".into(), "x".into());

        let (errors, warnings) = config.check();
        assert_eq!(errors.len(), 3);
        assert_eq!(warnings.len(), 1);
    }
}
