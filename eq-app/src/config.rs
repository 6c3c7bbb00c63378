//! EquiManage configuration loader.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct EquiManageConfig {
    pub general: GeneralConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Model name; `gemini-*` routes to Gemini, anything else to OpenAI.
    pub model: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysConfig {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    #[serde(default = "default_http_max_in_flight")]
    pub http_max_in_flight: usize,
}

fn default_port() -> u16 {
    8410
}

fn default_http_timeout_seconds() -> u64 {
    90
}

fn default_http_max_in_flight() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            http_timeout_seconds: default_http_timeout_seconds(),
            http_max_in_flight: default_http_max_in_flight(),
        }
    }
}

impl EquiManageConfig {
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = path.unwrap_or_else(default_config_path);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| anyhow::anyhow!("read config {}: {e}", path.display()))?;

        let mut cfg: EquiManageConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?;

        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("EQUIMANAGE_MODEL") {
            if !v.trim().is_empty() {
                self.general.model = v;
            }
        }
        if let Ok(v) = std::env::var("GEMINI_API_KEY") {
            if !v.trim().is_empty() {
                self.keys.gemini_api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            if !v.trim().is_empty() {
                self.keys.openai_api_key = Some(v);
            }
        }
        if let Ok(v) = std::env::var("EQUIMANAGE_PORT") {
            if let Ok(port) = v.trim().parse() {
                self.server.port = port;
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.general.model.trim().is_empty() {
            return Err(anyhow::anyhow!("general.model is required"));
        }
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("server.port must be > 0"));
        }
        if self.server.http_max_in_flight == 0 {
            return Err(anyhow::anyhow!("server.http_max_in_flight must be > 0"));
        }
        Ok(())
    }

    /// Pick the API key matching the configured model's provider.
    pub fn api_key_for_model(&self) -> Option<String> {
        let model = self.general.model.to_ascii_lowercase();
        if model.starts_with("gemini-") {
            return self.keys.gemini_api_key.clone().filter(|s| !s.is_empty());
        }
        self.keys.openai_api_key.clone().filter(|s| !s.is_empty())
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".equimanage").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> EquiManageConfig {
        toml::from_str(contents).expect("parse config")
    }

    #[test]
    fn minimal_config_gets_server_defaults() {
        let cfg = parse(
            r#"
[general]
model = "gemini-2.5-flash"
"#,
        );
        assert_eq!(cfg.server.port, 8410);
        assert_eq!(cfg.server.http_timeout_seconds, 90);
        assert_eq!(cfg.server.http_max_in_flight, 64);
        assert!(cfg.keys.gemini_api_key.is_none());
    }

    #[test]
    fn api_key_follows_the_model_provider() {
        let mut cfg = parse(
            r#"
[general]
model = "gemini-2.5-flash"

[keys]
gemini_api_key = "g-key"
openai_api_key = "o-key"
"#,
        );
        assert_eq!(cfg.api_key_for_model().as_deref(), Some("g-key"));

        cfg.general.model = "gpt-4o-mini".to_string();
        assert_eq!(cfg.api_key_for_model().as_deref(), Some("o-key"));
    }

    #[test]
    fn blank_model_fails_validation() {
        let cfg = parse(
            r#"
[general]
model = "  "
"#,
        );
        assert!(cfg.validate().is_err());
    }
}
