//! TOML configuration with environment overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ArbolitoError;

/// Top-level Arbolito configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub arbolito: AppConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub welcome: WelcomeConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

/// WhatsApp client configuration.
///
/// Session data is stored at `{data_dir}/whatsapp.db`. Pairing is done by
/// scanning a QR code (like WhatsApp Web).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Display name announced to paired phones.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// Seconds to wait for a server ack before giving up.
    #[serde(default = "default_ack_timeout")]
    pub ack_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            ack_timeout_secs: default_ack_timeout(),
        }
    }
}

/// OpenAI provider configuration. The api_key may also come from the
/// `OPENAI_API_KEY` environment variable, which takes precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// System prompt establishing the reply persona.
    #[serde(default = "default_persona")]
    pub persona: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            persona: default_persona(),
        }
    }
}

/// Welcome delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeConfig {
    /// Caption sent with the welcome video (or alone when media fails).
    #[serde(default = "default_welcome_text")]
    pub text: String,
    /// Path to the welcome video. `None` means text-only welcomes; a
    /// configured path that is missing at send time degrades to text.
    #[serde(default)]
    pub video_path: Option<String>,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            text: default_welcome_text(),
            video_path: None,
        }
    }
}

fn default_name() -> String {
    "arbolito".to_string()
}

fn default_data_dir() -> String {
    "~/.arbolito".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    3000
}

fn default_device_name() -> String {
    "Arbolito".to_string()
}

fn default_ack_timeout() -> u64 {
    30
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_temperature() -> f32 {
    0.7
}

fn default_persona() -> String {
    "Eres el espíritu del Árbol Encantado. Tu misión es desear Feliz Navidad \
     y traer magia a quienes te hablan. Responde de forma amable, mágica y \
     concisa (máximo 2 frases). Si te preguntan quién eres, di que eres el \
     guardián de la Navidad."
        .to_string()
}

fn default_welcome_text() -> String {
    "¡Hola! Aquí tienes tu video del Árbol Encantado. ¡Feliz Navidad!".to_string()
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. The `OPENAI_API_KEY`
/// environment variable overrides the configured key in either case.
pub fn load(path: &str) -> Result<Config, ArbolitoError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArbolitoError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ArbolitoError::Config(format!("failed to parse config: {}", e)))?
    } else {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        Config::default()
    };

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            config.openai.api_key = key;
        }
    }

    Ok(config)
}
