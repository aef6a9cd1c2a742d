//! TOML configuration file loading
//!
//! Supports `~/.config/omni/sawt/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SawtConfigFile {
    /// ERP backend configuration
    #[serde(default)]
    pub erp: ErpFileConfig,

    /// Speech capture and synthesis configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// ERP backend configuration
#[derive(Debug, Default, Deserialize)]
pub struct ErpFileConfig {
    /// Odoo server URL (e.g. "https://erp.example.com")
    pub server_url: Option<String>,

    /// Odoo database name
    pub database: Option<String>,

    /// Odoo login username
    pub username: Option<String>,
}

/// Speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Recognition locale (e.g. "ar-SA")
    pub locale: Option<String>,

    /// Listening window before auto-stop, in seconds
    pub listen_window_secs: Option<u64>,

    /// Spoken reply language (e.g. "ar")
    pub reply_language: Option<String>,

    /// TTS server URL for local OpenAI-compatible synthesis
    pub tts_url: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub odoo: Option<String>,
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `SawtConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> SawtConfigFile {
    let Some(path) = config_file_path() else {
        return SawtConfigFile::default();
    };

    if !path.exists() {
        return SawtConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SawtConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SawtConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/omni/sawt/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("omni")
            .join("sawt")
            .join("config.toml")
    })
}
