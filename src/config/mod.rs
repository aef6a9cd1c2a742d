//! Configuration management for the Sawt gateway

pub mod file;

use std::path::PathBuf;

use secrecy::SecretString;

use crate::{Error, Result};

/// Sawt gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// ERP backend configuration
    pub erp: ErpConfig,

    /// Speech capture and synthesis configuration
    pub speech: SpeechConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Path to data directory (session store, etc)
    pub data_dir: PathBuf,
}

/// ERP backend configuration
#[derive(Debug, Clone)]
pub struct ErpConfig {
    /// Odoo server base URL
    pub server_url: url::Url,

    /// Odoo database name
    pub database: String,

    /// Odoo login username
    pub username: String,
}

/// Speech processing configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Recognition locale (e.g. "ar-SA")
    pub locale: String,

    /// Listening window before auto-stop, in seconds
    pub listen_window_secs: u64,

    /// Spoken reply language (e.g. "ar")
    pub reply_language: String,

    /// Local OpenAI-compatible TTS server URL, if any
    pub tts_url: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Odoo API key (sent as bearer token on RPC calls, doubles as the
    /// login password)
    pub odoo: Option<SecretString>,

    /// `OpenAI` API key (text correction, narration, TTS)
    pub openai: Option<SecretString>,
}

impl Config {
    /// Load configuration with precedence env > TOML file > default
    ///
    /// # Errors
    ///
    /// Returns error if `ODOO_SERVER_URL` is missing or not a valid URL
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        // ERP config (env > toml; server URL is mandatory)
        let server_url = std::env::var("ODOO_SERVER_URL")
            .ok()
            .or(fc.erp.server_url)
            .ok_or_else(|| {
                Error::Config(
                    "ODOO_SERVER_URL is not set (env var or [erp].server_url in config.toml)"
                        .to_string(),
                )
            })?;
        let server_url: url::Url = server_url
            .parse()
            .map_err(|e| Error::Config(format!("invalid ODOO_SERVER_URL: {e}")))?;

        let erp = ErpConfig {
            server_url,
            database: std::env::var("ODOO_DATABASE")
                .ok()
                .or(fc.erp.database)
                .unwrap_or_default(),
            username: std::env::var("ODOO_USERNAME")
                .ok()
                .or(fc.erp.username)
                .unwrap_or_default(),
        };

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            odoo: std::env::var("ODOO_API_KEY")
                .ok()
                .or(fc.api_keys.odoo)
                .map(|k| SecretString::new(k.into())),
            openai: std::env::var("OPENAI_API_KEY")
                .ok()
                .or(fc.api_keys.openai)
                .map(|k| SecretString::new(k.into())),
        };

        // Speech config (env > toml > default)
        let speech = SpeechConfig {
            locale: std::env::var("SAWT_LOCALE")
                .ok()
                .or(fc.speech.locale)
                .unwrap_or_else(|| "ar-SA".to_string()),
            listen_window_secs: std::env::var("SAWT_LISTEN_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.speech.listen_window_secs)
                .unwrap_or(5),
            reply_language: std::env::var("SAWT_REPLY_LANGUAGE")
                .ok()
                .or(fc.speech.reply_language)
                .unwrap_or_else(|| "ar".to_string()),
            tts_url: std::env::var("SAWT_TTS_URL").ok().or(fc.speech.tts_url),
            tts_model: std::env::var("SAWT_TTS_MODEL")
                .ok()
                .or(fc.speech.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: std::env::var("SAWT_TTS_VOICE")
                .ok()
                .or(fc.speech.tts_voice)
                .unwrap_or_else(|| "alloy".to_string()),
        };

        // Data directory (~/.local/share/omni/sawt on Linux)
        let data_dir = directories::BaseDirs::new()
            .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("omni").join("sawt"));

        // Ensure data dir exists
        std::fs::create_dir_all(&data_dir).ok();

        Ok(Self {
            erp,
            speech,
            api_keys,
            data_dir,
        })
    }
}
