//! Sawt Gateway - Arabic voice commands for Odoo ERP
//!
//! This library provides the core functionality for the Sawt gateway:
//! - Arabic intent classification and parameter extraction
//! - Odoo JSON-RPC dispatch with response envelopes
//! - Speech capture and synthesis capabilities
//! - Optional AI-assisted text correction and reply narration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │        CLI (run / repl)  │  Library embedding        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Sawt Gateway                        │
//! │  Listening  │  Intents  │  History  │  Spoken reply │
//! └──────┬──────────────────┬──────────────────┬────────┘
//!        │                  │                  │
//! ┌──────▼──────┐  ┌────────▼───────┐  ┌───────▼───────┐
//! │  Speech API │  │  Odoo JSON-RPC │  │  OpenAI chat  │
//! │  (STT/TTS)  │  │   (call_kw)    │  │  (optional)   │
//! └─────────────┘  └────────────────┘  └───────────────┘
//! ```

pub mod config;
pub mod enhance;
pub mod erp;
pub mod error;
pub mod gateway;
pub mod intent;
pub mod session;
pub mod speech;

pub use config::Config;
pub use enhance::{OpenAiEnhancer, TextEnhancer};
pub use erp::{ErpBackend, OdooClient, ResponseEnvelope, SalesPeriod, SessionStore};
pub use error::{Error, Result};
pub use gateway::{Gateway, GatewayPhase};
pub use intent::{CommandKind, ParsedCommand, classify};
pub use session::{Command, CommandStatus, SessionState};
pub use speech::{SpeechSynthesizer, Synthesizer, Transcriber, VoiceRecognizer};
