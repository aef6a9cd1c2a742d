//! Odoo ERP backend
//!
//! JSON-RPC transport against `/web/dataset/call_kw` plus the domain
//! operations the voice commands map to. Every domain operation resolves
//! to a [`ResponseEnvelope`]; transport errors surface there as failure
//! envelopes with an Arabic message, never as panics.

mod client;
mod session;

pub use session::{SessionStore, StoredSession};

use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::config::ErpConfig;

/// Request timeout for RPC calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend seam the command orchestrator dispatches against
#[async_trait]
pub trait ErpBackend: Send + Sync {
    /// Authenticate against the backend
    ///
    /// Returns `Ok(false)` when credentials are incomplete and the login
    /// was skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the server rejects the login or is unreachable
    async fn login(&self) -> Result<bool>;

    /// Destroy the server session and forget the local one
    async fn logout(&self);

    /// Whether a login session is currently held
    fn is_connected(&self) -> bool;

    /// Today's confirmed sales
    async fn sales_today(&self) -> ResponseEnvelope;

    /// This month's confirmed sales
    async fn sales_this_month(&self) -> ResponseEnvelope;

    /// Unpaid customer invoices
    async fn unpaid_invoices(&self) -> ResponseEnvelope;

    /// Stockable products with less than ten units on hand
    async fn low_stock_products(&self) -> ResponseEnvelope;

    /// Best customers by sales total over the period
    async fn top_customers(&self, period: SalesPeriod) -> ResponseEnvelope;

    /// Customers whose name matches, at most ten
    async fn search_customer(&self, name: &str) -> ResponseEnvelope;

    /// Create a draft quotation for a customer
    async fn create_quote(
        &self,
        customer_id: i64,
        lines: Vec<serde_json::Value>,
    ) -> ResponseEnvelope;
}

/// Odoo JSON-RPC client
pub struct OdooClient {
    server_url: String,
    database: String,
    username: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
    request_id: AtomicU64,
    identity: Mutex<SessionIdentity>,
    store: SessionStore,
}

/// In-memory login identity
#[derive(Debug, Default, Clone)]
struct SessionIdentity {
    session_id: Option<String>,
    user_id: Option<i64>,
}

impl OdooClient {
    /// Create a new client, reloading any persisted session
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(
        config: &ErpConfig,
        api_key: Option<SecretString>,
        store: SessionStore,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let identity = store.load().map_or_else(SessionIdentity::default, |s| {
            SessionIdentity {
                session_id: Some(s.session_id),
                user_id: Some(s.user_id),
            }
        });

        Ok(Self {
            server_url: config.server_url.as_str().trim_end_matches('/').to_string(),
            database: config.database.clone(),
            username: config.username.clone(),
            api_key,
            client,
            request_id: AtomicU64::new(1),
            identity: Mutex::new(identity),
            store,
        })
    }

    /// Numeric id of the logged-in user, if any
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.identity.lock().ok().and_then(|id| id.user_id)
    }
}

/// Lookback window for top customer aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SalesPeriod {
    Day,
    Week,
    #[default]
    Month,
}

impl SalesPeriod {
    /// Parse an extracted period parameter, defaulting to month
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "day" => Self::Day,
            "week" => Self::Week,
            _ => Self::Month,
        }
    }

    /// Start of the lookback window ending at `now`
    #[must_use]
    pub fn lookback_start(
        self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> chrono::DateTime<chrono::Utc> {
        match self {
            Self::Day => now - chrono::Duration::days(1),
            Self::Week => now - chrono::Duration::days(7),
            Self::Month => now
                .checked_sub_months(chrono::Months::new(1))
                .unwrap_or(now),
        }
    }
}

/// Aggregated per-customer sales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSales {
    pub id: i64,
    pub name: String,
    pub total_sales: f64,
    pub order_count: u64,
}

/// Outcome of an ERP operation
///
/// Success and failure are structurally exclusive. The wire and history
/// form is `{"success": bool, "data"?: ..., "error"?: ...}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    /// Operation succeeded with a data payload
    Success { data: serde_json::Value },

    /// Operation failed with a user-facing message
    Failure { error: String },
}

impl ResponseEnvelope {
    /// Wrap a data payload
    #[must_use]
    pub fn success(data: serde_json::Value) -> Self {
        Self::Success { data }
    }

    /// Wrap an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Whether this is a success envelope
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Data payload of a success envelope
    #[must_use]
    pub const fn data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Error message of a failure envelope
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// Result count advertised by the payload, when present
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        self.data()?.get("count").and_then(serde_json::Value::as_u64)
    }
}

/// Wire form of the envelope
#[derive(Serialize, Deserialize)]
struct EnvelopeWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Success { data } => EnvelopeWire {
                success: true,
                data: Some(data.clone()),
                error: None,
            },
            Self::Failure { error } => EnvelopeWire {
                success: false,
                data: None,
                error: Some(error.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResponseEnvelope {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let wire = EnvelopeWire::deserialize(deserializer)?;
        Ok(if wire.success {
            Self::Success {
                data: wire.data.unwrap_or(serde_json::Value::Null),
            }
        } else {
            Self::Failure {
                error: wire.error.unwrap_or_default(),
            }
        })
    }
}
