//! Raw Odoo JSON-RPC calls
//!
//! Transport plumbing plus the [`ErpBackend`] implementation. Date ranges
//! are computed in UTC and sent in the server's naive datetime format.

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{CustomerSales, ErpBackend, OdooClient, ResponseEnvelope, SalesPeriod, StoredSession};
use crate::{Error, Result};

impl OdooClient {
    /// Low-level JSON-RPC call against `/web/dataset/call_kw`
    ///
    /// # Errors
    ///
    /// Returns error if the transport fails or the server reports an error
    pub async fn call(
        &self,
        model: &str,
        operation: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value> {
        let url = format!("{}/web/dataset/call_kw", self.server_url);
        let request = CallKwRequest {
            jsonrpc: "2.0",
            method: "call",
            params: CallKwParams {
                model,
                method: operation,
                args,
                kwargs,
            },
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: JsonRpcResponse = response.json().await?;

        if let Some(error) = body.error {
            let message = error.message.unwrap_or_default();
            tracing::warn!(model, operation, error = %message, "rpc call rejected");
            return Err(Error::Erp(message));
        }

        Ok(body.result.unwrap_or(Value::Null))
    }

    /// `search_read` returning the raw record list
    async fn search_read(&self, model: &str, domain: Value, kwargs: Value) -> Result<Vec<Value>> {
        let result = self.call(model, "search_read", json!([domain]), kwargs).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Attach API key headers when configured
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => {
                let key = key.expose_secret();
                request.bearer_auth(key).header("X-API-Key", key)
            }
            None => request,
        }
    }

    /// Confirmed sales in the half-open `[start, end)` range
    async fn sales_between(&self, start: &str, end: &str, fallback: &str) -> ResponseEnvelope {
        let domain = json!([
            ["date_order", ">=", start],
            ["date_order", "<", end],
            ["state", "not in", ["draft", "cancel"]],
        ]);
        let kwargs = json!({
            "fields": ["id", "name", "amount_total", "partner_id", "date_order"],
        });

        match self.search_read("sale.order", domain, kwargs).await {
            Ok(orders) => {
                let total_amount: f64 = orders
                    .iter()
                    .filter_map(|order| order.get("amount_total").and_then(Value::as_f64))
                    .sum();
                let count = orders.len();
                tracing::debug!(count, "fetched sales orders");
                ResponseEnvelope::success(json!({
                    "orders": orders,
                    "totalAmount": total_amount,
                    "count": count,
                }))
            }
            Err(e) => failure(&e, fallback),
        }
    }

    /// Unpaid posted customer invoices on the modern schema (Odoo 13+)
    async fn modern_unpaid_invoices(&self) -> Result<Vec<Value>> {
        let domain = json!([
            ["move_type", "=", "out_invoice"],
            ["payment_state", "in", ["not_paid", "partial"]],
            ["state", "=", "posted"],
        ]);
        let kwargs = json!({
            "fields": ["id", "name", "amount_total", "partner_id", "invoice_date", "invoice_date_due"],
        });
        self.search_read("account.move", domain, kwargs).await
    }

    /// Open customer invoices on the legacy schema
    async fn legacy_unpaid_invoices(&self) -> Result<Vec<Value>> {
        let domain = json!([
            ["state", "=", "open"],
            ["type", "=", "out_invoice"],
        ]);
        let kwargs = json!({
            "fields": ["id", "number", "amount_total", "partner_id", "date_invoice", "date_due"],
        });
        self.search_read("account.invoice", domain, kwargs).await
    }
}

#[async_trait]
impl ErpBackend for OdooClient {
    async fn login(&self) -> Result<bool> {
        if self.database.is_empty() || self.username.is_empty() {
            tracing::debug!("login skipped, credentials not configured");
            return Ok(false);
        }
        let Some(password) = self.api_key.as_ref() else {
            tracing::debug!("login skipped, no API key to use as password");
            return Ok(false);
        };

        let url = format!("{}/web/session/authenticate", self.server_url);
        let request = AuthRequest {
            jsonrpc: "2.0",
            method: "call",
            params: AuthParams {
                db: &self.database,
                login: &self.username,
                password: password.expose_secret(),
            },
            id: 1,
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let cookie = response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        let body: JsonRpcResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(Error::Auth(
                error
                    .message
                    .unwrap_or_else(|| "authentication rejected".to_string()),
            ));
        }

        let uid = body
            .result
            .as_ref()
            .and_then(|result| result.get("uid"))
            .and_then(Value::as_i64);

        match (uid, cookie) {
            (Some(user_id), Some(session_id)) => {
                let session = StoredSession {
                    session_id,
                    user_id,
                };
                self.store.save(&session);
                if let Ok(mut identity) = self.identity.lock() {
                    identity.session_id = Some(session.session_id.clone());
                    identity.user_id = Some(session.user_id);
                }
                tracing::info!(user_id, "logged in to odoo");
                Ok(true)
            }
            (Some(user_id), None) => {
                // Authenticated but no cookie surfaced; keep the uid in memory
                if let Ok(mut identity) = self.identity.lock() {
                    identity.user_id = Some(user_id);
                }
                tracing::info!(user_id, "logged in to odoo without session cookie");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn logout(&self) {
        let url = format!("{}/web/session/destroy", self.server_url);
        let result = self
            .authorized(self.client.post(&url))
            .json(&json!({}))
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "logout request failed");
        }

        if let Ok(mut identity) = self.identity.lock() {
            identity.session_id = None;
            identity.user_id = None;
        }
        self.store.clear();
        tracing::info!("logged out of odoo");
    }

    fn is_connected(&self) -> bool {
        self.identity
            .lock()
            .is_ok_and(|identity| identity.session_id.is_some() && identity.user_id.is_some())
    }

    async fn sales_today(&self) -> ResponseEnvelope {
        let today = Utc::now().date_naive();
        let tomorrow = today.checked_add_days(chrono::Days::new(1)).unwrap_or(today);
        self.sales_between(
            &today.format("%Y-%m-%d").to_string(),
            &tomorrow.format("%Y-%m-%d").to_string(),
            "خطأ في الحصول على المبيعات",
        )
        .await
    }

    async fn sales_this_month(&self) -> ResponseEnvelope {
        let today = Utc::now().date_naive();
        self.sales_between(
            &datetime_string(month_start(today)),
            &datetime_string(next_month_start(today)),
            "خطأ في الحصول على مبيعات الشهر",
        )
        .await
    }

    async fn unpaid_invoices(&self) -> ResponseEnvelope {
        // Modern schema first, then the legacy one, at most once
        let invoices = match self.modern_unpaid_invoices().await {
            Ok(invoices) => Ok(invoices),
            Err(e) => {
                tracing::debug!(error = %e, "modern invoice schema failed, trying legacy");
                self.legacy_unpaid_invoices().await
            }
        };

        match invoices {
            Ok(invoices) => {
                let count = invoices.len();
                ResponseEnvelope::success(json!({ "invoices": invoices, "count": count }))
            }
            Err(e) => failure(&e, "خطأ في الحصول على الفواتير"),
        }
    }

    async fn low_stock_products(&self) -> ResponseEnvelope {
        let domain = json!([
            ["qty_available", "<", 10],
            ["type", "=", "product"],
        ]);
        let kwargs = json!({
            "fields": ["id", "name", "qty_available", "list_price", "default_code"],
        });

        match self.search_read("product.product", domain, kwargs).await {
            Ok(products) => {
                let count = products.len();
                ResponseEnvelope::success(json!({ "products": products, "count": count }))
            }
            Err(e) => failure(&e, "خطأ في الحصول على المنتجات"),
        }
    }

    async fn top_customers(&self, period: SalesPeriod) -> ResponseEnvelope {
        let start = period.lookback_start(Utc::now());
        let domain = json!([
            ["date_order", ">=", start.format("%Y-%m-%d %H:%M:%S").to_string()],
            ["state", "not in", ["draft", "cancel"]],
        ]);
        let kwargs = json!({
            "fields": ["id", "partner_id", "amount_total", "date_order"],
        });

        match self.search_read("sale.order", domain, kwargs).await {
            Ok(orders) => {
                let customers = aggregate_customer_sales(&orders);
                let count = customers.len();
                ResponseEnvelope::success(json!({ "customers": customers, "count": count }))
            }
            Err(e) => failure(&e, "خطأ في الحصول على العملاء"),
        }
    }

    async fn search_customer(&self, name: &str) -> ResponseEnvelope {
        let domain = json!([
            ["name", "ilike", name],
            ["customer", "=", true],
        ]);
        let kwargs = json!({
            "fields": ["id", "name", "email", "phone", "city"],
            "limit": 10,
        });

        match self.search_read("res.partner", domain, kwargs).await {
            Ok(customers) => {
                let count = customers.len();
                ResponseEnvelope::success(json!({ "customers": customers, "count": count }))
            }
            Err(e) => failure(&e, "خطأ في البحث عن العميل"),
        }
    }

    async fn create_quote(&self, customer_id: i64, lines: Vec<Value>) -> ResponseEnvelope {
        let order_lines: Vec<Value> = lines.into_iter().map(|line| json!([0, 0, line])).collect();
        let args = json!([{
            "partner_id": customer_id,
            "order_line": order_lines,
            "state": "draft",
        }]);

        match self.call("sale.order", "create", args, json!({})).await {
            Ok(quote_id) => ResponseEnvelope::success(json!({
                "quoteId": quote_id,
                "message": "تم إنشاء عرض السعر بنجاح",
            })),
            Err(e) => failure(&e, "خطأ في إنشاء عرض السعر"),
        }
    }
}

/// Map an internal error to a failure envelope
///
/// Server-reported messages pass through; transport failures use the
/// operation's Arabic fallback.
fn failure(error: &Error, fallback: &str) -> ResponseEnvelope {
    tracing::warn!(error = %error, "erp operation failed");
    match error {
        Error::Erp(message) if !message.is_empty() => ResponseEnvelope::failure(message.clone()),
        _ => ResponseEnvelope::failure(fallback),
    }
}

/// Group orders per customer, largest sales total first
///
/// The sort is stable so equal totals keep first-seen order; at most
/// ten entries are returned.
fn aggregate_customer_sales(orders: &[Value]) -> Vec<CustomerSales> {
    let mut totals: Vec<CustomerSales> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for order in orders {
        let Some(partner) = order.get("partner_id") else {
            continue;
        };
        let Some(id) = partner.get(0).and_then(Value::as_i64) else {
            continue;
        };
        let amount = order.get("amount_total").and_then(Value::as_f64).unwrap_or(0.0);

        if let Some(&slot) = index.get(&id) {
            totals[slot].total_sales += amount;
            totals[slot].order_count += 1;
        } else {
            let name = partner
                .get(1)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            index.insert(id, totals.len());
            totals.push(CustomerSales {
                id,
                name,
                total_sales: amount,
                order_count: 1,
            });
        }
    }

    totals.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    totals.truncate(10);
    totals
}

/// First day of the month containing `date`
fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the following month
fn next_month_start(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(date)
}

/// Naive datetime string in the server's format
fn datetime_string(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[derive(Serialize)]
struct CallKwRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: CallKwParams<'a>,
    id: u64,
}

#[derive(Serialize)]
struct CallKwParams<'a> {
    model: &'a str,
    method: &'a str,
    args: Value,
    kwargs: Value,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: AuthParams<'a>,
    id: u64,
}

#[derive(Serialize)]
struct AuthParams<'a> {
    db: &'a str,
    login: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(partner_id: i64, partner_name: &str, amount: f64) -> Value {
        json!({
            "id": 1,
            "partner_id": [partner_id, partner_name],
            "amount_total": amount,
            "date_order": "2024-03-10 09:00:00",
        })
    }

    #[test]
    fn test_month_boundaries() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(
            next_month_start(date),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );

        // Year rollover
        let december = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(
            next_month_start(december),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_datetime_string() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(datetime_string(date), "2024-03-01 00:00:00");
    }

    #[test]
    fn test_aggregation_totals_and_order() {
        let orders = vec![
            order(1, "أحمد", 100.0),
            order(2, "سالم", 300.0),
            order(1, "أحمد", 50.0),
        ];

        let customers = aggregate_customer_sales(&orders);
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].name, "سالم");
        assert!((customers[0].total_sales - 300.0).abs() < f64::EPSILON);
        assert_eq!(customers[0].order_count, 1);
        assert_eq!(customers[1].name, "أحمد");
        assert!((customers[1].total_sales - 150.0).abs() < f64::EPSILON);
        assert_eq!(customers[1].order_count, 2);
    }

    #[test]
    fn test_aggregation_tie_keeps_first_seen() {
        let orders = vec![order(5, "أول", 200.0), order(6, "ثاني", 200.0)];

        let customers = aggregate_customer_sales(&orders);
        assert_eq!(customers[0].id, 5);
        assert_eq!(customers[1].id, 6);
    }

    #[test]
    fn test_aggregation_truncates_to_ten() {
        let orders: Vec<Value> = (1..=12i32)
            .map(|i| order(i64::from(i), &format!("عميل {i}"), f64::from(i)))
            .collect();

        let customers = aggregate_customer_sales(&orders);
        assert_eq!(customers.len(), 10);
        // Largest totals survive the cut
        assert_eq!(customers[0].id, 12);
        assert_eq!(customers[9].id, 3);
    }

    #[test]
    fn test_aggregation_skips_missing_partner() {
        let orders = vec![
            json!({ "id": 1, "partner_id": false, "amount_total": 50.0 }),
            order(1, "أحمد", 100.0),
        ];

        let customers = aggregate_customer_sales(&orders);
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].id, 1);
    }

    #[test]
    fn test_failure_prefers_server_message() {
        let error = Error::Erp("Invalid field on sale.order".to_string());
        let envelope = failure(&error, "خطأ في الحصول على المبيعات");
        assert_eq!(envelope.error(), Some("Invalid field on sale.order"));
    }

    #[test]
    fn test_failure_falls_back_on_transport_error() {
        let error = Error::Io(std::io::Error::other("connection reset"));
        let envelope = failure(&error, "خطأ في الحصول على المبيعات");
        assert_eq!(envelope.error(), Some("خطأ في الحصول على المبيعات"));

        // Empty server message also falls back
        let error = Error::Erp(String::new());
        let envelope = failure(&error, "خطأ في الحصول على الفواتير");
        assert_eq!(envelope.error(), Some("خطأ في الحصول على الفواتير"));
    }
}
