//! Arabic command classification
//!
//! Ordered substring matching over normalized text, first match wins.
//! Each pattern carries a static confidence; parameters are pulled out
//! with per-kind regexes afterwards.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Customer name after "للعميل" (create quote)
static QUOTE_CUSTOMER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"للعميل\s+(\w+)").expect("valid regex"));

/// Customer name after "العميل", or a Latin name before it. The prefix
/// form must stay ASCII: phrase words like "معلومات" sit in the same
/// position and must not be taken for names.
static CUSTOMER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"العميل\s+(\w+)|([0-9A-Za-z_]+)\s+العميل").expect("valid regex")
});

/// Invoice number after "فاتورة" or "رقم"
static INVOICE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"فاتورة\s+(\d+)|رقم\s+(\d+)").expect("valid regex"));

/// Product name after "المنتج" or "منتج"
static PRODUCT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"المنتج\s+(.+?)(?:\s+|$)|منتج\s+(.+?)(?:\s+|$)").expect("valid regex")
});

/// Supported command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    SalesToday,
    SalesThisMonth,
    TopCustomers,
    UnpaidInvoices,
    LowStock,
    CreateQuote,
    CustomerInfo,
    InvoiceDetails,
    ProductInfo,
    Unknown,
}

impl CommandKind {
    /// Wire name in snake_case (matches the serialized form)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SalesToday => "sales_today",
            Self::SalesThisMonth => "sales_this_month",
            Self::TopCustomers => "top_customers",
            Self::UnpaidInvoices => "unpaid_invoices",
            Self::LowStock => "low_stock",
            Self::CreateQuote => "create_quote",
            Self::CustomerInfo => "customer_info",
            Self::InvoiceDetails => "invoice_details",
            Self::ProductInfo => "product_info",
            Self::Unknown => "unknown",
        }
    }

    /// Arabic description of the command
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SalesToday => "عرض مبيعات اليوم",
            Self::SalesThisMonth => "عرض مبيعات هذا الشهر",
            Self::TopCustomers => "عرض أعلى العملاء",
            Self::UnpaidInvoices => "عرض الفواتير غير المدفوعة",
            Self::LowStock => "عرض المنتجات منخفضة المخزون",
            Self::CreateQuote => "إنشاء عرض سعر جديد",
            Self::CustomerInfo => "عرض معلومات العميل",
            Self::InvoiceDetails => "عرض تفاصيل الفاتورة",
            Self::ProductInfo => "عرض معلومات المنتج",
            Self::Unknown => "أمر غير مفهوم",
        }
    }

    /// Arabic error message when processing a command of this kind fails
    #[must_use]
    pub const fn fallback_error_message(self) -> &'static str {
        match self {
            Self::Unknown => "لم أفهم الأمر. يرجى المحاولة مرة أخرى بصيغة مختلفة.",
            _ => "حدث خطأ في معالجة الأمر.",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a piece of recognized text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCommand {
    /// Detected command kind, "type" in the wire and history form
    #[serde(rename = "type")]
    pub kind: CommandKind,

    /// Static confidence of the matched pattern, 0.0 to 1.0
    pub confidence: f64,

    /// Parameters extracted from the text
    #[serde(default)]
    pub parameters: HashMap<String, String>,

    /// The input as given, before normalization
    pub original_text: String,
}

/// Ordered keyword patterns; order is priority, first match wins
const PATTERNS: &[(CommandKind, &[&str], f64)] = &[
    (
        CommandKind::SalesToday,
        &[
            "مبيعات اليوم",
            "المبيعات اليوم",
            "كم مبيعات اليوم",
            "إجمالي المبيعات اليوم",
        ],
        0.95,
    ),
    (
        CommandKind::SalesThisMonth,
        &[
            "مبيعات هذا الشهر",
            "مبيعات الشهر",
            "المبيعات هذا الشهر",
            "كم مبيعات الشهر",
        ],
        0.95,
    ),
    (
        CommandKind::TopCustomers,
        &[
            "أعلى العملاء",
            "أفضل العملاء",
            "أكبر العملاء",
            "أعلى العملاء هذا الشهر",
        ],
        0.9,
    ),
    (
        CommandKind::UnpaidInvoices,
        &[
            "الفواتير غير المدفوعة",
            "الفواتير المعلقة",
            "الفواتير المتأخرة",
            "الفواتير غير المسددة",
        ],
        0.95,
    ),
    (
        CommandKind::LowStock,
        &[
            "المخزون المنخفض",
            "المنتجات منخفضة المخزون",
            "المخزون قليل",
            "المنتجات الناقصة",
        ],
        0.95,
    ),
    (
        CommandKind::CreateQuote,
        &[
            "أنشئ عرض سعر",
            "إنشاء عرض سعر",
            "عرض سعر جديد",
            "أضف عرض سعر",
        ],
        0.9,
    ),
    (
        CommandKind::CustomerInfo,
        &[
            "معلومات العميل",
            "بيانات العميل",
            "عن العميل",
            "تفاصيل العميل",
        ],
        0.85,
    ),
    (
        CommandKind::InvoiceDetails,
        &["تفاصيل الفاتورة", "معلومات الفاتورة", "بيانات الفاتورة"],
        0.9,
    ),
    (
        CommandKind::ProductInfo,
        &[
            "معلومات المنتج",
            "بيانات المنتج",
            "تفاصيل المنتج",
            "عن المنتج",
        ],
        0.85,
    ),
];

/// Classify recognized text into a command
///
/// Total function: unmatched text yields `Unknown` with zero confidence
/// and no parameters.
#[must_use]
pub fn classify(input: &str) -> ParsedCommand {
    let lowered = input.to_lowercase();
    let text = lowered.trim();

    for (kind, keywords, confidence) in PATTERNS {
        if keywords.iter().any(|keyword| text.contains(keyword)) {
            return ParsedCommand {
                kind: *kind,
                confidence: *confidence,
                parameters: extract_parameters(text, *kind),
                original_text: input.to_string(),
            };
        }
    }

    ParsedCommand {
        kind: CommandKind::Unknown,
        confidence: 0.0,
        parameters: HashMap::new(),
        original_text: input.to_string(),
    }
}

/// Extract command parameters from the normalized text
fn extract_parameters(text: &str, kind: CommandKind) -> HashMap<String, String> {
    let mut parameters = HashMap::new();

    match kind {
        CommandKind::CreateQuote => {
            if let Some(name) = QUOTE_CUSTOMER_REGEX.captures(text).and_then(|c| c.get(1)) {
                parameters.insert("customerName".to_string(), name.as_str().to_string());
            }
        }
        CommandKind::CustomerInfo => {
            if let Some(name) = CUSTOMER_REGEX
                .captures(text)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
            {
                parameters.insert("customerName".to_string(), name.as_str().to_string());
            }
        }
        CommandKind::InvoiceDetails => {
            if let Some(number) = INVOICE_REGEX
                .captures(text)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
            {
                parameters.insert("invoiceNumber".to_string(), number.as_str().to_string());
            }
        }
        CommandKind::ProductInfo => {
            if let Some(name) = PRODUCT_REGEX
                .captures(text)
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
            {
                parameters.insert("productName".to_string(), name.as_str().to_string());
            }
        }
        CommandKind::TopCustomers => {
            let period = if text.contains("هذا الشهر") || text.contains("الشهر") {
                "month"
            } else if text.contains("هذا الأسبوع") || text.contains("الأسبوع") {
                "week"
            } else if text.contains("اليوم") {
                "day"
            } else {
                // default window
                "month"
            };
            parameters.insert("period".to_string(), period.to_string());
        }
        CommandKind::SalesThisMonth => {
            parameters.insert("period".to_string(), "month".to_string());
        }
        CommandKind::SalesToday => {
            parameters.insert("period".to_string(), "day".to_string());
        }
        _ => {}
    }

    parameters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_sales_today() {
        let parsed = classify("كم مبيعات اليوم");
        assert_eq!(parsed.kind, CommandKind::SalesToday);
        assert!((parsed.confidence - 0.95).abs() < f64::EPSILON);
        assert_eq!(parsed.parameters.get("period").map(String::as_str), Some("day"));
    }

    #[test]
    fn test_classify_sales_this_month() {
        let parsed = classify("المبيعات هذا الشهر");
        assert_eq!(parsed.kind, CommandKind::SalesThisMonth);
        assert_eq!(
            parsed.parameters.get("period").map(String::as_str),
            Some("month")
        );
    }

    #[test]
    fn test_classify_unknown() {
        let parsed = classify("ما هو الطقس في الرياض");
        assert_eq!(parsed.kind, CommandKind::Unknown);
        assert!(parsed.confidence.abs() < f64::EPSILON);
        assert!(parsed.parameters.is_empty());
        assert_eq!(parsed.original_text, "ما هو الطقس في الرياض");
    }

    #[test]
    fn test_pattern_order_is_priority() {
        // Contains a quote keyword too, but the sales pattern is checked first
        let parsed = classify("مبيعات اليوم وأنشئ عرض سعر");
        assert_eq!(parsed.kind, CommandKind::SalesToday);
    }

    #[test]
    fn test_top_customers_period() {
        let parsed = classify("أعلى العملاء هذا الأسبوع");
        assert_eq!(parsed.kind, CommandKind::TopCustomers);
        assert_eq!(
            parsed.parameters.get("period").map(String::as_str),
            Some("week")
        );

        // No period word defaults to month
        let parsed = classify("أفضل العملاء");
        assert_eq!(
            parsed.parameters.get("period").map(String::as_str),
            Some("month")
        );
    }

    #[test]
    fn test_quote_customer_name() {
        let parsed = classify("أنشئ عرض سعر للعميل أحمد");
        assert_eq!(parsed.kind, CommandKind::CreateQuote);
        assert_eq!(
            parsed.parameters.get("customerName").map(String::as_str),
            Some("أحمد")
        );
    }

    #[test]
    fn test_quote_without_customer_name() {
        let parsed = classify("أنشئ عرض سعر");
        assert_eq!(parsed.kind, CommandKind::CreateQuote);
        assert!(parsed.parameters.get("customerName").is_none());
    }

    #[test]
    fn test_customer_info_name() {
        let parsed = classify("معلومات العميل سالم");
        assert_eq!(parsed.kind, CommandKind::CustomerInfo);
        assert_eq!(
            parsed.parameters.get("customerName").map(String::as_str),
            Some("سالم")
        );
    }

    #[test]
    fn test_customer_info_without_name() {
        // The phrase keyword itself must not be captured as a name
        let parsed = classify("معلومات العميل");
        assert_eq!(parsed.kind, CommandKind::CustomerInfo);
        assert!(parsed.parameters.get("customerName").is_none());
    }

    #[test]
    fn test_invoice_number() {
        let parsed = classify("تفاصيل الفاتورة رقم 123");
        assert_eq!(parsed.kind, CommandKind::InvoiceDetails);
        assert_eq!(
            parsed.parameters.get("invoiceNumber").map(String::as_str),
            Some("123")
        );
    }

    #[test]
    fn test_product_name_stops_at_whitespace() {
        let parsed = classify("معلومات المنتج لابتوب ديل");
        assert_eq!(parsed.kind, CommandKind::ProductInfo);
        assert_eq!(
            parsed.parameters.get("productName").map(String::as_str),
            Some("لابتوب")
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(CommandKind::SalesToday.as_str(), "sales_today");
        assert_eq!(CommandKind::TopCustomers.as_str(), "top_customers");
        assert_eq!(
            serde_json::to_value(CommandKind::UnpaidInvoices).unwrap(),
            serde_json::json!("unpaid_invoices")
        );
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(CommandKind::SalesToday.description(), "عرض مبيعات اليوم");
        assert_eq!(CommandKind::Unknown.description(), "أمر غير مفهوم");
    }

    #[test]
    fn test_fallback_error_messages() {
        assert_eq!(
            CommandKind::Unknown.fallback_error_message(),
            "لم أفهم الأمر. يرجى المحاولة مرة أخرى بصيغة مختلفة."
        );
        assert_eq!(
            CommandKind::SalesToday.fallback_error_message(),
            "حدث خطأ في معالجة الأمر."
        );
    }
}
