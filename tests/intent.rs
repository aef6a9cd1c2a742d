//! Command classification tests
//!
//! One realistic phrase per command kind plus the parameter grids the
//! dispatcher relies on.

use sawt_gateway::{CommandKind, classify};

#[test]
fn recognizes_a_phrase_for_every_kind() {
    let cases = [
        ("كم مبيعات اليوم", CommandKind::SalesToday),
        ("مبيعات هذا الشهر", CommandKind::SalesThisMonth),
        ("أعلى العملاء", CommandKind::TopCustomers),
        ("الفواتير غير المدفوعة", CommandKind::UnpaidInvoices),
        ("المخزون المنخفض", CommandKind::LowStock),
        ("أنشئ عرض سعر", CommandKind::CreateQuote),
        ("بيانات العميل أحمد", CommandKind::CustomerInfo),
        ("تفاصيل الفاتورة رقم 55", CommandKind::InvoiceDetails),
        ("معلومات المنتج لابتوب", CommandKind::ProductInfo),
    ];

    for (phrase, expected) in cases {
        let parsed = classify(phrase);
        assert_eq!(parsed.kind, expected, "phrase: {phrase}");
        assert!(parsed.confidence > 0.8, "phrase: {phrase}");
    }
}

#[test]
fn keywords_match_inside_longer_utterances() {
    let parsed = classify("من فضلك اعرض لي الفواتير غير المدفوعة الآن");
    assert_eq!(parsed.kind, CommandKind::UnpaidInvoices);
}

#[test]
fn unrelated_text_is_unknown() {
    let parsed = classify("افتح الباب من فضلك");
    assert_eq!(parsed.kind, CommandKind::Unknown);
    assert!(parsed.confidence.abs() < f64::EPSILON);
    assert!(parsed.parameters.is_empty());
}

#[test]
fn latin_customer_names_are_normalized() {
    let parsed = classify("معلومات العميل AHMED");
    assert_eq!(parsed.kind, CommandKind::CustomerInfo);
    assert_eq!(
        parsed.parameters.get("customerName").map(String::as_str),
        Some("ahmed")
    );
    // Matching is case-insensitive but the original text is kept as given
    assert_eq!(parsed.original_text, "معلومات العميل AHMED");
}

#[test]
fn invoice_numbers_come_from_either_keyword() {
    let parsed = classify("تفاصيل الفاتورة 88");
    assert_eq!(
        parsed.parameters.get("invoiceNumber").map(String::as_str),
        Some("88")
    );

    let parsed = classify("معلومات الفاتورة رقم 1042");
    assert_eq!(
        parsed.parameters.get("invoiceNumber").map(String::as_str),
        Some("1042")
    );

    // Arabic-Indic digits are digits too
    let parsed = classify("بيانات الفاتورة رقم ٧٥");
    assert_eq!(
        parsed.parameters.get("invoiceNumber").map(String::as_str),
        Some("٧٥")
    );
}

#[test]
fn top_customer_period_grid() {
    let cases = [
        ("أعلى العملاء اليوم", "day"),
        ("أفضل العملاء هذا الأسبوع", "week"),
        ("أكبر العملاء هذا الشهر", "month"),
        ("أعلى العملاء", "month"),
    ];

    for (phrase, period) in cases {
        let parsed = classify(phrase);
        assert_eq!(parsed.kind, CommandKind::TopCustomers, "phrase: {phrase}");
        assert_eq!(
            parsed.parameters.get("period").map(String::as_str),
            Some(period),
            "phrase: {phrase}"
        );
    }
}

#[test]
fn product_names_follow_either_keyword() {
    let parsed = classify("عن المنتج حبر");
    assert_eq!(parsed.kind, CommandKind::ProductInfo);
    assert_eq!(
        parsed.parameters.get("productName").map(String::as_str),
        Some("حبر")
    );
}

#[test]
fn parsed_commands_serialize_in_wire_form() {
    let parsed = classify("أنشئ عرض سعر للعميل أحمد");
    let json = serde_json::to_value(&parsed).unwrap();

    assert_eq!(json["type"], "create_quote");
    assert_eq!(json["parameters"]["customerName"], "أحمد");
    assert_eq!(json["originalText"], "أنشئ عرض سعر للعميل أحمد");
    assert!(json.get("kind").is_none());
}
