//! Pure mapping kernel for OCR webhook payloads.
//!
//! Vendor field names drift between template configurations, so every
//! canonical field is resolved through an ordered fallback list; the first
//! present key wins. Unparseable amounts and dates become None rather than
//! errors so a bad field never blocks the rest of the document.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::models::{Invoice, LineItem};

const CURRENCY_SYMBOLS: [char; 4] = ['₱', '$', '€', '£'];

const VENDOR_KEYS: [&str; 4] = ["vendor", "supplier", "company_name", "from"];
const INVOICE_NUMBER_KEYS: [&str; 3] = ["invoice_number", "invoiceNumber", "number"];
const TOTAL_KEYS: [&str; 4] = ["total", "total_amount", "grand_total", "amount"];
const SUBTOTAL_KEYS: [&str; 2] = ["subtotal", "sub_total"];
const TAX_KEYS: [&str; 3] = ["tax", "vat", "tax_amount"];
const INVOICE_DATE_KEYS: [&str; 3] = ["invoice_date", "date", "issue_date"];
const DUE_DATE_KEYS: [&str; 2] = ["due_date", "payment_due"];
const LINE_ITEM_KEYS: [&str; 3] = ["line_items", "items", "lines"];

/// Correlation id threading the webhook back to the uploaded invoice.
/// Checked under both key paths the vendor has been observed to use.
pub fn correlation_id(payload: &Value) -> Option<String> {
    payload
        .pointer("/metadata/invoiceId")
        .or_else(|| payload.pointer("/custom/invoiceId"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The parsed-fields object inside the webhook body. Some deliveries nest it
/// under `parsed` or `data`; older ones put the fields at the top level.
pub fn parsed_section(payload: &Value) -> &Value {
    ["parsed", "data"]
        .iter()
        .find_map(|key| payload.get(key).filter(|v| v.is_object()))
        .unwrap_or(payload)
}

/// First non-null value among the fallback keys.
pub fn first_value<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = obj.as_object()?;
    keys.iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
}

/// First non-empty string among the fallback keys.
pub fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
    let map = obj.as_object()?;
    keys.iter().find_map(|key| {
        map.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Decimal from a numeric or string value. Currency symbols, thousands
/// separators and whitespace are stripped before parsing. Unparseable input
/// yields None; zero and negative values pass through unchanged.
pub fn parse_amount(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Timestamp from whatever the vendor sent: RFC 3339, a handful of common
/// calendar formats, or epoch milliseconds. Invalid input yields None.
pub fn parse_date(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

pub fn parse_date_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    let date_formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d.%m.%Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
        "%d %b %Y",
    ];
    for fmt in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            let midnight = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&midnight));
        }
    }
    None
}

/// Line items in input order. `line_number` is the 1-based position in the
/// vendor payload and survives drops, so a gap in the numbering means an item
/// was discarded, not reordered. Items with neither description nor amount
/// are discarded.
pub fn parse_line_items(value: Option<&Value>) -> Vec<LineItem> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let description =
                first_string(item, &["description", "item", "name"]).unwrap_or_default();
            let amount = parse_amount(first_value(item, &["amount", "total", "line_total"]));
            if description.is_empty() && amount.is_none() {
                return None;
            }
            Some(LineItem {
                line_number: (index + 1) as u32,
                description,
                quantity: parse_amount(first_value(item, &["quantity", "qty"])).unwrap_or(1.0),
                unit_price: parse_amount(first_value(item, &["unit_price", "price", "rate"])),
                amount,
                unit: first_string(item, &["unit", "uom"]).unwrap_or_default(),
            })
        })
        .collect()
}

/// Full replacement of the parsed fields on an invoice record. Pure function
/// of (record, payload, now): redelivering the same payload reapplies the same
/// result, which is what makes at-least-once webhook delivery safe.
///
/// Amounts, dates and line items always take the freshly computed value,
/// including None. Identity-ish fields keep the record's existing value when
/// the payload does not resolve them.
pub fn apply_parsed(invoice: &Invoice, parsed: &Value, now: DateTime<Utc>) -> Invoice {
    let mut out = invoice.clone();

    out.parsed = true;
    out.parsed_at = Some(now);

    out.invoice_number =
        first_string(parsed, &INVOICE_NUMBER_KEYS).or_else(|| invoice.invoice_number.clone());
    out.vendor = first_string(parsed, &VENDOR_KEYS).unwrap_or_else(|| invoice.vendor.clone());
    out.currency = first_string(parsed, &["currency"]).unwrap_or_else(|| invoice.currency.clone());
    out.description = first_string(parsed, &["description", "memo"])
        .unwrap_or_else(|| invoice.description.clone());
    out.po_number = first_string(parsed, &["po_number", "purchase_order"])
        .unwrap_or_else(|| invoice.po_number.clone());

    out.total_amount = parse_amount(first_value(parsed, &TOTAL_KEYS));
    out.subtotal = parse_amount(first_value(parsed, &SUBTOTAL_KEYS));
    out.tax = parse_amount(first_value(parsed, &TAX_KEYS));
    out.invoice_date = parse_date(first_value(parsed, &INVOICE_DATE_KEYS));
    out.due_date = parse_date(first_value(parsed, &DUE_DATE_KEYS));
    out.line_items = parse_line_items(first_value(parsed, &LINE_ITEM_KEYS));

    out.raw_parsed_data = Some(parsed.clone());
    out.updated_at = now;
    out
}
