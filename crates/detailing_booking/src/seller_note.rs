// --- File: crates/detailing_booking/src/seller_note.rs ---

//! Payment lines kept in a booking's seller note.
//!
//! Older bookings carry their card-on-file id, service amount and currency only
//! as lines in the seller note, and a collected no-show fee is recorded there
//! as a marker line. These helpers read and write that format.

use once_cell::sync::Lazy;
use regex::Regex;

pub const CHARGE_MARKER: &str = "No-show fee charged:";

static CARD_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"Card ID:\s*(\S+)").expect("valid regex"));
static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Service Amount \(cents\):\s*(\d+)").expect("valid regex"));
static CURRENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Currency:\s*([A-Za-z]{3})\b").expect("valid regex"));
static CHARGED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"No-show fee charged:\s*([^\s(]+)").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePaymentDetails {
    pub card_id: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
}

pub fn parse_payment_details(note: &str) -> NotePaymentDetails {
    NotePaymentDetails {
        card_id: capture(&CARD_ID, note),
        amount_cents: capture(&AMOUNT, note).and_then(|a| a.parse().ok()),
        currency: capture(&CURRENCY, note).map(|c| c.to_uppercase()),
    }
}

pub fn is_charged(note: &str) -> bool {
    note.contains(CHARGE_MARKER)
}

/// Payment id from the charge marker, when present.
pub fn charged_payment_id(note: &str) -> Option<String> {
    capture(&CHARGED, note)
}

/// Payment lines for a new booking.
pub fn payment_lines(card_id: &str, amount_cents: Option<i64>, currency: &str) -> String {
    let mut lines = vec![format!("Card ID: {}", card_id)];
    if let Some(amount) = amount_cents {
        lines.push(format!("Service Amount (cents): {}", amount));
    }
    lines.push(format!("Currency: {}", currency));
    lines.join("\n")
}

/// Appends `No-show fee charged: <payment id> (<fee> <currency>)`.
pub fn with_charge_marker(note: Option<&str>, payment_id: &str, fee_cents: i64, currency: &str) -> String {
    let marker = format!("{} {} ({} {})", CHARGE_MARKER, payment_id, fee_cents, currency);
    match note.map(str::trim_end).filter(|n| !n.is_empty()) {
        Some(existing) => format!("{}\n{}", existing, marker),
        None => marker,
    }
}

/// Replaces the free-text part of a note while keeping its payment lines.
pub fn replace_text(existing: Option<&str>, text: &str) -> String {
    let kept: Vec<&str> = existing
        .unwrap_or_default()
        .lines()
        .filter(|line| is_payment_line(line) && !text.contains(line.trim()))
        .collect();

    let text = text.trim();
    match (text.is_empty(), kept.is_empty()) {
        (_, true) => text.to_string(),
        (true, false) => kept.join("\n"),
        (false, false) => format!("{}\n{}", text, kept.join("\n")),
    }
}

fn is_payment_line(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("Card ID:")
        || line.starts_with("Service Amount (cents):")
        || line.starts_with("Currency:")
        || line.starts_with(CHARGE_MARKER)
}

fn capture(re: &Regex, note: &str) -> Option<String> {
    re.captures(note)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "Customer prefers mornings\nCard ID: ccof:GaJGNaZa8x4\nService Amount (cents): 20000\nCurrency: usd";

    #[test]
    fn test_parse_payment_details() {
        let details = parse_payment_details(NOTE);
        assert_eq!(details.card_id.as_deref(), Some("ccof:GaJGNaZa8x4"));
        assert_eq!(details.amount_cents, Some(20000));
        assert_eq!(details.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_parse_partial_note() {
        let details = parse_payment_details("Card ID: abc");
        assert_eq!(details.card_id.as_deref(), Some("abc"));
        assert_eq!(details.amount_cents, None);
        assert_eq!(details.currency, None);
        assert_eq!(parse_payment_details(""), NotePaymentDetails::default());
    }

    #[test]
    fn test_charge_marker_round_trip() {
        let note = with_charge_marker(Some(NOTE), "pay-123", 6000, "USD");
        assert!(note.starts_with(NOTE));
        assert!(note.ends_with("No-show fee charged: pay-123 (6000 USD)"));
        assert!(is_charged(&note));
        assert_eq!(charged_payment_id(&note).as_deref(), Some("pay-123"));
        assert!(!is_charged(NOTE));
    }

    #[test]
    fn test_marker_on_empty_note() {
        assert_eq!(
            with_charge_marker(None, "p", 1, "TND"),
            "No-show fee charged: p (1 TND)"
        );
    }

    #[test]
    fn test_payment_lines_parse_back() {
        let lines = payment_lines("ccof:1", Some(4500), "USD");
        let details = parse_payment_details(&lines);
        assert_eq!(details.card_id.as_deref(), Some("ccof:1"));
        assert_eq!(details.amount_cents, Some(4500));
    }

    #[test]
    fn test_replace_text_keeps_payment_lines() {
        let replaced = replace_text(Some(NOTE), "Gate code 1234");
        assert!(replaced.starts_with("Gate code 1234\n"));
        assert!(replaced.contains("Card ID: ccof:GaJGNaZa8x4"));
        assert!(!replaced.contains("mornings"));
        assert_eq!(replace_text(None, "  hi "), "hi");
    }
}
