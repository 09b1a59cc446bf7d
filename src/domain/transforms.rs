//! Post-processing applied to a freshly built context.
//!
//! Order matters and is fixed: date parts are derived first, then monetary
//! fields are formatted, then fields are uppercased, and finally the
//! escaped-text wrapper is applied so it sees the final strings.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Context, ContextValue, EscapedText};

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("static regex is valid"));

/// Which fields each transform applies to.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformRules {
    pub currency_fields: Vec<String>,
    pub uppercase_fields: Vec<String>,
    pub escaped_fields: Vec<String>,
    /// Date field whose value is split into `day`, `month` and `year`
    pub date_parts_field: String,
}

impl Default for TransformRules {
    fn default() -> Self {
        Self {
            currency_fields: to_strings(&["death_benefit", "purchase_price", "p_reimburse"]),
            uppercase_fields: to_strings(&["purchaser"]),
            escaped_fields: to_strings(&[
                "purchaser",
                "signatory",
                "signatory_title",
                "purchaser_address",
                "carrier",
            ]),
            date_parts_field: "execution_date".to_string(),
        }
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl TransformRules {
    pub fn apply(&self, context: &mut Context, captured_date: Option<NaiveDate>) {
        if let Some(date) = captured_date {
            derive_date_parts(context, date);
        }
        for name in &self.currency_fields {
            if let Some(value) = context.get_mut(name) {
                *value = ContextValue::Text(format_currency(&value.display_text()));
            }
        }
        for name in &self.uppercase_fields {
            if let Some(ContextValue::Text(s)) = context.get_mut(name) {
                *s = s.to_uppercase();
            }
        }
        for name in &self.escaped_fields {
            if let Some(value) = context.get_mut(name) {
                if let ContextValue::Text(s) = value {
                    *value = ContextValue::Escaped(EscapedText::new(std::mem::take(s)));
                }
            }
        }
    }
}

/// Insert zero-padded `day`, `month` and four-digit `year`, replacing any
/// entries of the same name.
pub fn derive_date_parts(context: &mut Context, date: NaiveDate) {
    context.insert("day", ContextValue::Text(date.format("%d").to_string()));
    context.insert("month", ContextValue::Text(date.format("%m").to_string()));
    context.insert("year", ContextValue::Text(date.format("%Y").to_string()));
}

/// Normalize a monetary string to `$1,234` or `$1,234.50`.
///
/// Commas and dollar signs are stripped before the first signed number is
/// located. Input without any number comes back trimmed but otherwise
/// unchanged. Applying the function to its own output is a no-op.
pub fn format_currency(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let cleaned = trimmed.replace([',', '$'], "");
    let Some(found) = NUMBER_RE.find(&cleaned) else {
        return trimmed.to_string();
    };
    let number = found.as_str();

    if !number.contains('.') {
        return format_whole(number);
    }
    match number.parse::<f64>() {
        Ok(amount) => format_two_places(amount),
        Err(_) => trimmed.to_string(),
    }
}

/// Whole amounts are grouped digit by digit, so any length stays exact.
fn format_whole(number: &str) -> String {
    let (negative, digits) = match number.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, number),
    };
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return "$0".to_string();
    }
    let sign = if negative { "-" } else { "" };
    format!("${}{}", sign, group_thousands(digits))
}

fn format_two_places(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("${}", amount);
    }
    let fixed = format!("{:.2}", amount);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, cents) = unsigned.split_once('.').unwrap_or((unsigned, "00"));
    format!("${}{}.{}", sign, group_thousands(whole), cents)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
