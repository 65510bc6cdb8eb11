//! Lenient readings of loosely-typed server values.
//!
//! Backends send numbers as strings, booleans as `0`/`1`, and lists as either
//! arrays or newline-joined text. These helpers never fail; they fall back to
//! `None`/`false`/empty.

use serde_json::Value;

/// Leading-integer parse: `"1"`, `" 42abc"`, `3` and `3.9` all read as
/// integers; booleans, null and non-numeric text do not.
#[must_use]
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let parsed: i64 = digits[..end].parse().ok()?;
    Some(if negative { -parsed } else { parsed })
}

/// Non-negative count, or 0 for anything unreadable.
#[must_use]
pub fn count(value: Option<&Value>) -> u64 {
    value
        .and_then(parse_int)
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

/// Text form of a scalar the way a browser would stringify it: integral
/// floats lose their `.0`, arrays join with commas.
#[must_use]
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".into(),
    }
}

/// Loose truthiness: null, `false`, `0`, `NaN` and `""` are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Perl truthiness: null, `""`, `"0"` and `0` are false.
#[must_use]
pub fn is_perl_true(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty() && s != "0",
        other => is_truthy(other),
    }
}
