//! Display formatting for metric values.

/// Placeholder shown for unavailable values.
pub const UNAVAILABLE: &str = "--";

/// Formats a whole number with en-GB thousands separators (`12,345`).
#[must_use]
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats an optional number with en-GB grouping, or [`UNAVAILABLE`].
///
/// Fractional values keep up to three decimal places, trailing zeros
/// trimmed, matching the usual en-GB number format.
#[must_use]
pub fn format_number(value: Option<f64>) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return UNAVAILABLE.to_string();
    };

    let sign = if value < 0.0 { "-" } else { "" };
    let rounded = (value.abs() * 1000.0).round() / 1000.0;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = rounded.trunc() as u64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let millis = ((rounded - rounded.trunc()) * 1000.0).round() as u64;

    let mut out = format!("{sign}{}", group_thousands(whole));
    if millis > 0 {
        let frac = format!("{millis:03}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    if out == "-0" {
        out.remove(0);
    }
    out
}

/// Formats an optional count with en-GB grouping, or [`UNAVAILABLE`].
#[must_use]
pub fn format_count(value: Option<u64>) -> String {
    value.map_or_else(|| UNAVAILABLE.to_string(), group_thousands)
}

/// Formats an optional percentage as `"76%"`, or [`UNAVAILABLE`].
#[must_use]
pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{}%", format_number(Some(v.round()))),
        None => UNAVAILABLE.to_string(),
    }
}
