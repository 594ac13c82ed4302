// Utility helpers for parsing and basic statistics.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values. The spreadsheet this tool
// ingests is a Brazilian facilities export, so the money and date parsers
// accept pt-BR conventions first and common ISO forms second.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a monetary value while being forgiving about the formats that show
/// up in real spreadsheet exports.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace and an optional leading `R$`.
/// - `1.500,00` (pt-BR thousands/decimal) parses as `1500.0`.
/// - `1500.00` and `1500` parse as-is.
/// - Rejects values that contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed; callers decide
///   whether "no value" later becomes zero (aggregation does, nothing else).
pub fn parse_money_br(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.strip_prefix("R$").unwrap_or(s).trim();
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s: String = s.chars().filter(|c| *c != ' ' && *c != '\u{a0}').collect();
    let cleaned = if s.contains(',') {
        // pt-BR: '.' groups thousands, ',' marks the decimals.
        s.replace('.', "").replace(',', ".")
    } else {
        s
    };
    cleaned.parse::<f64>().ok()
}

/// Parse an SLA target in whole days.
///
/// The cadastro is hand-maintained, so `15`, `15.0` and stray spaces all
/// appear in practice. Fractional values truncate toward zero; the data
/// contract is whole-day targets.
pub fn parse_days_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)
}

/// Parse a date from the formats a pt-BR spreadsheet export actually carries:
/// ISO dates, ISO datetimes (Excel-sourced midnight stamps), and `dd/mm/yyyy`
/// with or without a time.
pub fn parse_date_flex(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Month bucket for a date, rendered `YYYY-MM`. Sorting these strings sorts
/// chronologically, which the month KPIs rely on.
pub fn month_key(d: NaiveDate) -> String {
    d.format("%Y-%m").to_string()
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn median(mut v: Vec<f64>) -> f64 {
    // Median of a list of numbers. We accept `Vec<f64>` by value so the
    // function can sort in-place without cloning at the call site.
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        v[mid]
    } else {
        (v[mid - 1] + v[mid]) / 2.0
    }
}

/// Format a monetary value the way the reports print it: pt-BR grouping and
/// exactly two decimals (`1234567.89` -> `1.234.567,89`).
pub fn format_money_br(n: f64) -> String {
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.2}", abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next().unwrap_or("00");
    // `num-format` inserts the pt-BR dot grouping into the integer portion.
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::pt);
    res.push(',');
    res.push_str(frac_part);
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Render a mean/median-style statistic with one decimal, `-` when there was
/// nothing to average (so "no data" never reads as `0.0`).
pub fn format_stat(n: Option<f64>) -> String {
    match n {
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values. This is used
    // for counts in console messages (e.g., `9.855 linhas lidas`).
    n.to_formatted_string(&Locale::pt)
}
