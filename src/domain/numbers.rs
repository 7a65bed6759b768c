use chrono::{Datelike, NaiveDate};

use crate::domain::entities::forecast::VolumeUnit;

/// Parses a quantity that may carry en-US grouping separators ("1,234").
/// Anything that still fails to parse counts as zero.
pub fn parse_quantity(value: &str) -> f64 {
    value.trim().replace(',', "").parse::<f64>().unwrap_or(0.0)
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

/// Display formatting with thousands separators, mirroring what the backend
/// sends back for already-aggregated rows. Fractions keep up to three digits
/// with trailing zeros trimmed.
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let negative = value < 0.0;
    let magnitude = value.abs();
    let integer = magnitude.trunc() as u64;

    let digits = integer.to_string();
    let mut grouped = String::new();
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let fract = magnitude.fract();
    if fract > f64::EPSILON {
        let mut tail = format!("{fract:.3}");
        while tail.ends_with('0') {
            tail.pop();
        }
        if let Some(stripped) = tail.strip_prefix("0.") {
            grouped.push('.');
            grouped.push_str(stripped);
        }
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Rescales a raw quantity when the display unit flips. Cases are shown with
/// two decimals; pieces are whole units, truncated.
pub fn convert_quantity(raw: &str, uom: f64, target: VolumeUnit) -> String {
    let value = parse_quantity(raw);
    match target {
        VolumeUnit::Cases => format!("{:.2}", safe_div(value, uom)),
        VolumeUnit::Pieces => format!("{}", (value * uom).trunc() as i64),
    }
}

fn parse_month_label(label: &str) -> Option<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("01-{label}"), "%d-%b-%y").ok()?;
    Some((date.year(), date.month()))
}

/// The backend is trusted to iterate months chronologically; this checks that
/// trust instead of assuming it. Labels that do not parse as `Mon-YY` are
/// ignored.
pub fn is_chronological(months: &[String]) -> bool {
    let parsed: Vec<(i32, u32)> = months
        .iter()
        .filter_map(|label| parse_month_label(label))
        .collect();
    parsed.windows(2).all(|pair| pair[0] <= pair[1])
}
