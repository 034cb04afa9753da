//! Display formatting for values that may be missing.
//!
//! Every field shown in the UI goes through [`first_present`] and one of the
//! formatters below, so the screen only ever shows a finite number or one of
//! the placeholder strings.

use crate::models::IndicatorValue;

pub const PENDING: &str = "Calculating...";
pub const PRICE_PENDING: &str = "Fetching price...";
pub const UNAVAILABLE: &str = "Data unavailable";
pub const ASSESSING: &str = "Assessing...";
pub const ANALYZING: &str = "Analyzing";
pub const UNCLASSIFIED: &str = "Unclassified";
pub const NOT_AVAILABLE: &str = "N/A";
pub const LOADING: &str = "Loading...";
pub const LOAD_FAILED: &str = "Failed to load";

/// How a numeric metric is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Fraction shown as percent: 0.1234 -> 12.34%
    Percentage,
    Ratio,
    Decimal,
    Price,
}

/// Whether a candidate value counts as present.
///
/// Zero is deliberately not present: a zero metric is suppressed exactly like
/// a missing one.
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for f64 {
    fn is_present(&self) -> bool {
        self.is_finite() && *self != 0.0
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Presence for &str {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Presence for IndicatorValue {
    fn is_present(&self) -> bool {
        match self {
            IndicatorValue::Number(n) => n.is_present(),
            IndicatorValue::Text(s) => s.is_present(),
        }
    }
}

/// First candidate that is present, in order
pub fn first_present<T, I>(candidates: I) -> Option<T>
where
    T: Presence,
    I: IntoIterator<Item = Option<T>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| candidate.is_present())
}

/// First positive price among the candidates
pub fn first_positive<I>(candidates: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|v| v.is_finite() && *v > 0.0)
}

/// Format a metric; missing or non-finite values become [`PENDING`]
pub fn format_value(value: Option<f64>, kind: FormatKind) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return PENDING.to_string();
    };

    match kind {
        FormatKind::Percentage => format!("{:.2}%", value * 100.0),
        FormatKind::Ratio | FormatKind::Decimal => format!("{:.2}", value),
        FormatKind::Price => format_price(value),
    }
}

pub fn format_price(value: f64) -> String {
    format!("${:.2}", value)
}

/// Price if positive, otherwise the given placeholder
pub fn price_or(value: Option<f64>, placeholder: &str) -> String {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(format_price)
        .unwrap_or_else(|| placeholder.to_string())
}

/// Market capitalization with T/B/M suffixes
pub fn format_market_cap(value: Option<f64>) -> String {
    let Some(cap) = value.filter(|v| v.is_finite() && *v > 0.0) else {
        return UNAVAILABLE.to_string();
    };

    if cap >= 1e12 {
        format!("${:.2}T", cap / 1e12)
    } else if cap >= 1e9 {
        format!("${:.2}B", cap / 1e9)
    } else if cap >= 1e6 {
        format!("${:.2}M", cap / 1e6)
    } else {
        format!("${}", group_thousands(cap))
    }
}

/// Signed percent with two decimals: +1.25% / -0.40%
pub fn format_signed_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}

pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

/// Bar fill for a 0-100 score
pub fn score_bar_percent(score: f64) -> u16 {
    if !score.is_finite() {
        return 0;
    }
    score.clamp(0.0, 100.0).round() as u16
}

/// Text if present, otherwise the placeholder
pub fn text_or(value: Option<&str>, placeholder: &str) -> String {
    first_present([value])
        .unwrap_or(placeholder)
        .to_string()
}

/// 950000.5 -> "950,000.5" (at most three fraction digits)
fn group_thousands(value: f64) -> String {
    let rendered = format!("{:.3}", value);
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((&rendered, ""));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, frac)
    }
}
