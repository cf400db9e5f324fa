use std::fmt;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of the present values, or `None` when every value is missing.
pub fn mean_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    (!present.is_empty()).then(|| mean(&present))
}

/// Result of a division whose denominator may legitimately be zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    Undefined,
}

/// `part / total`, or [`Ratio::Undefined`] when `total` is zero.
pub fn ratio(part: i64, total: i64) -> Ratio {
    if total == 0 {
        Ratio::Undefined
    } else {
        Ratio::Value(part as f64 / total as f64)
    }
}

impl Ratio {
    pub fn value(self) -> Option<f64> {
        match self {
            Ratio::Value(v) => Some(v),
            Ratio::Undefined => None,
        }
    }
}

impl From<Option<f64>> for Ratio {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Ratio::Undefined, Ratio::Value)
    }
}

/// Formats as a percentage with two decimals, `N/A` when undefined.
impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Value(v) => write!(f, "{:.2}%", v * 100.0),
            Ratio::Undefined => f.write_str("N/A"),
        }
    }
}

/// Formats `value` with `digits` significant digits in general notation.
///
/// Trailing zeros are dropped but a fixed-point result keeps one digit after
/// the point (`1.0`, `1.5`). Exponents below -4 or at least `digits - 1`
/// switch to scientific notation (`1.23e+02`).
pub fn significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let digits = digits.max(1);
    let precision = digits - 1;

    // Scientific rendering rounds first, so a carry (9.9996 -> 1.00e1)
    // shows up in the exponent.
    let sci = format!("{value:.precision$e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if value != 0.0 && (exponent < -4 || exponent >= precision as i32) {
        let mantissa = trim_zeros(mantissa).trim_end_matches('.');
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    let decimals = (precision as i32 - exponent).max(0) as usize;
    let fixed = format!("{value:.decimals$}");
    if fixed.contains('.') {
        let trimmed = trim_zeros(&fixed);
        if trimmed.ends_with('.') {
            format!("{trimmed}0")
        } else {
            trimmed.to_string()
        }
    } else {
        format!("{fixed}.0")
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0')
    } else {
        s
    }
}
