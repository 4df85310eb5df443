/// Parse a finite number, accepting plain and scientific notation.
///
/// Surrounding whitespace is ignored. `NaN`, infinities and values that
/// overflow `f64` are rejected.
pub fn parse_finite(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
