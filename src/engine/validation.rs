use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationErrors;

pub const REQUIRED_FIELD: &str = "this field is required";

lazy_static! {
    static ref LETTERS_ONLY: Regex =
        Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑüÜ\s]+$").expect("valid letters regex");
    static ref CHILEAN_MOBILE: Regex =
        Regex::new(r"^\+56\s9\s?[\d\s]{6,12}$").expect("valid phone regex");
}

pub fn is_letters_only(value: &str) -> bool {
    LETTERS_ONLY.is_match(value)
}

pub fn is_chilean_mobile(value: &str) -> bool {
    CHILEAN_MOBILE.is_match(value)
}

/// Trimmed non-empty text, or a "required" error on `field`.
pub fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
) -> Option<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => {
            errors.add(field, REQUIRED_FIELD);
            None
        }
    }
}

/// Checks an optional number against inclusive bounds. Absent values take
/// `default`; present values outside the bounds are errors.
pub fn bounded(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<f64>,
    (min, max): (f64, f64),
    default: f64,
    unit: &str,
) -> f64 {
    match value {
        None => default,
        Some(number) if number.is_finite() && number >= min && number <= max => number,
        Some(_) => {
            errors.add(field, format!("must be between {min} and {max} {unit}"));
            default
        }
    }
}

pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_pattern_accepts_chilean_mobiles() {
        assert!(is_chilean_mobile("+56 9 8100 0001"));
        assert!(is_chilean_mobile("+56 912345678"));
        assert!(!is_chilean_mobile("+54 9 1234 5678"));
        assert!(!is_chilean_mobile("912345678"));
    }

    #[test]
    fn names_accept_spanish_letters() {
        assert!(is_letters_only("José Ñúñez"));
        assert!(!is_letters_only("R2D2"));
    }

    #[test]
    fn bounded_reports_out_of_range_values() {
        let mut errors = ValidationErrors::new();
        assert_eq!(bounded(&mut errors, "weight_kg", None, (1.0, 10.0), 0.0, "kg"), 0.0);
        assert_eq!(bounded(&mut errors, "weight_kg", Some(5.0), (1.0, 10.0), 0.0, "kg"), 5.0);
        assert!(errors.is_empty());
        bounded(&mut errors, "weight_kg", Some(11.0), (1.0, 10.0), 0.0, "kg");
        assert!(errors.has("weight_kg"));
    }

    #[test]
    fn blank_text_is_required() {
        let mut errors = ValidationErrors::new();
        assert_eq!(required_text(&mut errors, "origin", Some("  ")), None);
        assert_eq!(
            required_text(&mut errors, "destination", Some(" Osorno ")),
            Some("Osorno".to_string())
        );
        assert!(errors.has("origin"));
        assert!(!errors.has("destination"));
    }
}
