// src/validation.rs
//! Field-by-field validation that collects every problem before failing,
//! so a 422 lists all offending fields at once.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{AppError, FieldErrors};

#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_default().push(message.into());
    }

    /// Records `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn required_text(&mut self, field: &str, value: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        } else if value.chars().count() > max_len {
            self.add(field, format!("may not be greater than {max_len} characters"));
        }
    }

    pub fn slug(&mut self, field: &str, value: &str) {
        let valid = !value.is_empty()
            && value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !value.starts_with('-')
            && !value.ends_with('-');
        self.check(valid, field, "must contain only lowercase letters, digits and dashes");
    }

    pub fn non_negative(&mut self, field: &str, value: Decimal) {
        self.check(value >= Decimal::ZERO, field, "must be at least 0");
    }

    pub fn percentage(&mut self, field: &str, value: Decimal) {
        self.check(
            value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED,
            field,
            "must be between 0 and 100",
        );
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::invalid_fields(self.errors))
        }
    }
}

/// Typed access to raw query-string parameters. A parameter that is present
/// but empty counts as absent.
pub struct QueryParams<'a> {
    params: &'a HashMap<String, String>,
    validator: Validator,
}

impl<'a> QueryParams<'a> {
    pub fn new(params: &'a HashMap<String, String>) -> Self {
        Self { params, validator: Validator::new() }
    }

    fn filled(&self, key: &str) -> Option<&'a str> {
        self.params.get(key).map(String::as_str).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn text(&mut self, key: &str, max_len: usize) -> Option<String> {
        let value = self.filled(key)?;
        if value.chars().count() > max_len {
            self.validator.add(key, format!("may not be greater than {max_len} characters"));
            return None;
        }
        Some(value.to_string())
    }

    /// Like `text`, but the parameter must be present with at least `min_len` characters.
    pub fn required_text(&mut self, key: &str, min_len: usize, max_len: usize) -> Option<String> {
        match self.filled(key) {
            None => {
                self.validator.add(key, "is required");
                None
            }
            Some(v) if v.chars().count() < min_len => {
                self.validator.add(key, format!("must be at least {min_len} characters"));
                None
            }
            Some(_) => self.text(key, max_len),
        }
    }

    /// Accepts true/false, 1/0, yes/no, on/off.
    pub fn boolean(&mut self, key: &str) -> Option<bool> {
        let value = self.filled(key)?;
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => {
                self.validator.add(key, "must be true or false");
                None
            }
        }
    }

    pub fn int_in(&mut self, key: &str, min: i64, max: i64) -> Option<i64> {
        let value = self.filled(key)?;
        match value.parse::<i64>() {
            Ok(n) if (min..=max).contains(&n) => Some(n),
            Ok(_) => {
                self.validator.add(key, format!("must be between {min} and {max}"));
                None
            }
            Err(_) => {
                self.validator.add(key, "must be an integer");
                None
            }
        }
    }

    pub fn one_of(&mut self, key: &str, allowed: &[&str]) -> Option<String> {
        let value = self.filled(key)?;
        if allowed.contains(&value) {
            Some(value.to_string())
        } else {
            self.validator.add(key, format!("must be one of: {}", allowed.join(", ")));
            None
        }
    }

    pub fn parse<T: FromStr>(&mut self, key: &str, message: &str) -> Option<T> {
        let value = self.filled(key)?;
        match value.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.validator.add(key, message);
                None
            }
        }
    }

    pub fn non_negative_decimal(&mut self, key: &str) -> Option<Decimal> {
        let value: Decimal = self.parse(key, "must be a number")?;
        if value < Decimal::ZERO {
            self.validator.add(key, "must be at least 0");
            return None;
        }
        Some(value)
    }

    pub fn finish(self) -> Result<(), AppError> {
        self.validator.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn collects_all_bad_fields() {
        let raw = params(&[("limit", "500"), ("sort", "price"), ("with_products", "maybe")]);
        let mut q = QueryParams::new(&raw);
        assert_eq!(q.int_in("limit", 1, 50), None);
        assert_eq!(q.one_of("sort", &["name", "developer"]), None);
        assert_eq!(q.boolean("with_products"), None);

        match q.finish() {
            Err(AppError::ValidationError { errors, .. }) => {
                let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
                assert_eq!(fields, vec!["limit", "sort", "with_products"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_values_count_as_absent() {
        let raw = params(&[("q", "  "), ("limit", "")]);
        let mut q = QueryParams::new(&raw);
        assert_eq!(q.text("q", 255), None);
        assert_eq!(q.int_in("limit", 1, 50), None);
        assert!(q.finish().is_ok());
    }

    #[test]
    fn laravel_style_booleans() {
        let raw = params(&[("a", "1"), ("b", "false"), ("c", "on")]);
        let mut q = QueryParams::new(&raw);
        assert_eq!(q.boolean("a"), Some(true));
        assert_eq!(q.boolean("b"), Some(false));
        assert_eq!(q.boolean("c"), Some(true));
    }

    #[test]
    fn required_text_enforces_min_length() {
        let raw = params(&[("q", "m")]);
        let mut q = QueryParams::new(&raw);
        assert_eq!(q.required_text("q", 2, 255), None);
        assert!(q.finish().is_err());
    }

    #[test]
    fn body_validator_checks_slug_and_percentage() {
        let mut v = Validator::new();
        v.slug("slug", "Mobile Legends");
        v.percentage("profit_percentage", Decimal::from(120));
        v.required_text("name", "ok", 255);
        match v.finish() {
            Err(AppError::ValidationError { errors, .. }) => {
                assert!(errors.contains_key("slug"));
                assert!(errors.contains_key("profit_percentage"));
                assert!(!errors.contains_key("name"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
