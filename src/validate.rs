//! Value validation, orthogonal to conversion.
//!
//! A value may convert successfully and still fail validation (a parsable
//! integer outside its allowed range, say). Validators are stateless and
//! shared across requests.

use crate::convert::Value;
use regex::Regex;

/// Checks a converted value. Returning `false` marks the attribute invalid;
/// the attribute name joins the aggregate failure set.
pub trait Validator: Send + Sync {
	fn is_valid(&self, value: &Value) -> bool;
}

/// Inclusive numeric range check over `Int` and `Float` values.
/// Non-numeric values fail.
pub struct RangeValidator {
	min: f64,
	max: f64,
}

impl RangeValidator {
	/// # Examples
	///
	/// ```
	/// use cotopaxi::validate::{RangeValidator, Validator};
	/// use cotopaxi::convert::Value;
	///
	/// let validator = RangeValidator::new(0.0, 120.0);
	/// assert!(validator.is_valid(&Value::Int(42)));
	/// assert!(!validator.is_valid(&Value::Int(150)));
	/// ```
	pub fn new(min: f64, max: f64) -> Self {
		Self { min, max }
	}
}

impl Validator for RangeValidator {
	fn is_valid(&self, value: &Value) -> bool {
		let n = match value {
			Value::Int(i) => *i as f64,
			Value::Float(x) => *x,
			_ => return false,
		};
		n >= self.min && n <= self.max
	}
}

/// Minimum character count for `Text`, minimum element count for `List`.
pub struct MinLengthValidator {
	min: usize,
}

impl MinLengthValidator {
	pub fn new(min: usize) -> Self {
		Self { min }
	}
}

impl Validator for MinLengthValidator {
	fn is_valid(&self, value: &Value) -> bool {
		match value {
			Value::Text(s) => s.chars().count() >= self.min,
			Value::List(items) => items.len() >= self.min,
			_ => false,
		}
	}
}

/// Maximum character count for `Text`, maximum element count for `List`.
pub struct MaxLengthValidator {
	max: usize,
}

impl MaxLengthValidator {
	pub fn new(max: usize) -> Self {
		Self { max }
	}
}

impl Validator for MaxLengthValidator {
	fn is_valid(&self, value: &Value) -> bool {
		match value {
			Value::Text(s) => s.chars().count() <= self.max,
			Value::List(items) => items.len() <= self.max,
			_ => false,
		}
	}
}

/// Full-match regex check over `Text` values.
pub struct RegexValidator {
	regex: Regex,
}

impl RegexValidator {
	pub fn new(pattern: &str) -> Result<Self, regex::Error> {
		let anchored = format!("^(?:{})$", pattern);
		Ok(Self {
			regex: Regex::new(&anchored)?,
		})
	}
}

impl Validator for RegexValidator {
	fn is_valid(&self, value: &Value) -> bool {
		match value {
			Value::Text(s) => self.regex.is_match(s),
			_ => false,
		}
	}
}
