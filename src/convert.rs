//! String-to-typed-value conversion.
//!
//! Converters are stateless and shared: the [`ConverterRegistry`] hands out
//! at most one instance per converter kind, memoized for the lifetime of
//! the configuration. A conversion failure is local to one attribute and is
//! folded into the aggregate validation outcome by the caller — it never
//! propagates raw.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// A converted input value, passed to handlers in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Date(NaiveDateTime),
	List(Vec<String>),
}

impl Value {
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Value::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}
}

impl std::fmt::Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Bool(b) => write!(f, "{}", b),
			Value::Int(i) => write!(f, "{}", i),
			Value::Float(x) => write!(f, "{}", x),
			Value::Text(s) => write!(f, "{}", s),
			Value::Date(d) => write!(f, "{}", d),
			Value::List(items) => write!(f, "{}", items.join(",")),
		}
	}
}

/// Failure to parse a raw string as the target type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot convert '{value}': {message}")]
pub struct ConversionError {
	pub value: String,
	pub message: String,
}

impl ConversionError {
	fn new(value: &str, message: impl Into<String>) -> Self {
		Self {
			value: value.to_string(),
			message: message.into(),
		}
	}
}

/// Converts a raw request parameter into a typed [`Value`].
pub trait Converter: Send + Sync {
	fn convert(&self, raw: &str) -> Result<Value, ConversionError>;
}

/// `true`/`false` (case-insensitive), also accepting `1`/`0`.
pub struct BooleanConverter;

impl Converter for BooleanConverter {
	fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
		match raw.to_ascii_lowercase().as_str() {
			"true" | "1" => Ok(Value::Bool(true)),
			"false" | "0" => Ok(Value::Bool(false)),
			_ => Err(ConversionError::new(raw, "not a boolean")),
		}
	}
}

/// Signed 64-bit integer.
pub struct IntegerConverter;

impl Converter for IntegerConverter {
	fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
		raw.trim()
			.parse::<i64>()
			.map(Value::Int)
			.map_err(|e| ConversionError::new(raw, e.to_string()))
	}
}

/// 64-bit float.
pub struct FloatConverter;

impl Converter for FloatConverter {
	fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
		raw.trim()
			.parse::<f64>()
			.map(Value::Float)
			.map_err(|e| ConversionError::new(raw, e.to_string()))
	}
}

/// Date/time parsing with a configurable `chrono` format string.
///
/// Tries the full date-time format first, then falls back to the date-only
/// part of the format with the time set to midnight.
pub struct DateConverter {
	format: String,
}

impl DateConverter {
	pub fn new(format: impl Into<String>) -> Self {
		Self {
			format: format.into(),
		}
	}
}

impl Converter for DateConverter {
	fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
		let raw = raw.trim();
		if let Ok(dt) = NaiveDateTime::parse_from_str(raw, &self.format) {
			return Ok(Value::Date(dt));
		}
		// Date-only input: retry with the format truncated at its time part.
		let date_format = self.format.split(' ').next().unwrap_or(&self.format);
		NaiveDate::parse_from_str(raw, date_format)
			.map(|d| Value::Date(d.and_hms_opt(0, 0, 0).unwrap_or_default()))
			.map_err(|e| ConversionError::new(raw, e.to_string()))
	}
}

/// Splits on a delimiter into a list of trimmed, non-empty strings.
pub struct StringArrayConverter {
	delimiter: char,
}

impl StringArrayConverter {
	pub fn new(delimiter: char) -> Self {
		Self { delimiter }
	}
}

impl Converter for StringArrayConverter {
	fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
		let items: Vec<String> = raw
			.split(self.delimiter)
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(String::from)
			.collect();
		Ok(Value::List(items))
	}
}

/// Free text, taken as-is.
pub struct TextConverter;

impl Converter for TextConverter {
	fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
		Ok(Value::Text(raw.to_string()))
	}
}

static TAG_PATTERN: Lazy<Regex> =
	Lazy::new(|| Regex::new("<[^>]*>").expect("tag pattern is valid"));

/// Text with HTML tags stripped.
pub struct SafeTextConverter;

impl Converter for SafeTextConverter {
	fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
		Ok(Value::Text(TAG_PATTERN.replace_all(raw, "").into_owned()))
	}
}

/// Hands out shared converter instances, at most one per kind.
///
/// Parameterized kinds (date format, array delimiter) are memoized per
/// parameter value. The registry is built once at configuration time and
/// read concurrently afterwards; the inner mutex only guards first-use
/// insertion of parameterized converters.
pub struct ConverterRegistry {
	boolean: Arc<BooleanConverter>,
	integer: Arc<IntegerConverter>,
	float: Arc<FloatConverter>,
	text: Arc<TextConverter>,
	safe_text: Arc<SafeTextConverter>,
	dates: Mutex<HashMap<String, Arc<DateConverter>>>,
	arrays: Mutex<HashMap<char, Arc<StringArrayConverter>>>,
}

impl ConverterRegistry {
	pub fn new() -> Self {
		Self {
			boolean: Arc::new(BooleanConverter),
			integer: Arc::new(IntegerConverter),
			float: Arc::new(FloatConverter),
			text: Arc::new(TextConverter),
			safe_text: Arc::new(SafeTextConverter),
			dates: Mutex::new(HashMap::new()),
			arrays: Mutex::new(HashMap::new()),
		}
	}

	pub fn boolean(&self) -> Arc<dyn Converter> {
		self.boolean.clone()
	}

	pub fn integer(&self) -> Arc<dyn Converter> {
		self.integer.clone()
	}

	pub fn float(&self) -> Arc<dyn Converter> {
		self.float.clone()
	}

	pub fn text(&self) -> Arc<dyn Converter> {
		self.text.clone()
	}

	pub fn safe_text(&self) -> Arc<dyn Converter> {
		self.safe_text.clone()
	}

	pub fn date(&self, format: &str) -> Arc<dyn Converter> {
		self.dates
			.lock()
			.entry(format.to_string())
			.or_insert_with(|| Arc::new(DateConverter::new(format)))
			.clone()
	}

	pub fn array(&self, delimiter: char) -> Arc<dyn Converter> {
		self.arrays
			.lock()
			.entry(delimiter)
			.or_insert_with(|| Arc::new(StringArrayConverter::new(delimiter)))
			.clone()
	}
}

impl Default for ConverterRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("true", true)]
	#[case("TRUE", true)]
	#[case("1", true)]
	#[case("false", false)]
	#[case("0", false)]
	fn boolean_accepts_common_forms(#[case] raw: &str, #[case] expected: bool) {
		assert_eq!(
			BooleanConverter.convert(raw).unwrap(),
			Value::Bool(expected)
		);
	}

	#[test]
	fn boolean_rejects_garbage() {
		assert!(BooleanConverter.convert("yes?").is_err());
	}

	#[test]
	fn integer_roundtrip_and_failure() {
		assert_eq!(IntegerConverter.convert(" 42 ").unwrap(), Value::Int(42));
		assert!(IntegerConverter.convert("abc").is_err());
		assert!(IntegerConverter.convert("1.5").is_err());
	}

	#[test]
	fn float_parses() {
		assert_eq!(
			FloatConverter.convert("3.25").unwrap(),
			Value::Float(3.25)
		);
	}

	#[test]
	fn date_falls_back_to_midnight() {
		let converter = DateConverter::new("%Y-%m-%d");
		let value = converter.convert("2026-08-29").unwrap();
		match value {
			Value::Date(dt) => {
				assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2026, 8, 29).unwrap());
				assert_eq!(dt.time(), chrono::NaiveTime::MIN);
			}
			other => panic!("expected date, got {:?}", other),
		}
		assert!(converter.convert("29/08/2026").is_err());
	}

	#[test]
	fn array_splits_and_trims() {
		let converter = StringArrayConverter::new(',');
		assert_eq!(
			converter.convert("a, b ,,c").unwrap(),
			Value::List(vec!["a".into(), "b".into(), "c".into()])
		);
	}

	#[test]
	fn safe_text_strips_tags() {
		let value = SafeTextConverter
			.convert("<b>bold</b> and <script>evil()</script>plain")
			.unwrap();
		assert_eq!(value, Value::Text("bold and evil()plain".to_string()));
	}

	#[test]
	fn registry_memoizes_instances() {
		let registry = ConverterRegistry::new();
		let a = registry.date("%Y-%m-%d");
		let b = registry.date("%Y-%m-%d");
		assert!(Arc::ptr_eq(&a, &b));

		let c = registry.integer();
		let d = registry.integer();
		assert!(Arc::ptr_eq(&c, &d));
	}
}
