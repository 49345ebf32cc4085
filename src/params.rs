//! Declared input attributes and the aggregate convert-and-validate pass.

use crate::convert::{Converter, Value};
use crate::http::Request;
use crate::validate::Validator;
use std::sync::Arc;

/// One declared input attribute of a handler: where to find the raw value,
/// how to convert it, and optionally how to validate the result.
/// Immutable once declared.
#[derive(Clone)]
pub struct InputAttribute {
	name: String,
	converter: Arc<dyn Converter>,
	validator: Option<Arc<dyn Validator>>,
	default: Option<String>,
}

impl InputAttribute {
	pub fn new(name: impl Into<String>, converter: Arc<dyn Converter>) -> Self {
		Self {
			name: name.into(),
			converter,
			validator: None,
			default: None,
		}
	}

	pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
		self.validator = Some(validator);
		self
	}

	/// Raw fallback used when the request carries no value for this
	/// attribute. Without a default, a missing value is a validation
	/// failure.
	pub fn with_default(mut self, raw: impl Into<String>) -> Self {
		self.default = Some(raw.into());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

/// Result of converting and validating a handler's declared attributes.
#[derive(Debug, PartialEq)]
pub enum ConversionOutcome {
	/// Every attribute converted and validated; values in declaration order.
	Ok(Vec<Value>),
	/// At least one attribute failed; carries every invalid attribute name
	/// in declaration order, never just the first.
	Invalid(Vec<String>),
}

/// Converts and validates every declared attribute against the request.
///
/// All attributes are attempted even after a failure, so the final invalid
/// set is complete: a missing required value, a conversion error, and a
/// validation refusal all record the attribute name and move on.
pub fn convert_and_validate(attributes: &[InputAttribute], request: &Request) -> ConversionOutcome {
	let mut values = Vec::with_capacity(attributes.len());
	let mut invalid = Vec::new();

	for attribute in attributes {
		let raw = request
			.param(&attribute.name)
			.map(str::to_string)
			.or_else(|| attribute.default.clone());
		let Some(raw) = raw else {
			invalid.push(attribute.name.clone());
			continue;
		};

		match attribute.converter.convert(&raw) {
			Ok(value) => {
				let valid = attribute
					.validator
					.as_ref()
					.is_none_or(|v| v.is_valid(&value));
				if valid {
					values.push(value);
				} else {
					invalid.push(attribute.name.clone());
				}
			}
			Err(_) => invalid.push(attribute.name.clone()),
		}
	}

	if invalid.is_empty() {
		ConversionOutcome::Ok(values)
	} else {
		ConversionOutcome::Invalid(invalid)
	}
}
