//! Explicit dispatch configuration.
//!
//! One `DispatchConfig` is constructed at startup and threaded through the
//! route table and executor constructors. There is no process-wide
//! registry: isolated instances per test (or per embedded core) come for
//! free.

use crate::convert::ConverterRegistry;
use crate::filters::{AfterFilter, BeforeFilter};
use std::sync::Arc;

/// Built-in response format used when a declaration names none.
const DEFAULT_FORMAT: &str = "html";

/// Redirect target for unauthenticated requests to protected handlers.
const DEFAULT_LOGIN_URL: &str = "/login";

/// Redirect target for authenticated requests lacking the required role.
const DEFAULT_FORBIDDEN_URL: &str = "/forbidden";

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Startup-time configuration shared by the route table and the executor.
pub struct DispatchConfig {
	before_filters: Vec<Arc<dyn BeforeFilter>>,
	after_filters: Vec<Arc<dyn AfterFilter>>,
	login_url: String,
	forbidden_url: String,
	default_format: String,
	date_format: String,
	converters: ConverterRegistry,
}

impl DispatchConfig {
	pub fn new() -> Self {
		Self {
			before_filters: Vec::new(),
			after_filters: Vec::new(),
			login_url: DEFAULT_LOGIN_URL.to_string(),
			forbidden_url: DEFAULT_FORBIDDEN_URL.to_string(),
			default_format: DEFAULT_FORMAT.to_string(),
			date_format: DEFAULT_DATE_FORMAT.to_string(),
			converters: ConverterRegistry::new(),
		}
	}

	/// Appends a global before-filter; runs before every handler in
	/// registration order, ahead of handler-specific filters.
	pub fn with_before_filter(mut self, filter: Arc<dyn BeforeFilter>) -> Self {
		self.before_filters.push(filter);
		self
	}

	/// Appends a global after-filter; runs after handler-specific
	/// after-filters, in registration order.
	pub fn with_after_filter(mut self, filter: Arc<dyn AfterFilter>) -> Self {
		self.after_filters.push(filter);
		self
	}

	pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
		self.login_url = url.into();
		self
	}

	pub fn with_forbidden_url(mut self, url: impl Into<String>) -> Self {
		self.forbidden_url = url.into();
		self
	}

	pub fn with_default_format(mut self, format: impl Into<String>) -> Self {
		self.default_format = format.into();
		self
	}

	pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
		self.date_format = format.into();
		self
	}

	pub fn before_filters(&self) -> &[Arc<dyn BeforeFilter>] {
		&self.before_filters
	}

	pub fn after_filters(&self) -> &[Arc<dyn AfterFilter>] {
		&self.after_filters
	}

	pub fn login_url(&self) -> &str {
		&self.login_url
	}

	pub fn forbidden_url(&self) -> &str {
		&self.forbidden_url
	}

	pub fn default_format(&self) -> &str {
		&self.default_format
	}

	pub fn date_format(&self) -> &str {
		&self.date_format
	}

	/// Shared converter instances for attribute declarations.
	pub fn converters(&self) -> &ConverterRegistry {
		&self.converters
	}
}

impl Default for DispatchConfig {
	fn default() -> Self {
		Self::new()
	}
}
