//! Route keys and handler descriptors.

use crate::filters::{AfterFilter, BeforeFilter};
use crate::handler::Handler;
use crate::params::InputAttribute;
use crate::pattern::RoutePattern;
use hyper::Method;
use std::sync::Arc;

/// Normalizes a URL for use in route keys: lowercased, trailing slash
/// stripped. The root path stays `/`. Normalization is idempotent: the same
/// logical route always normalizes identically.
///
/// # Examples
///
/// ```
/// use cotopaxi::route::normalize_url;
///
/// assert_eq!(normalize_url("/Foo/"), normalize_url("/foo"));
/// assert_eq!(normalize_url("/"), "/");
/// ```
pub fn normalize_url(url: &str) -> String {
	let lowered = url.to_ascii_lowercase();
	let trimmed = lowered.trim_end_matches('/');
	if trimmed.is_empty() {
		"/".to_string()
	} else {
		trimmed.to_string()
	}
}

/// Map key for route lookup: normalized URL plus HTTP method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
	url: String,
	method: Method,
}

impl RouteKey {
	/// Builds a key from a raw URL and method, normalizing the URL.
	pub fn new(url: &str, method: Method) -> Self {
		Self {
			url: normalize_url(url),
			method,
		}
	}

	/// The normalized URL part of the key.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// The HTTP method part of the key.
	pub fn method(&self) -> &Method {
		&self.method
	}
}

impl std::fmt::Display for RouteKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} {}", self.method, self.url)
	}
}

/// Login requirement attached to a descriptor.
///
/// `required` without a role means any authenticated principal passes; a
/// role additionally demands that the principal carries it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginRequirement {
	required: bool,
	role: Option<String>,
}

impl LoginRequirement {
	/// No login needed. This is the default when a declaration says nothing.
	pub fn none() -> Self {
		Self::default()
	}

	/// Any authenticated principal is accepted.
	pub fn authenticated() -> Self {
		Self {
			required: true,
			role: None,
		}
	}

	/// An authenticated principal carrying `role` is required.
	pub fn role(role: impl Into<String>) -> Self {
		Self {
			required: true,
			role: Some(role.into()),
		}
	}

	pub fn is_required(&self) -> bool {
		self.required
	}

	pub fn required_role(&self) -> Option<&str> {
		self.role.as_deref()
	}
}

/// Per-outcome message overrides for one handler.
///
/// The response-building collaborator consults these when rendering the
/// success, error, and validation-failure outcomes; `None` means its own
/// default wording applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOverrides {
	pub success: Option<String>,
	pub error: Option<String>,
	pub invalid: Option<String>,
}

impl MessageOverrides {
	pub fn is_empty(&self) -> bool {
		self.success.is_none() && self.error.is_none() && self.invalid.is_none()
	}
}

/// Immutable metadata for one routable handler.
///
/// Built once at configuration time by [`ActionMetadata`](crate::metadata::ActionMetadata)
/// and never mutated after registration; the route table owns it behind an
/// `Arc` and request threads only read it. Holding the handler as a trait
/// object here is what replaces per-request reflective lookup: resolving a
/// route yields the invocable target directly.
pub struct HandlerDescriptor {
	pattern: RoutePattern,
	methods: Vec<Method>,
	name: String,
	handler: Arc<dyn Handler>,
	attributes: Vec<InputAttribute>,
	before_filters: Vec<Arc<dyn BeforeFilter>>,
	after_filters: Vec<Arc<dyn AfterFilter>>,
	login: LoginRequirement,
	formats: Vec<String>,
	default_format: String,
	return_name: String,
	messages: MessageOverrides,
}

impl HandlerDescriptor {
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn new(
		pattern: RoutePattern,
		methods: Vec<Method>,
		name: String,
		handler: Arc<dyn Handler>,
		attributes: Vec<InputAttribute>,
		before_filters: Vec<Arc<dyn BeforeFilter>>,
		after_filters: Vec<Arc<dyn AfterFilter>>,
		login: LoginRequirement,
		formats: Vec<String>,
		default_format: String,
		return_name: String,
		messages: MessageOverrides,
	) -> Self {
		Self {
			pattern,
			methods,
			name,
			handler,
			attributes,
			before_filters,
			after_filters,
			login,
			formats,
			default_format,
			return_name,
			messages,
		}
	}

	pub fn pattern(&self) -> &RoutePattern {
		&self.pattern
	}

	/// HTTP methods this handler accepts. A handler accepting both GET and
	/// POST is registered under both method keys.
	pub fn methods(&self) -> &[Method] {
		&self.methods
	}

	/// The handler name, used in logs and error reports.
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn handler(&self) -> &Arc<dyn Handler> {
		&self.handler
	}

	/// Declared input attributes, in declaration order.
	pub fn attributes(&self) -> &[InputAttribute] {
		&self.attributes
	}

	/// Handler-specific before-filters, in declaration order.
	pub fn before_filters(&self) -> &[Arc<dyn BeforeFilter>] {
		&self.before_filters
	}

	/// Handler-specific after-filters, in declaration order.
	pub fn after_filters(&self) -> &[Arc<dyn AfterFilter>] {
		&self.after_filters
	}

	pub fn login(&self) -> &LoginRequirement {
		&self.login
	}

	/// Response formats this handler can answer with.
	pub fn formats(&self) -> &[String] {
		&self.formats
	}

	pub fn default_format(&self) -> &str {
		&self.default_format
	}

	/// Whether a format suffix is acceptable for this handler.
	pub fn accepts_format(&self, format: &str) -> bool {
		self.formats.iter().any(|f| f == format)
	}

	/// Output-map name under which the handler's return value is stored.
	pub fn return_name(&self) -> &str {
		&self.return_name
	}

	/// Per-outcome message overrides for the response builder.
	pub fn messages(&self) -> &MessageOverrides {
		&self.messages
	}
}

impl std::fmt::Debug for HandlerDescriptor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HandlerDescriptor")
			.field("pattern", &self.pattern.declared())
			.field("methods", &self.methods)
			.field("name", &self.name)
			.field("login", &self.login)
			.field("formats", &self.formats)
			.finish_non_exhaustive()
	}
}
