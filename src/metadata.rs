//! Handler metadata declaration.
//!
//! Descriptors are built at configuration time through an explicit builder
//! rather than runtime class introspection: registration is a typed call,
//! and everything the dispatcher needs at request time is frozen into the
//! immutable [`HandlerDescriptor`] before the first request arrives.

use crate::config::DispatchConfig;
use crate::error::{Error, Result};
use crate::filters::{AfterFilter, BeforeFilter};
use crate::handler::Handler;
use crate::params::InputAttribute;
use crate::pattern::RoutePattern;
use crate::route::{HandlerDescriptor, LoginRequirement, MessageOverrides};
use hyper::Method;
use std::sync::Arc;

/// Builder for one action declaration: URL, methods, input attributes,
/// filters, login requirement, and response metadata.
///
/// # Examples
///
/// ```
/// use cotopaxi::metadata::ActionMetadata;
/// use cotopaxi::config::DispatchConfig;
/// use cotopaxi::handler::Handler;
/// use cotopaxi::convert::Value;
/// use hyper::Method;
/// use std::sync::Arc;
///
/// # use async_trait::async_trait;
/// # struct Hello;
/// # #[async_trait]
/// # impl Handler for Hello {
/// #     async fn handle(
/// #         &self,
/// #         _req: &mut cotopaxi::http::Request,
/// #         _ctx: &mut cotopaxi::context::RequestContext,
/// #         _args: &[Value],
/// #     ) -> cotopaxi::error::Result<Option<Value>> {
/// #         Ok(Some(Value::Text("hello".into())))
/// #     }
/// # }
/// let config = DispatchConfig::default();
/// let descriptor = ActionMetadata::new("/hello", "sayHello", Arc::new(Hello))
///     .method(Method::GET)
///     .build(&config)
///     .unwrap();
/// assert_eq!(descriptor.name(), "sayHello");
/// assert_eq!(descriptor.return_name(), "sayhello");
/// ```
pub struct ActionMetadata {
	url: String,
	name: String,
	handler: Arc<dyn Handler>,
	methods: Vec<Method>,
	attributes: Vec<InputAttribute>,
	before_filters: Vec<Arc<dyn BeforeFilter>>,
	after_filters: Vec<Arc<dyn AfterFilter>>,
	login: LoginRequirement,
	formats: Vec<String>,
	default_format: Option<String>,
	return_name: Option<String>,
	messages: MessageOverrides,
}

impl ActionMetadata {
	pub fn new(url: impl Into<String>, name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
		Self {
			url: url.into(),
			name: name.into(),
			handler,
			methods: Vec::new(),
			attributes: Vec::new(),
			before_filters: Vec::new(),
			after_filters: Vec::new(),
			login: LoginRequirement::none(),
			formats: Vec::new(),
			default_format: None,
			return_name: None,
			messages: MessageOverrides::default(),
		}
	}

	/// Adds an accepted HTTP method. Declaring both GET and POST registers
	/// the descriptor under both keys. Unspecified defaults to GET.
	pub fn method(mut self, method: Method) -> Self {
		if !self.methods.contains(&method) {
			self.methods.push(method);
		}
		self
	}

	/// Declares an input attribute; declaration order is invocation order.
	pub fn attribute(mut self, attribute: InputAttribute) -> Self {
		self.attributes.push(attribute);
		self
	}

	/// Adds a handler-specific before-filter, run after the global chain.
	pub fn before_filter(mut self, filter: Arc<dyn BeforeFilter>) -> Self {
		self.before_filters.push(filter);
		self
	}

	/// Adds a handler-specific after-filter, run before the global chain.
	pub fn after_filter(mut self, filter: Arc<dyn AfterFilter>) -> Self {
		self.after_filters.push(filter);
		self
	}

	pub fn login(mut self, login: LoginRequirement) -> Self {
		self.login = login;
		self
	}

	/// Adds an acceptable response format. Unspecified defaults to the
	/// configuration's single default format.
	pub fn format(mut self, format: impl Into<String>) -> Self {
		self.formats.push(format.into());
		self
	}

	pub fn default_format(mut self, format: impl Into<String>) -> Self {
		self.default_format = Some(format.into());
		self
	}

	/// Output-map name for the handler's return value. Unspecified defaults
	/// to the lower-cased handler name.
	pub fn return_name(mut self, name: impl Into<String>) -> Self {
		self.return_name = Some(name.into());
		self
	}

	/// Message the response builder shows on success.
	pub fn success_message(mut self, message: impl Into<String>) -> Self {
		self.messages.success = Some(message.into());
		self
	}

	/// Message the response builder shows on a handler error.
	pub fn error_message(mut self, message: impl Into<String>) -> Self {
		self.messages.error = Some(message.into());
		self
	}

	/// Message the response builder shows on a validation failure.
	pub fn invalid_message(mut self, message: impl Into<String>) -> Self {
		self.messages.invalid = Some(message.into());
		self
	}

	/// Freezes the declaration into an immutable descriptor, applying
	/// defaults and validating the URL pattern.
	pub fn build(self, config: &DispatchConfig) -> Result<HandlerDescriptor> {
		if self.name.is_empty() {
			return Err(Error::Metadata {
				handler: self.url.clone(),
				message: "handler name must not be empty".to_string(),
			});
		}

		let pattern = RoutePattern::new(&self.url)?;
		let methods = if self.methods.is_empty() {
			vec![Method::GET]
		} else {
			self.methods
		};
		let formats = if self.formats.is_empty() {
			vec![config.default_format().to_string()]
		} else {
			self.formats
		};
		let default_format = self
			.default_format
			.unwrap_or_else(|| formats[0].clone());
		if !formats.contains(&default_format) {
			return Err(Error::Metadata {
				handler: self.name.clone(),
				message: format!(
					"default format '{}' is not among the declared formats",
					default_format
				),
			});
		}
		let return_name = self
			.return_name
			.unwrap_or_else(|| self.name.to_ascii_lowercase());

		Ok(HandlerDescriptor::new(
			pattern,
			methods,
			self.name,
			self.handler,
			self.attributes,
			self.before_filters,
			self.after_filters,
			self.login,
			formats,
			default_format,
			return_name,
			self.messages,
		))
	}
}
