//! Per-request mutable state.

use crate::convert::Value;
use crate::http::Response;
use std::collections::HashMap;

/// Mutable state scoped to one in-flight request.
///
/// Exactly one context exists per dispatch; it is created by the executor,
/// threaded through filters and the handler as an explicit `&mut` parameter,
/// and dropped when the terminal outcome is produced. Passing it explicitly
/// (instead of stashing it in thread-local storage) makes the dependency
/// visible in every signature that needs it and makes cross-request leakage
/// unrepresentable.
///
/// Output, header, and cookie maps are allocated on first write so handlers
/// that never emit anything pay nothing.
#[derive(Debug, Default)]
pub struct RequestContext {
	handler_name: String,
	locale: Option<String>,
	format: Option<String>,
	output: Option<HashMap<String, Value>>,
	headers: Option<HashMap<String, String>>,
	cookies: Option<HashMap<String, String>>,
	response: Option<Response>,
	forward_to: Option<String>,
}

impl RequestContext {
	/// A fresh context for the named handler.
	pub fn new(handler_name: impl Into<String>) -> Self {
		Self {
			handler_name: handler_name.into(),
			..Self::default()
		}
	}

	/// Resets every per-request field. Called at the start of each dispatch
	/// cycle even on a freshly built context, so state from an aborted prior
	/// use of a recycled context can never leak forward.
	pub fn clear(&mut self) {
		self.locale = None;
		self.format = None;
		self.output = None;
		self.headers = None;
		self.cookies = None;
		self.response = None;
		self.forward_to = None;
	}

	/// Name of the handler this context was opened for.
	pub fn handler_name(&self) -> &str {
		&self.handler_name
	}

	/// True once a response has been attached by a filter or the handler.
	/// This is the short-circuit signal the executor checks between steps.
	pub fn is_answered(&self) -> bool {
		self.response.is_some()
	}

	/// Attaches the resolved response, answering the request.
	pub fn set_response(&mut self, response: Response) {
		self.response = Some(response);
	}

	pub fn response(&self) -> Option<&Response> {
		self.response.as_ref()
	}

	/// Takes the resolved response out of the context, if any.
	pub fn take_response(&mut self) -> Option<Response> {
		self.response.take()
	}

	/// Marks the request as forwarded to another URL. The executor skips
	/// handler invocation for forwarded requests; the response-building
	/// collaborator decides what a forward renders as.
	pub fn forward(&mut self, to: impl Into<String>) {
		self.forward_to = Some(to.into());
	}

	pub fn is_forwarded(&self) -> bool {
		self.forward_to.is_some()
	}

	pub fn forward_target(&self) -> Option<&str> {
		self.forward_to.as_deref()
	}

	pub fn set_locale(&mut self, locale: impl Into<String>) {
		self.locale = Some(locale.into());
	}

	pub fn locale(&self) -> Option<&str> {
		self.locale.as_deref()
	}

	/// Negotiated response format for this request, if any was resolved.
	pub fn set_format(&mut self, format: impl Into<String>) {
		self.format = Some(format.into());
	}

	pub fn format(&self) -> Option<&str> {
		self.format.as_deref()
	}

	/// Stores a value in the output map under `name`.
	pub fn set_output(&mut self, name: impl Into<String>, value: Value) {
		self.output
			.get_or_insert_with(HashMap::new)
			.insert(name.into(), value);
	}

	pub fn output(&self, name: &str) -> Option<&Value> {
		self.output.as_ref()?.get(name)
	}

	pub fn output_len(&self) -> usize {
		self.output.as_ref().map_or(0, HashMap::len)
	}

	pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.headers
			.get_or_insert_with(HashMap::new)
			.insert(name.into(), value.into());
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.as_ref()?.get(name).map(String::as_str)
	}

	pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.cookies
			.get_or_insert_with(HashMap::new)
			.insert(name.into(), value.into());
	}

	pub fn cookie(&self, name: &str) -> Option<&str> {
		self.cookies.as_ref()?.get(name).map(String::as_str)
	}

	/// Writes collected headers and cookies onto a response.
	pub fn apply_to(&self, response: &mut Response) {
		if let Some(headers) = &self.headers {
			for (name, value) in headers {
				response.set_header(name, value);
			}
		}
		if let Some(cookies) = &self.cookies {
			for (name, value) in cookies {
				response.set_cookie(name, value);
			}
		}
	}
}
