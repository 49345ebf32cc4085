//! Inbound request abstraction.

use super::extensions::Extensions;
use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// An inbound request as seen by the dispatch core.
///
/// Parameter lookup consults the override store first (populated by the
/// route table with extracted path variables, or by filters), then the
/// parsed query string. Overriding an existing query parameter is by
/// design: an extracted `{id}` path variable must win over a stray
/// `?id=...`.
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub headers: HeaderMap,
	pub body: Bytes,
	query_params: HashMap<String, String>,
	overrides: HashMap<String, String>,
	pub extensions: Extensions,
}

impl Request {
	/// Creates a request from its parts, parsing query parameters eagerly.
	pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
		let query_params = Self::parse_query_params(&uri);
		Self {
			method,
			uri,
			headers,
			body,
			query_params,
			overrides: HashMap::new(),
			extensions: Extensions::new(),
		}
	}

	/// Starts a builder, the usual way tests and host glue construct one.
	///
	/// # Examples
	///
	/// ```
	/// use cotopaxi::http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/users/42?verbose=1")
	///     .build();
	/// assert_eq!(request.path(), "/users/42");
	/// assert_eq!(request.param("verbose"), Some("1"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Splits the query string on `&`, preserving `=` inside values.
	fn parse_query_params(uri: &Uri) -> HashMap<String, String> {
		uri.query()
			.map(|q| {
				q.split('&')
					.filter_map(|pair| {
						let mut parts = pair.splitn(2, '=');
						let key = parts.next()?;
						if key.is_empty() {
							return None;
						}
						Some((
							percent_decode_str(key).decode_utf8_lossy().into_owned(),
							percent_decode_str(parts.next().unwrap_or(""))
								.decode_utf8_lossy()
								.into_owned(),
						))
					})
					.collect()
			})
			.unwrap_or_default()
	}

	/// The request path, without query string.
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Looks up a parameter: overrides first, then query parameters.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.overrides
			.get(name)
			.or_else(|| self.query_params.get(name))
			.map(String::as_str)
	}

	/// Sets or overrides a parameter. Used by the route table to feed
	/// extracted path variables into the parameter store.
	pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.overrides.insert(name.into(), value.into());
	}

	/// The parsed query parameters, without overrides.
	pub fn query_params(&self) -> &HashMap<String, String> {
		&self.query_params
	}

	/// The most preferred language from the `Accept-Language` header, used
	/// to seed the request context's locale.
	pub fn preferred_language(&self) -> Option<String> {
		let header = self
			.headers
			.get(hyper::header::ACCEPT_LANGUAGE)?
			.to_str()
			.ok()?;
		header
			.split(',')
			.filter_map(|part| {
				let part = part.trim();
				if part.is_empty() {
					return None;
				}
				let mut pieces = part.split(';');
				let lang = pieces.next()?.trim().to_string();
				let quality = pieces
					.next()
					.and_then(|q| q.trim().strip_prefix("q=")?.parse::<f32>().ok())
					.unwrap_or(1.0);
				Some((lang, quality))
			})
			.max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
			.map(|(lang, _)| lang)
	}
}

/// Builder for [`Request`].
#[derive(Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<Uri>,
	headers: HeaderMap,
	body: Bytes,
	params: Vec<(String, String)>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	/// Sets the URI. Panics on an invalid URI, which is acceptable for the
	/// literal URIs this builder is fed.
	pub fn uri(mut self, uri: &str) -> Self {
		self.uri = Some(uri.parse().expect("invalid URI literal"));
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	pub fn header(mut self, name: &'static str, value: &str) -> Self {
		if let Ok(value) = value.parse() {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Pre-seeds a parameter override, e.g. simulated form data.
	pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.push((name.into(), value.into()));
		self
	}

	pub fn build(self) -> Request {
		let mut request = Request::new(
			self.method.unwrap_or(Method::GET),
			self.uri.unwrap_or_else(|| Uri::from_static("/")),
			self.headers,
			self.body,
		);
		for (name, value) in self.params {
			request.set_param(name, value);
		}
		request
	}
}
