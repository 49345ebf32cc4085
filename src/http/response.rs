//! Outbound response the core populates.

use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, LOCATION, SET_COOKIE};
use hyper::{HeaderMap, StatusCode};

/// An HTTP response under construction.
///
/// The dispatch core only sets a status, headers, cookies, and an optional
/// body; content rendering belongs to the response-building collaborator.
#[derive(Debug, Default)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// A 302 redirect to `location`.
	///
	/// # Examples
	///
	/// ```
	/// use cotopaxi::http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::redirect("/login");
	/// assert_eq!(response.status, StatusCode::FOUND);
	/// assert_eq!(response.headers["location"], "/login");
	/// ```
	pub fn redirect(location: &str) -> Self {
		let mut response = Self::new(StatusCode::FOUND);
		if let Ok(value) = HeaderValue::from_str(location) {
			response.headers.insert(LOCATION, value);
		}
		response
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Sets a header, silently skipping values that are not valid header
	/// text. Invalid values only arise from buggy filters, and dropping the
	/// header is preferable to failing an otherwise finished response.
	pub fn set_header(&mut self, name: &str, value: &str) {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
	}

	/// Appends a `Set-Cookie` header.
	pub fn set_cookie(&mut self, name: &str, value: &str) {
		if let Ok(value) = HeaderValue::from_str(&format!("{}={}", name, value)) {
			self.headers.append(SET_COOKIE, value);
		}
	}
}
