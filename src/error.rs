//! Crate-wide error type and result alias.

use hyper::Method;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the dispatch core.
///
/// Expected request-level failures (not-found routes, validation failures,
/// authorization refusals) are *not* represented here — those are terminal
/// [`DispatchOutcome`](crate::dispatch::DispatchOutcome) variants. This enum
/// covers failures that abort a dispatch or reject a configuration.
#[derive(Debug, Error)]
pub enum Error {
	/// No descriptor matched the request URL and method.
	#[error("no route found for {method} {url}")]
	RouteNotFound { url: String, method: Method },

	/// A before- or after-filter refused the request. Fatal to the dispatch.
	#[error("filter '{filter}' failed: {message}")]
	Filter { filter: String, message: String },

	/// The invoked handler itself failed. Captured into the exception outcome.
	#[error("handler '{handler}' failed: {message}")]
	Handler { handler: String, message: String },

	/// A declared route pattern could not be compiled.
	#[error("invalid route pattern '{pattern}': {message}")]
	Pattern { pattern: String, message: String },

	/// Invalid metadata declaration caught at registration time.
	#[error("invalid handler metadata for '{handler}': {message}")]
	Metadata { handler: String, message: String },

	/// Anything unrecoverable that has no better home.
	#[error("internal error: {0}")]
	Internal(String),
}

impl Error {
	/// Shorthand for a handler failure, used by handler implementations.
	pub fn handler(handler: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Handler {
			handler: handler.into(),
			message: message.into(),
		}
	}
}
