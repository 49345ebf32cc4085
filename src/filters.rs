//! Before/after filter contracts.
//!
//! Filters are a small closed set of capability traits implemented by
//! independent types and composed via ordered lists — a type participates
//! in the before-chain, the after-chain, or both, by implementing the
//! matching trait. The executor runs global before-filters, then
//! handler-specific ones; after the handler, handler-specific
//! after-filters run first, then global ones.

use crate::context::RequestContext;
use crate::http::Request;
use async_trait::async_trait;
use thiserror::Error;

/// Failure raised by a filter, aborting the remaining chain in that
/// direction. A before-filter failure is fatal to the request before any
/// after-filter runs; an after-filter failure propagates once everything
/// scheduled before it has run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("filter '{filter}': {message}")]
pub struct FilterError {
	pub filter: String,
	pub message: String,
}

impl FilterError {
	pub fn new(filter: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			filter: filter.into(),
			message: message.into(),
		}
	}
}

impl From<FilterError> for crate::error::Error {
	fn from(e: FilterError) -> Self {
		crate::error::Error::Filter {
			filter: e.filter,
			message: e.message,
		}
	}
}

/// Hook executed before handler invocation.
///
/// A before-filter may answer the request by attaching a response to the
/// context; the executor then skips the remaining before-filters, input
/// conversion, and the handler, and proceeds to the after-chain.
#[async_trait]
pub trait BeforeFilter: Send + Sync {
	/// Name used in error reports and logs.
	fn name(&self) -> &str;

	async fn before(
		&self,
		request: &mut Request,
		context: &mut RequestContext,
	) -> Result<(), FilterError>;
}

/// Hook executed after handler invocation (or after whichever earlier step
/// produced the response).
#[async_trait]
pub trait AfterFilter: Send + Sync {
	fn name(&self) -> &str;

	async fn after(
		&self,
		request: &Request,
		context: &mut RequestContext,
	) -> Result<(), FilterError>;
}
