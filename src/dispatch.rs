//! The per-request execution pipeline.

use crate::config::DispatchConfig;
use crate::context::RequestContext;
use crate::convert::Value;
use crate::error::{Error, Result};
use crate::http::{AuthState, Request, Response};
use crate::params::{ConversionOutcome, convert_and_validate};
use crate::route::HandlerDescriptor;
use crate::router::RouteTable;
use hyper::Method;
use std::sync::Arc;
use tracing::debug;

/// Terminal outcome of one dispatched request.
///
/// Every failure category maps to exactly one variant carrying enough data
/// for the response-building collaborator to pick a status and template
/// without inspecting internals. Validation failures, missing routes, and
/// authorization refusals are ordinary outcomes here, not errors; only
/// filter failures abort a dispatch (as `Err` from
/// [`Dispatcher::dispatch`]).
#[derive(Debug)]
pub enum DispatchOutcome {
	/// The handler ran (or a filter answered). Carries the handler's return
	/// value; the context holds the same value in its output map.
	Success(Option<Value>),
	/// One or more attributes failed conversion or validation; carries the
	/// complete set of invalid attribute names in declaration order.
	ValidationFailure(Vec<String>),
	/// The handler itself failed; the error is captured, not propagated.
	Exception(Error),
	/// No authenticated principal was present.
	AuthorizationRequired { redirect: String },
	/// A principal was present but lacked the required role.
	AuthorizationForbidden { redirect: String },
	/// Nothing matched the URL and method.
	NotFound { url: String, method: Method },
}

/// A finished dispatch: the terminal outcome plus the request context that
/// accumulated output values, headers, and cookies along the way.
pub struct Dispatched {
	pub outcome: DispatchOutcome,
	pub context: RequestContext,
}

impl Dispatched {
	/// Default outcome-to-response mapping for hosts without a custom
	/// response builder: statuses only, content rendering left to the
	/// caller. A response attached by a filter or handler wins as-is.
	pub fn into_response(mut self) -> Response {
		if let Some(mut response) = self.context.take_response() {
			self.context.apply_to(&mut response);
			return response;
		}
		let mut response = match &self.outcome {
			DispatchOutcome::Success(_) => Response::ok(),
			DispatchOutcome::ValidationFailure(_) => Response::bad_request(),
			DispatchOutcome::Exception(_) => Response::internal_server_error(),
			DispatchOutcome::AuthorizationRequired { redirect }
			| DispatchOutcome::AuthorizationForbidden { redirect } => Response::redirect(redirect),
			DispatchOutcome::NotFound { .. } => Response::not_found(),
		};
		self.context.apply_to(&mut response);
		response
	}
}

/// Orchestrates one request: resolve, authorize, filter, convert, invoke,
/// filter again, and produce a terminal outcome.
///
/// The dispatcher performs no internal threading; the host container
/// supplies one task per request, and everything shared here (`RouteTable`,
/// `DispatchConfig`) is read-only after startup apart from the route
/// table's internal cache.
pub struct Dispatcher {
	routes: Arc<RouteTable>,
	config: Arc<DispatchConfig>,
}

impl Dispatcher {
	pub fn new(routes: Arc<RouteTable>, config: Arc<DispatchConfig>) -> Self {
		Self { routes, config }
	}

	pub fn routes(&self) -> &RouteTable {
		&self.routes
	}

	pub fn config(&self) -> &DispatchConfig {
		&self.config
	}

	/// Runs the full pipeline for one request.
	///
	/// `Err` is returned only for filter failures, which are fatal to the
	/// request: a failing before-filter stops the before-chain and nothing
	/// after it runs (no after-filter either); a failing after-filter
	/// propagates once every after-filter scheduled before it has run.
	pub async fn dispatch(&self, request: &mut Request) -> Result<Dispatched> {
		// Resolve. A miss is a terminal outcome, not an error.
		let descriptor = match self.routes.resolve(request) {
			Ok(descriptor) => descriptor,
			Err(Error::RouteNotFound { url, method }) => {
				debug!(%url, %method, "no route matched");
				return Ok(Dispatched {
					outcome: DispatchOutcome::NotFound { url, method },
					context: RequestContext::default(),
				});
			}
			Err(other) => return Err(other),
		};

		let mut context = RequestContext::new(descriptor.name());
		// Defensive reset: stale state from an aborted earlier cycle must
		// never leak into this one.
		context.clear();
		if let Some(locale) = request.preferred_language() {
			context.set_locale(locale);
		}
		let format = request
			.param("format")
			.unwrap_or(descriptor.default_format())
			.to_string();
		context.set_format(format);

		// Authorization, with distinct refusals for "not logged in" and
		// "logged in but under-privileged".
		if let Some(outcome) = self.check_authorization(&descriptor, request) {
			return Ok(Dispatched { outcome, context });
		}

		// Before-chain: global filters first, then handler-specific ones.
		// An answering filter stops the chain; a failing one is fatal.
		'before: for filter in self
			.config
			.before_filters()
			.iter()
			.chain(descriptor.before_filters())
		{
			if context.is_answered() {
				break 'before;
			}
			filter.before(request, &mut context).await.map_err(Error::from)?;
		}

		let outcome = if context.is_answered() {
			DispatchOutcome::Success(None)
		} else {
			self.convert_and_invoke(&descriptor, request, &mut context)
				.await
		};

		// After-chain runs whichever branch produced the response:
		// handler-specific filters first, then global ones. A failure here
		// propagates, but only after its predecessors have run.
		for filter in descriptor
			.after_filters()
			.iter()
			.chain(self.config.after_filters())
		{
			filter.after(request, &mut context).await.map_err(Error::from)?;
		}

		Ok(Dispatched { outcome, context })
	}

	fn check_authorization(
		&self,
		descriptor: &HandlerDescriptor,
		request: &Request,
	) -> Option<DispatchOutcome> {
		let login = descriptor.login();
		if !login.is_required() {
			return None;
		}
		let principal = match request.extensions.get::<AuthState>() {
			Some(p) if p.is_authenticated() => p,
			_ => {
				debug!(handler = descriptor.name(), "unauthenticated request to protected handler");
				return Some(DispatchOutcome::AuthorizationRequired {
					redirect: self.config.login_url().to_string(),
				});
			}
		};
		if let Some(role) = login.required_role() {
			if !principal.has_role(role) {
				debug!(
					handler = descriptor.name(),
					user = principal.user_id(),
					role,
					"principal lacks required role"
				);
				return Some(DispatchOutcome::AuthorizationForbidden {
					redirect: self.config.forbidden_url().to_string(),
				});
			}
		}
		None
	}

	/// ConvertAndValidate then InvokeHandler. Conversion failures aggregate
	/// into one validation outcome; a handler error is captured, never
	/// propagated.
	async fn convert_and_invoke(
		&self,
		descriptor: &HandlerDescriptor,
		request: &mut Request,
		context: &mut RequestContext,
	) -> DispatchOutcome {
		let args = match convert_and_validate(descriptor.attributes(), request) {
			ConversionOutcome::Ok(values) => values,
			ConversionOutcome::Invalid(names) => {
				debug!(
					handler = descriptor.name(),
					invalid = names.len(),
					"input validation failed"
				);
				return DispatchOutcome::ValidationFailure(names);
			}
		};

		if context.is_forwarded() {
			return DispatchOutcome::Success(None);
		}

		match descriptor.handler().handle(request, context, &args).await {
			Ok(value) => {
				if let Some(v) = &value {
					context.set_output(descriptor.return_name(), v.clone());
				}
				DispatchOutcome::Success(value)
			}
			Err(error) => {
				debug!(handler = descriptor.name(), %error, "handler raised");
				DispatchOutcome::Exception(error)
			}
		}
	}
}
