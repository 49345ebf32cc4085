//! The invocable handler contract.

use crate::context::RequestContext;
use crate::convert::Value;
use crate::error::Result;
use crate::http::Request;
use async_trait::async_trait;
use std::sync::Arc;

/// A routable target method on a controller/facade.
///
/// Handlers receive their converted, validated input attributes as `args`
/// in declaration order, matching the declared
/// [`InputAttribute`](crate::params::InputAttribute) list one to one. A
/// returned value is stored in the context's output map under the
/// descriptor's return name; `None` models a void handler. An `Err` is
/// captured by the executor as the exception outcome, never propagated as
/// a dispatch failure.
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(
		&self,
		request: &mut Request,
		context: &mut RequestContext,
		args: &[Value],
	) -> Result<Option<Value>>;
}

/// Blanket impl so `Arc<dyn Handler>` is itself a handler.
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(
		&self,
		request: &mut Request,
		context: &mut RequestContext,
		args: &[Value],
	) -> Result<Option<Value>> {
		(**self).handle(request, context, args).await
	}
}
