//! Integration tests for the dispatch pipeline
//!
//! Covers the full per-request sequence: authorization gating, before and
//! after filter chains (ordering, answering, failure semantics), handler
//! invocation, exception capture, validation outcomes, and context
//! isolation between concurrent dispatches.

use async_trait::async_trait;
use cotopaxi::{
	ActionMetadata, AfterFilter, AuthState, BeforeFilter, DispatchConfig, DispatchOutcome,
	Dispatcher, Error, FilterError, Handler, InputAttribute, LoginRequirement, Request,
	RequestContext, Response, RouteTable, Value,
};
use parking_lot::Mutex;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

/// Handler that records its invocation and returns a text value.
struct RecordingHandler {
	log: Log,
}

#[async_trait]
impl Handler for RecordingHandler {
	async fn handle(
		&self,
		_request: &mut Request,
		_context: &mut RequestContext,
		_args: &[Value],
	) -> cotopaxi::Result<Option<Value>> {
		self.log.lock().push("handler".to_string());
		Ok(Some(Value::Text("done".to_string())))
	}
}

/// Handler that always fails.
struct FailingHandler;

#[async_trait]
impl Handler for FailingHandler {
	async fn handle(
		&self,
		_request: &mut Request,
		_context: &mut RequestContext,
		_args: &[Value],
	) -> cotopaxi::Result<Option<Value>> {
		Err(Error::handler("FailingHandler", "kaboom"))
	}
}

/// Handler that echoes a marker into the context output map.
struct MarkerHandler {
	marker: String,
}

#[async_trait]
impl Handler for MarkerHandler {
	async fn handle(
		&self,
		_request: &mut Request,
		_context: &mut RequestContext,
		_args: &[Value],
	) -> cotopaxi::Result<Option<Value>> {
		Ok(Some(Value::Text(self.marker.clone())))
	}
}

/// Before-filter that records its name and succeeds.
struct RecordingBefore {
	name: String,
	log: Log,
}

#[async_trait]
impl BeforeFilter for RecordingBefore {
	fn name(&self) -> &str {
		&self.name
	}

	async fn before(
		&self,
		_request: &mut Request,
		_context: &mut RequestContext,
	) -> Result<(), FilterError> {
		self.log.lock().push(self.name.clone());
		Ok(())
	}
}

/// After-filter that records its name and succeeds.
struct RecordingAfter {
	name: String,
	log: Log,
}

#[async_trait]
impl AfterFilter for RecordingAfter {
	fn name(&self) -> &str {
		&self.name
	}

	async fn after(
		&self,
		_request: &Request,
		_context: &mut RequestContext,
	) -> Result<(), FilterError> {
		self.log.lock().push(self.name.clone());
		Ok(())
	}
}

/// Before-filter that records its name, then fails.
struct FailingBefore {
	log: Log,
}

#[async_trait]
impl BeforeFilter for FailingBefore {
	fn name(&self) -> &str {
		"failing-before"
	}

	async fn before(
		&self,
		_request: &mut Request,
		_context: &mut RequestContext,
	) -> Result<(), FilterError> {
		self.log.lock().push("failing-before".to_string());
		Err(FilterError::new("failing-before", "denied"))
	}
}

/// After-filter that records its name, then fails.
struct FailingAfter {
	log: Log,
}

#[async_trait]
impl AfterFilter for FailingAfter {
	fn name(&self) -> &str {
		"failing-after"
	}

	async fn after(
		&self,
		_request: &Request,
		_context: &mut RequestContext,
	) -> Result<(), FilterError> {
		self.log.lock().push("failing-after".to_string());
		Err(FilterError::new("failing-after", "cleanup failed"))
	}
}

/// Before-filter that answers the request itself.
struct AnsweringBefore {
	log: Log,
}

#[async_trait]
impl BeforeFilter for AnsweringBefore {
	fn name(&self) -> &str {
		"answering"
	}

	async fn before(
		&self,
		_request: &mut Request,
		context: &mut RequestContext,
	) -> Result<(), FilterError> {
		self.log.lock().push("answering".to_string());
		context.set_response(Response::ok().with_body("answered by filter"));
		Ok(())
	}
}

fn before(name: &str, log: &Log) -> Arc<dyn BeforeFilter> {
	Arc::new(RecordingBefore {
		name: name.to_string(),
		log: log.clone(),
	})
}

fn after(name: &str, log: &Log) -> Arc<dyn AfterFilter> {
	Arc::new(RecordingAfter {
		name: name.to_string(),
		log: log.clone(),
	})
}

fn dispatcher_with(
	config: DispatchConfig,
	descriptors: Vec<cotopaxi::HandlerDescriptor>,
) -> Dispatcher {
	let mut table = RouteTable::new();
	for descriptor in descriptors {
		table.register(descriptor);
	}
	Dispatcher::new(Arc::new(table), Arc::new(config))
}

#[tokio::test]
async fn test_successful_dispatch_stores_return_value_under_return_name() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let config = DispatchConfig::new();
	let descriptor = ActionMetadata::new(
		"/widgets",
		"Widgets",
		Arc::new(RecordingHandler { log: log.clone() }),
	)
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/widgets").build();
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();

	assert!(matches!(
		dispatched.outcome,
		DispatchOutcome::Success(Some(Value::Text(_)))
	));
	assert_eq!(
		dispatched.context.output("widgets"),
		Some(&Value::Text("done".to_string()))
	);
	assert_eq!(dispatched.context.handler_name(), "Widgets");
}

#[tokio::test]
async fn test_handler_error_is_captured_not_propagated() {
	let config = DispatchConfig::new();
	let descriptor = ActionMetadata::new("/boom", "Boom", Arc::new(FailingHandler))
		.build(&config)
		.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/boom").build();
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();

	assert!(matches!(
		dispatched.outcome,
		DispatchOutcome::Exception(Error::Handler { .. })
	));
}

#[tokio::test]
async fn test_missing_route_is_a_not_found_outcome() {
	let config = DispatchConfig::new();
	let dispatcher = dispatcher_with(config, Vec::new());

	let mut request = Request::builder().uri("/nope").build();
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();

	match dispatched.outcome {
		DispatchOutcome::NotFound { url, .. } => assert_eq!(url, "/nope"),
		other => panic!("expected NotFound, got {other:?}"),
	}
}

#[tokio::test]
async fn test_unauthenticated_request_is_redirected_to_login_before_any_filter() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let config = DispatchConfig::new().with_before_filter(before("global", &log));
	let descriptor = ActionMetadata::new(
		"/secret",
		"Secret",
		Arc::new(RecordingHandler { log: log.clone() }),
	)
	.login(LoginRequirement::authenticated())
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/secret").build();
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();

	match dispatched.outcome {
		DispatchOutcome::AuthorizationRequired { redirect } => assert_eq!(redirect, "/login"),
		other => panic!("expected AuthorizationRequired, got {other:?}"),
	}
	assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_missing_role_is_redirected_to_forbidden() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let config = DispatchConfig::new().with_forbidden_url("/no-entry");
	let descriptor = ActionMetadata::new(
		"/admin",
		"Admin",
		Arc::new(RecordingHandler { log: log.clone() }),
	)
	.login(LoginRequirement::role("admin"))
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/admin").build();
	request
		.extensions
		.insert(AuthState::authenticated("alice", ["user"]));
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();

	match dispatched.outcome {
		DispatchOutcome::AuthorizationForbidden { redirect } => assert_eq!(redirect, "/no-entry"),
		other => panic!("expected AuthorizationForbidden, got {other:?}"),
	}
	assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_satisfied_role_runs_the_handler() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let config = DispatchConfig::new();
	let descriptor = ActionMetadata::new(
		"/admin",
		"Admin",
		Arc::new(RecordingHandler { log: log.clone() }),
	)
	.login(LoginRequirement::role("admin"))
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/admin").build();
	request
		.extensions
		.insert(AuthState::authenticated("alice", ["user", "admin"]));
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();

	assert!(matches!(dispatched.outcome, DispatchOutcome::Success(_)));
	assert_eq!(*log.lock(), vec!["handler".to_string()]);
}

#[tokio::test]
async fn test_filters_run_global_local_handler_local_global() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let config = DispatchConfig::new()
		.with_before_filter(before("global-before", &log))
		.with_after_filter(after("global-after", &log));
	let descriptor = ActionMetadata::new(
		"/ordered",
		"Ordered",
		Arc::new(RecordingHandler { log: log.clone() }),
	)
	.before_filter(before("local-before", &log))
	.after_filter(after("local-after", &log))
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/ordered").build();
	dispatcher.dispatch(&mut request).await.unwrap();

	assert_eq!(
		*log.lock(),
		vec![
			"global-before".to_string(),
			"local-before".to_string(),
			"handler".to_string(),
			"local-after".to_string(),
			"global-after".to_string(),
		]
	);
}

#[tokio::test]
async fn test_failing_before_filter_aborts_with_no_after_filters() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let config = DispatchConfig::new()
		.with_before_filter(before("first", &log))
		.with_before_filter(Arc::new(FailingBefore { log: log.clone() }))
		.with_before_filter(before("never", &log))
		.with_after_filter(after("after-never", &log));
	let descriptor = ActionMetadata::new(
		"/guarded",
		"Guarded",
		Arc::new(RecordingHandler { log: log.clone() }),
	)
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/guarded").build();
	let result = dispatcher.dispatch(&mut request).await;

	assert!(matches!(result, Err(Error::Filter { .. })));
	// Everything up to and including the failing filter ran; nothing after.
	assert_eq!(
		*log.lock(),
		vec!["first".to_string(), "failing-before".to_string()]
	);
}

#[tokio::test]
async fn test_answering_before_filter_skips_handler_but_runs_after_chain() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let config = DispatchConfig::new()
		.with_before_filter(Arc::new(AnsweringBefore { log: log.clone() }))
		.with_before_filter(before("skipped", &log))
		.with_after_filter(after("global-after", &log));
	let descriptor = ActionMetadata::new(
		"/cached-page",
		"CachedPage",
		Arc::new(RecordingHandler { log: log.clone() }),
	)
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/cached-page").build();
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();

	assert!(matches!(dispatched.outcome, DispatchOutcome::Success(None)));
	assert_eq!(
		*log.lock(),
		vec!["answering".to_string(), "global-after".to_string()]
	);
	assert!(dispatched.context.is_answered());
	let response = dispatched.into_response();
	assert_eq!(response.body, bytes::Bytes::from("answered by filter"));
}

#[tokio::test]
async fn test_failing_after_filter_runs_predecessors_then_propagates() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let config = DispatchConfig::new().with_after_filter(after("global-never", &log));
	let descriptor = ActionMetadata::new(
		"/flaky",
		"Flaky",
		Arc::new(RecordingHandler { log: log.clone() }),
	)
	.after_filter(after("local-first", &log))
	.after_filter(Arc::new(FailingAfter { log: log.clone() }))
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/flaky").build();
	let result = dispatcher.dispatch(&mut request).await;

	assert!(matches!(result, Err(Error::Filter { .. })));
	assert_eq!(
		*log.lock(),
		vec![
			"handler".to_string(),
			"local-first".to_string(),
			"failing-after".to_string(),
		]
	);
}

#[tokio::test]
async fn test_validation_failure_still_runs_after_filters() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let config = DispatchConfig::new().with_after_filter(after("global-after", &log));
	let descriptor = ActionMetadata::new(
		"/signup",
		"Signup",
		Arc::new(RecordingHandler { log: log.clone() }),
	)
	.attribute(InputAttribute::new(
		"age",
		config.converters().integer(),
	))
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder()
		.uri("/signup")
		.param("age", "not-a-number")
		.build();
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();

	match dispatched.outcome {
		DispatchOutcome::ValidationFailure(names) => {
			assert_eq!(names, vec!["age".to_string()]);
		}
		other => panic!("expected ValidationFailure, got {other:?}"),
	}
	// The handler never ran, but the after-chain did.
	assert_eq!(*log.lock(), vec!["global-after".to_string()]);
}

#[tokio::test]
async fn test_context_seeds_format_from_url_suffix() {
	let config = DispatchConfig::new();
	let descriptor = ActionMetadata::new(
		"/feed",
		"Feed",
		Arc::new(MarkerHandler {
			marker: "feed".to_string(),
		}),
	)
	.format("html")
	.format("json")
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/feed.json").build();
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();
	assert_eq!(dispatched.context.format(), Some("json"));

	let mut plain = Request::builder().uri("/feed").build();
	let dispatched = dispatcher.dispatch(&mut plain).await.unwrap();
	assert_eq!(dispatched.context.format(), Some("html"));
}

#[tokio::test]
async fn test_context_seeds_locale_from_accept_language() {
	let config = DispatchConfig::new();
	let descriptor = ActionMetadata::new(
		"/greet",
		"Greet",
		Arc::new(MarkerHandler {
			marker: "hi".to_string(),
		}),
	)
	.build(&config)
	.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder()
		.uri("/greet")
		.header("accept-language", "de;q=0.9, en;q=0.4")
		.build();
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();
	assert_eq!(dispatched.context.locale(), Some("de"));
}

#[tokio::test]
async fn test_concurrent_dispatches_get_isolated_contexts() {
	let config = DispatchConfig::new();
	let left = ActionMetadata::new(
		"/left",
		"Left",
		Arc::new(MarkerHandler {
			marker: "left-value".to_string(),
		}),
	)
	.build(&config)
	.unwrap();
	let right = ActionMetadata::new(
		"/right",
		"Right",
		Arc::new(MarkerHandler {
			marker: "right-value".to_string(),
		}),
	)
	.build(&config)
	.unwrap();
	let dispatcher = Arc::new(dispatcher_with(config, vec![left, right]));

	let mut a = Request::builder().uri("/left").build();
	let mut b = Request::builder().uri("/right").build();
	let (da, db) = tokio::join!(dispatcher.dispatch(&mut a), dispatcher.dispatch(&mut b));
	let (da, db) = (da.unwrap(), db.unwrap());

	assert_eq!(
		da.context.output("left"),
		Some(&Value::Text("left-value".to_string()))
	);
	assert_eq!(da.context.output("right"), None);
	assert_eq!(
		db.context.output("right"),
		Some(&Value::Text("right-value".to_string()))
	);
	assert_eq!(db.context.output("left"), None);
	assert_eq!(da.context.handler_name(), "Left");
	assert_eq!(db.context.handler_name(), "Right");
}

#[tokio::test]
async fn test_into_response_maps_outcomes_to_statuses() {
	let config = DispatchConfig::new();
	let descriptor = ActionMetadata::new("/boom", "Boom", Arc::new(FailingHandler))
		.build(&config)
		.unwrap();
	let dispatcher = dispatcher_with(config, vec![descriptor]);

	let mut request = Request::builder().uri("/boom").build();
	let dispatched = dispatcher.dispatch(&mut request).await.unwrap();
	let response = dispatched.into_response();
	assert_eq!(response.status, hyper::StatusCode::INTERNAL_SERVER_ERROR);

	let mut missing = Request::builder().uri("/absent").build();
	let dispatched = dispatcher.dispatch(&mut missing).await.unwrap();
	let response = dispatched.into_response();
	assert_eq!(response.status, hyper::StatusCode::NOT_FOUND);
}
