//! # Cotopaxi
//!
//! Request-dispatch core for an MVC web framework: URL route resolution
//! with parameterized patterns and memoization, a per-request execution
//! pipeline with before/after filter chains, authorization gating, and
//! aggregate input conversion and validation.
//!
//! ## Overview
//!
//! The crate provides:
//! - A [`RouteTable`] that maps normalized URL + method pairs to handler
//!   descriptors, with static routes in a hash map, dynamic routes matched
//!   in registration order, and resolved dynamic matches memoized
//! - An [`ActionMetadata`] builder that turns a URL, a handler, and its
//!   declared attributes, filters, and authorization requirements into an
//!   immutable [`HandlerDescriptor`]
//! - A [`Dispatcher`] that runs the full pipeline for one request and
//!   produces a [`DispatchOutcome`]
//! - Converters and validators for typed handler arguments, aggregating
//!   every invalid attribute instead of stopping at the first
//!
//! ## Architecture
//!
//! ```text
//! Request → RouteTable → Authorization → Before Filters
//!                                             ↓
//! Dispatched ← After Filters ← Handler ← Convert/Validate
//! ```
//!
//! ## Examples
//!
//! ```rust
//! use cotopaxi::{
//!     ActionMetadata, DispatchConfig, DispatchOutcome, Dispatcher, Handler, Request,
//!     RequestContext, RouteTable, Value,
//! };
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn handle(
//!         &self,
//!         _request: &mut Request,
//!         _context: &mut RequestContext,
//!         _args: &[Value],
//!     ) -> cotopaxi::Result<Option<Value>> {
//!         Ok(Some(Value::Text("hello".into())))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let config = DispatchConfig::new();
//! let mut routes = RouteTable::new();
//! let descriptor = ActionMetadata::new("/hello", "Hello", Arc::new(Hello))
//!     .build(&config)
//!     .unwrap();
//! routes.register(descriptor);
//!
//! let dispatcher = Dispatcher::new(Arc::new(routes), Arc::new(config));
//! let mut request = Request::builder().uri("/hello").build();
//! let dispatched = dispatcher.dispatch(&mut request).await.unwrap();
//!
//! assert!(matches!(dispatched.outcome, DispatchOutcome::Success(Some(_))));
//! assert_eq!(
//!     dispatched.context.output("hello"),
//!     Some(&Value::Text("hello".into()))
//! );
//! # });
//! ```

pub mod config;
pub mod context;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod filters;
pub mod handler;
pub mod http;
pub mod metadata;
pub mod params;
pub mod pattern;
pub mod route;
pub mod router;
pub mod validate;

pub use config::DispatchConfig;
pub use context::RequestContext;
pub use convert::{ConversionError, Converter, ConverterRegistry, Value};
pub use dispatch::{DispatchOutcome, Dispatched, Dispatcher};
pub use error::{Error, Result};
pub use filters::{AfterFilter, BeforeFilter, FilterError};
pub use handler::Handler;
pub use http::{AuthState, Extensions, Request, RequestBuilder, Response};
pub use metadata::ActionMetadata;
pub use params::{ConversionOutcome, InputAttribute};
pub use pattern::RoutePattern;
pub use route::{HandlerDescriptor, LoginRequirement, MessageOverrides, RouteKey, normalize_url};
pub use router::RouteTable;
pub use validate::Validator;
