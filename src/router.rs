//! Route table: registration, resolution, caching.

use crate::error::{Error, Result};
use crate::http::Request;
use crate::route::{HandlerDescriptor, RouteKey, normalize_url};
use hyper::Method;
use parking_lot::RwLock;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves `(URL, method)` pairs to handler descriptors.
///
/// Three structures back resolution, consulted in a fixed order that
/// defines both correctness and amortized cost: a result cache keyed by
/// the exact normalized request key, a static-route map, and an ordered
/// dynamic-route list scanned linearly with first-match-wins semantics.
/// Static and dynamic structures are populated during the single-threaded
/// configuration phase and only read afterwards; the cache is the one
/// structure written during concurrent request handling. Cache races may
/// redo a lookup, never corrupt one — last write wins, and every write
/// stores some valid descriptor for its key.
pub struct RouteTable {
	statics: HashMap<RouteKey, Arc<HandlerDescriptor>>,
	dynamics: Vec<(Method, Arc<HandlerDescriptor>)>,
	cache: RwLock<HashMap<RouteKey, Arc<HandlerDescriptor>>>,
}

impl RouteTable {
	pub fn new() -> Self {
		Self {
			statics: HashMap::new(),
			dynamics: Vec::new(),
			cache: RwLock::new(HashMap::new()),
		}
	}

	/// Registers a descriptor under every method it accepts.
	///
	/// Static URLs land in the static map (re-registering the same key
	/// replaces the previous descriptor, with a warning); dynamic URLs are
	/// appended to the scan list in registration order, which is also match
	/// precedence order.
	pub fn register(&mut self, descriptor: HandlerDescriptor) {
		let descriptor = Arc::new(descriptor);
		for method in descriptor.methods().to_vec() {
			if descriptor.pattern().is_static() {
				let key = RouteKey::new(descriptor.pattern().declared(), method.clone());
				debug!(route = %key, handler = descriptor.name(), "registering static route");
				if self
					.statics
					.insert(key.clone(), descriptor.clone())
					.is_some()
				{
					warn!(route = %key, "static route re-registered, replacing previous handler");
				}
			} else {
				debug!(
					pattern = descriptor.pattern().declared(),
					method = %method,
					handler = descriptor.name(),
					"registering dynamic route"
				);
				self.dynamics.push((method.clone(), descriptor.clone()));
			}
		}
	}

	/// Drops every registration and the whole cache, then registers the
	/// given descriptors from scratch. Stop-the-world relative to dispatch:
	/// callers must not run this concurrently with live resolution.
	pub fn reload(&mut self, descriptors: Vec<HandlerDescriptor>) {
		self.statics.clear();
		self.dynamics.clear();
		self.cache.write().clear();
		for descriptor in descriptors {
			self.register(descriptor);
		}
	}

	/// Number of registered route entries (method keys counted separately).
	pub fn len(&self) -> usize {
		self.statics.len() + self.dynamics.len()
	}

	pub fn is_empty(&self) -> bool {
		self.statics.is_empty() && self.dynamics.is_empty()
	}

	/// Resolves the request's URL and method to a descriptor, feeding any
	/// extracted path variables into the request's parameter store.
	///
	/// Lookup order: cache, static map, dynamic scan. A URL that misses may
	/// carry a format suffix (`/users/42.json`); the suffix is then
	/// stripped and the base URL resolved, and the suffix must be among the
	/// descriptor's acceptable formats — an unsupported format is a
	/// [`Error::RouteNotFound`], indistinguishable from a missing route.
	pub fn resolve(&self, request: &mut Request) -> Result<Arc<HandlerDescriptor>> {
		let path = request.path().to_string();
		let method = request.method.clone();

		let (descriptor, matched_path, format) = match self.lookup(&path, &method) {
			Some(descriptor) => (descriptor, path.clone(), None),
			None => {
				let Some((base, suffix)) = split_format_suffix(&path) else {
					return Err(Error::RouteNotFound {
						url: path,
						method,
					});
				};
				let Some(descriptor) = self.lookup(base, &method) else {
					return Err(Error::RouteNotFound {
						url: path,
						method,
					});
				};
				if !descriptor.accepts_format(suffix) {
					debug!(
						url = %path,
						format = suffix,
						handler = descriptor.name(),
						"format suffix not accepted by handler"
					);
					return Err(Error::RouteNotFound {
						url: path,
						method,
					});
				}
				(descriptor, base.to_string(), Some(suffix.to_string()))
			}
		};

		// Dynamic matches re-extract against the declared URL and the
		// actual request URL, on every resolution including cache hits.
		if !descriptor.pattern().is_static() {
			for (name, value) in descriptor.pattern().extract(&matched_path) {
				let decoded = percent_decode_str(&value).decode_utf8_lossy().into_owned();
				request.set_param(name, decoded);
			}
		}
		if let Some(format) = format {
			request.set_param("format", format);
		}

		Ok(descriptor)
	}

	/// Cache, then static map, then dynamic scan. Successful static or
	/// dynamic lookups are memoized under the exact normalized key.
	fn lookup(&self, url: &str, method: &Method) -> Option<Arc<HandlerDescriptor>> {
		let key = RouteKey::new(url, method.clone());

		if let Some(descriptor) = self.cache.read().get(&key) {
			debug!(route = %key, "route cache hit");
			return Some(descriptor.clone());
		}

		let found = self.statics.get(&key).cloned().or_else(|| {
			let normalized = normalize_url(url);
			self.dynamics
				.iter()
				.find(|(m, descriptor)| m == method && descriptor.pattern().matches(&normalized))
				.map(|(_, descriptor)| descriptor.clone())
		});

		if let Some(descriptor) = &found {
			debug!(route = %key, handler = descriptor.name(), "route resolved, caching");
			self.cache.write().insert(key, descriptor.clone());
		}
		found
	}
}

impl Default for RouteTable {
	fn default() -> Self {
		Self::new()
	}
}

/// Splits a trailing format suffix off the last path segment:
/// `/users/42.json` becomes `("/users/42", "json")`. Only alphanumeric
/// suffixes count; a dot elsewhere in the segment stays untouched.
fn split_format_suffix(path: &str) -> Option<(&str, &str)> {
	let dot = path.rfind('.')?;
	let slash = path.rfind('/').unwrap_or(0);
	if dot <= slash {
		return None;
	}
	let suffix = &path[dot + 1..];
	if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
		return None;
	}
	Some((&path[..dot], suffix))
}
