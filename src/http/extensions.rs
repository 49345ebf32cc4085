//! Typed per-request extension store and the authenticated-principal record.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// A type-keyed store for request-scoped values.
///
/// Middleware and host glue use this to hand typed data (such as
/// [`AuthState`]) to the dispatch core without widening the request struct.
#[derive(Default)]
pub struct Extensions {
	map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a value, replacing any previous value of the same type.
	pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
		self.map.insert(TypeId::of::<T>(), Box::new(value));
	}

	/// Returns a reference to the stored value of type `T`, if any.
	pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
		self.map
			.get(&TypeId::of::<T>())
			.and_then(|boxed| boxed.downcast_ref())
	}

	/// Removes and returns the stored value of type `T`, if any.
	pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
		self.map
			.remove(&TypeId::of::<T>())
			.and_then(|boxed| boxed.downcast().ok())
			.map(|boxed| *boxed)
	}

	pub fn is_empty(&self) -> bool {
		self.map.is_empty()
	}
}

/// The authenticated principal attached to a request by host-side
/// authentication, consumed by the authorization check.
///
/// # Examples
///
/// ```
/// use cotopaxi::http::AuthState;
///
/// let principal = AuthState::authenticated("u-17", ["editor"]);
/// assert!(principal.is_authenticated());
/// assert!(principal.has_role("editor"));
/// assert!(!principal.has_role("admin"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
	user_id: String,
	authenticated: bool,
	roles: Vec<String>,
}

impl AuthState {
	/// An authenticated principal with the given roles.
	pub fn authenticated<I, S>(user_id: impl Into<String>, roles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			user_id: user_id.into(),
			authenticated: true,
			roles: roles.into_iter().map(Into::into).collect(),
		}
	}

	/// An anonymous (unauthenticated) principal.
	pub fn anonymous() -> Self {
		Self {
			user_id: String::new(),
			authenticated: false,
			roles: Vec::new(),
		}
	}

	pub fn user_id(&self) -> &str {
		&self.user_id
	}

	pub fn is_authenticated(&self) -> bool {
		self.authenticated
	}

	pub fn has_role(&self, role: &str) -> bool {
		self.authenticated && self.roles.iter().any(|r| r == role)
	}
}
