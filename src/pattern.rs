//! URL pattern compilation and matching.
//!
//! A declared route URL may contain `{identifier}` placeholder segments,
//! e.g. `/users/{id}/posts/{post_id}`. A URL with no placeholder is *static*
//! and matched by key equality; a URL with placeholders is *dynamic* and
//! compiled to an anchored regex where each placeholder becomes a token
//! group `[a-zA-Z_0-9]+`.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

/// Maximum allowed length for a route pattern string in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a route pattern.
const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled pattern regex in bytes.
const MAX_REGEX_SIZE: usize = 1 << 20;

/// A compiled route pattern.
///
/// Keeps the declared URL exactly as registered (parameter extraction pairs
/// the declared segments against the actual request URL, preserving the
/// request's original casing) alongside the regex compiled from the
/// *normalized* form, which is what request keys are matched against.
#[derive(Debug, Clone)]
pub struct RoutePattern {
	declared: String,
	regex: Option<Regex>,
	param_names: Vec<String>,
}

impl RoutePattern {
	/// Compiles a declared route URL.
	///
	/// Static URLs (no `{...}` segment) carry no regex; dynamic URLs are
	/// compiled with every placeholder replaced by a `[a-zA-Z_0-9]+` group,
	/// anchored at both ends so only full-string matches count.
	///
	/// # Examples
	///
	/// ```
	/// use cotopaxi::pattern::RoutePattern;
	///
	/// let stat = RoutePattern::new("/hello").unwrap();
	/// assert!(stat.is_static());
	///
	/// let dyn_ = RoutePattern::new("/user/{id}").unwrap();
	/// assert!(!dyn_.is_static());
	/// assert!(dyn_.matches("/user/42"));
	/// assert!(!dyn_.matches("/user/42/extra"));
	/// ```
	pub fn new(declared: &str) -> Result<Self> {
		if declared.len() > MAX_PATTERN_LENGTH {
			return Err(Error::Pattern {
				pattern: declared.to_string(),
				message: format!("pattern exceeds {} bytes", MAX_PATTERN_LENGTH),
			});
		}
		if declared.split('/').count() > MAX_PATH_SEGMENTS {
			return Err(Error::Pattern {
				pattern: declared.to_string(),
				message: format!("pattern exceeds {} segments", MAX_PATH_SEGMENTS),
			});
		}

		let param_names = Self::collect_param_names(declared)?;
		let regex = if param_names.is_empty() {
			None
		} else {
			let source = Self::compile(&crate::route::normalize_url(declared));
			let regex = RegexBuilder::new(&source)
				.size_limit(MAX_REGEX_SIZE)
				.build()
				.map_err(|e| Error::Pattern {
					pattern: declared.to_string(),
					message: e.to_string(),
				})?;
			Some(regex)
		};

		Ok(Self {
			declared: declared.to_string(),
			regex,
			param_names,
		})
	}

	/// Collects placeholder names in order of appearance, rejecting empty
	/// or malformed placeholders.
	fn collect_param_names(pattern: &str) -> Result<Vec<String>> {
		let mut names = Vec::new();
		for segment in pattern.split('/') {
			if let Some(inner) = segment.strip_prefix('{') {
				let name = inner.strip_suffix('}').unwrap_or("");
				if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
				{
					return Err(Error::Pattern {
						pattern: pattern.to_string(),
						message: format!("malformed placeholder segment '{}'", segment),
					});
				}
				names.push(name.to_string());
			} else if segment.contains('{') || segment.contains('}') {
				return Err(Error::Pattern {
					pattern: pattern.to_string(),
					message: format!("braces must span a whole segment, got '{}'", segment),
				});
			}
		}
		Ok(names)
	}

	/// Builds the anchored regex source for a normalized dynamic pattern.
	fn compile(normalized: &str) -> String {
		let mut source = String::from("^");
		for (i, segment) in normalized.split('/').enumerate() {
			if i > 0 {
				source.push('/');
			}
			if segment.starts_with('{') && segment.ends_with('}') {
				source.push_str("[a-zA-Z_0-9]+");
			} else {
				source.push_str(&regex::escape(segment));
			}
		}
		source.push('$');
		source
	}

	/// The route URL exactly as declared.
	pub fn declared(&self) -> &str {
		&self.declared
	}

	/// Placeholder names in order of appearance.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Whether the pattern contains no placeholder segment.
	pub fn is_static(&self) -> bool {
		self.regex.is_none()
	}

	/// Full-string match of a *normalized* request URL against this pattern.
	///
	/// Static patterns compare normalized strings; dynamic patterns use the
	/// compiled regex. Partial matches never count.
	pub fn matches(&self, normalized_url: &str) -> bool {
		match &self.regex {
			Some(regex) => regex.is_match(normalized_url),
			None => crate::route::normalize_url(&self.declared) == normalized_url,
		}
	}

	/// Pairs placeholder segments positionally against an actual request URL.
	///
	/// Both the declared pattern and the URL are split on `/`; a placeholder
	/// at position *i* binds to the URL token at position *i*. Callers must
	/// only pass URLs that already matched this pattern, which guarantees
	/// equal segment counts.
	pub fn extract(&self, actual_url: &str) -> Vec<(String, String)> {
		let mut pairs = Vec::with_capacity(self.param_names.len());
		for (declared, actual) in self.declared.split('/').zip(actual_url.split('/')) {
			if let Some(inner) = declared.strip_prefix('{') {
				let name = inner.trim_end_matches('}');
				pairs.push((name.to_string(), actual.to_string()));
			}
		}
		pairs
	}
}

impl PartialEq for RoutePattern {
	fn eq(&self, other: &Self) -> bool {
		self.declared == other.declared
	}
}

impl Eq for RoutePattern {}

impl std::fmt::Display for RoutePattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.declared)
	}
}
