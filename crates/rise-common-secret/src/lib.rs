// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for credentials handled during provisioning.
//!
//! App-only client secrets and the bearer tokens exchanged for them travel
//! through configuration, HTTP clients and log statements. [`Secret<T>`] keeps
//! them out of every formatted or serialized representation:
//!
//! - `Debug` prints `Secret("[REDACTED]")`, `Display` prints `[REDACTED]`
//! - `Serialize` writes `"[REDACTED]"`, so config dumps never carry the value
//! - the inner value is zeroized on drop
//! - the only way in is an explicit `.expose()`
//!
//! ```
//! use rise_common_secret::Secret;
//!
//! let client_secret = Secret::new("app-only-secret".to_string());
//! assert_eq!(format!("{client_secret}"), "[REDACTED]");
//! assert_eq!(client_secret.expose(), "app-only-secret");
//! ```

mod env;

use std::fmt;
use zeroize::Zeroize;

pub use env::{load_secret_env, SecretEnvError};

/// Placeholder written wherever a secret would otherwise appear.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must never reach logs, config dumps or error messages.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// Client secrets, access tokens and similar string credentials.
pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Access the wrapped value. Call sites opt in explicitly so that secret
	/// access stays visible in review.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	/// Returns a copy of the inner value; the original is still zeroized on drop.
	pub fn into_inner(self) -> T
	where
		T: Clone,
	{
		self.inner.clone()
	}
}

impl SecretString {
	/// `true` when the wrapped string is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.inner.trim().is_empty()
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Serialize + Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let secret = Secret::new("client-secret-value".to_string());

		let debug = format!("{secret:?}");
		let display = format!("{secret}");

		assert!(!debug.contains("client-secret-value"));
		assert!(debug.contains(REDACTED));
		assert_eq!(display, REDACTED);
	}

	#[test]
	fn expose_returns_inner_value() {
		let secret = Secret::new("token".to_string());
		assert_eq!(secret.expose(), "token");
		assert_eq!(secret.into_inner(), "token");
	}

	#[test]
	fn blank_detection() {
		assert!(Secret::new("  ".to_string()).is_blank());
		assert!(!Secret::new("x".to_string()).is_blank());
	}

	#[test]
	fn option_secret_debug_is_redacted() {
		let secret: Option<SecretString> = Some(Secret::new("bearer-value".to_string()));
		let debug = format!("{secret:?}");
		assert!(!debug.contains("bearer-value"));
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serialize_is_redacted_and_deserialize_populates() {
		let secret = Secret::new("client-secret-value".to_string());
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, format!("\"{REDACTED}\""));

		let parsed: SecretString = serde_json::from_str("\"abc\"").unwrap();
		assert_eq!(parsed.expose(), "abc");
	}

	proptest! {
			#[test]
			fn formatted_output_never_contains_secret(inner in "[a-zA-Z0-9!@#$%^&*_+=;:,.<>?/-]{3,50}") {
					prop_assume!(!inner.contains("REDACTED"));
					prop_assume!(!inner.contains("Secret"));

					let secret = Secret::new(inner.clone());
					let debug_out = format!("{secret:?}");
					let display_out = format!("{secret}");
					prop_assert!(!debug_out.contains(&inner));
					prop_assert!(!display_out.contains(&inner));
			}
	}
}
