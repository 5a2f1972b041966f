// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Loading credentials from `VAR` or `VAR_FILE`.

use std::path::PathBuf;
use std::{env, fs};

use thiserror::Error;

use crate::SecretString;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	/// The file named by `VAR_FILE` could not be read.
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// `VAR_FILE` was set but empty.
	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Load an app-only credential from the environment.
///
/// `{var}_FILE` wins over `{var}`: when it is set, the secret is read from the
/// named file and a single trailing newline is stripped. Returns `Ok(None)`
/// when neither variable is present.
///
/// ```no_run
/// use rise_common_secret::load_secret_env;
///
/// if let Some(secret) = load_secret_env("RISE_GRAPH_CLIENT_SECRET")? {
///     println!("client secret configured: {secret}"); // prints "[REDACTED]"
/// }
/// # Ok::<(), rise_common_secret::SecretEnvError>(())
/// ```
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;

		let value = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(value)));
	}

	Ok(env::var(var).ok().map(SecretString::new))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn missing_variables_yield_none() {
		let var = "RISE_TEST_SECRET_ABSENT";
		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));

		assert!(load_secret_env(var).unwrap().is_none());
	}

	#[test]
	fn direct_variable_is_used() {
		let var = "RISE_TEST_SECRET_DIRECT";
		env::set_var(var, "direct-value");
		env::remove_var(format!("{var}_FILE"));

		let secret = load_secret_env(var).unwrap().unwrap();
		assert_eq!(secret.expose(), "direct-value");

		env::remove_var(var);
	}

	/// A mounted secret file beats the plain variable and loses one trailing
	/// newline.
	#[test]
	fn file_variable_takes_precedence() {
		let var = "RISE_TEST_SECRET_PRECEDENCE";
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();

		env::set_var(var, "from-env");
		env::set_var(format!("{var}_FILE"), file.path().to_str().unwrap());

		let secret = load_secret_env(var).unwrap().unwrap();
		assert_eq!(secret.expose(), "from-file");

		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn content_without_newline_is_preserved() {
		let var = "RISE_TEST_SECRET_NO_NEWLINE";
		let mut file = NamedTempFile::new().unwrap();
		write!(file, "exact\n\n").unwrap();

		env::set_var(format!("{var}_FILE"), file.path().to_str().unwrap());

		let secret = load_secret_env(var).unwrap().unwrap();
		assert_eq!(secret.expose(), "exact\n");

		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn unreadable_file_is_an_error() {
		let var = "RISE_TEST_SECRET_MISSING_FILE";
		env::set_var(format!("{var}_FILE"), "/nonexistent/rise/secret");

		assert!(matches!(
			load_secret_env(var),
			Err(SecretEnvError::Io { .. })
		));

		env::remove_var(format!("{var}_FILE"));
	}

	#[test]
	fn empty_file_path_is_an_error() {
		let var = "RISE_TEST_SECRET_EMPTY_PATH";
		env::set_var(format!("{var}_FILE"), "");

		assert!(matches!(
			load_secret_env(var),
			Err(SecretEnvError::EmptyPath { .. })
		));

		env::remove_var(format!("{var}_FILE"));
	}
}
