// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Failures decoding or encoding the shared metadata document.
#[derive(Debug, Error)]
pub enum DocumentError {
	#[error("metadata document is not valid UTF-8: {0}")]
	Utf8(#[from] std::string::FromUtf8Error),

	#[error("metadata document JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CoreMetadataError {
	#[error("core metadata is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
}
