// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use demarcate_core::{ClassifiedError, ErrorKind};

/// Application error with a configurable lineage and kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TestError {
	message: String,
	lineage: Vec<&'static str>,
	kind: ErrorKind,
}

impl TestError {
	pub fn new(kind: ErrorKind, lineage: &[&'static str], message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			lineage: lineage.to_vec(),
			kind,
		}
	}

	/// A bug-like failure, lineage `test::Unexpected`.
	pub fn unexpected(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Unexpected, &["test::Unexpected"], message)
	}

	/// A business failure, lineage `test::Expected`.
	pub fn expected(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Expected, &["test::Expected"], message)
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

impl ClassifiedError for TestError {
	fn lineage(&self) -> Vec<&str> {
		self.lineage.clone()
	}

	fn kind(&self) -> ErrorKind {
		self.kind
	}
}
