// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use demarcate_core::{JoinPoint, TransactionAttribute, TransactionAttributeSource};
use demarcate_type::Result;

/// Asks each source in order; the first attribute found wins.
#[derive(Default)]
pub struct CompositeAttributeSource {
	sources: Vec<Arc<dyn TransactionAttributeSource>>,
}

impl CompositeAttributeSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, source: impl TransactionAttributeSource + 'static) -> Self {
		self.sources.push(Arc::new(source));
		self
	}

	pub fn add(&mut self, source: Arc<dyn TransactionAttributeSource>) {
		self.sources.push(source);
	}

	pub fn len(&self) -> usize {
		self.sources.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sources.is_empty()
	}
}

impl TransactionAttributeSource for CompositeAttributeSource {
	fn lookup(&self, join_point: &JoinPoint) -> Result<Option<Arc<TransactionAttribute>>> {
		for source in &self.sources {
			if let Some(attribute) = source.lookup(join_point)? {
				return Ok(Some(attribute));
			}
		}
		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use demarcate_core::{JoinPoint, TransactionAttribute, TransactionAttributeSource};
	use demarcate_testing::FailingSource;
	use demarcate_type::TransactionError;

	use super::CompositeAttributeSource;
	use crate::source::{MethodMapAttributeSource, NameMatchAttributeSource};

	#[test]
	fn test_first_source_wins() {
		let source = CompositeAttributeSource::new()
			.with(MethodMapAttributeSource::new().with(
				JoinPoint::new("bank::AccountService", "getBalance"),
				TransactionAttribute::required(),
			))
			.with(NameMatchAttributeSource::new().with("get*", TransactionAttribute::supports()));

		let exact = source.lookup(&JoinPoint::new("bank::AccountService", "getBalance")).unwrap();
		assert_eq!(exact.as_deref(), Some(&TransactionAttribute::required()));

		let fallback = source.lookup(&JoinPoint::new("bank::AccountService", "getOwner")).unwrap();
		assert_eq!(fallback.as_deref(), Some(&TransactionAttribute::supports()));

		assert!(source.lookup(&JoinPoint::new("bank::AccountService", "transfer")).unwrap().is_none());
	}

	#[test]
	fn test_source_error_propagates() {
		let source = CompositeAttributeSource::new()
			.with(FailingSource::new("metadata unavailable"))
			.with(NameMatchAttributeSource::new().with("*", TransactionAttribute::required()));

		let err = source.lookup(&JoinPoint::new("bank::AccountService", "transfer")).unwrap_err();
		assert!(matches!(err, TransactionError::AttributeSource { .. }));
	}

	#[test]
	fn test_hit_before_failing_source() {
		let source = CompositeAttributeSource::new()
			.with(NameMatchAttributeSource::new().with("get*", TransactionAttribute::supports()))
			.with(FailingSource::new("metadata unavailable"));

		let hit = source.lookup(&JoinPoint::new("bank::AccountService", "getBalance")).unwrap();
		assert_eq!(hit.as_deref(), Some(&TransactionAttribute::supports()));
		assert!(source.lookup(&JoinPoint::new("bank::AccountService", "transfer")).is_err());
	}
}
