// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, sync::Arc};

use demarcate_core::{JoinPoint, TransactionAttribute, TransactionAttributeSource};
use demarcate_type::Result;

use super::pattern::simple_match;

/// Attributes registered per join point.
///
/// A join point registered without a target type also covers invocations of
/// the same method dispatched on any target type; a registration with a
/// target type takes precedence for that target.
///
/// Patterns of the form `Type.method*` are matched against the qualified
/// method name when no join point was registered exactly; the longest
/// matching pattern wins.
#[derive(Debug, Default)]
pub struct MethodMapAttributeSource {
	attributes: HashMap<JoinPoint, Arc<TransactionAttribute>>,
	patterns: Vec<(String, Arc<TransactionAttribute>)>,
}

impl MethodMapAttributeSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, join_point: JoinPoint, attribute: TransactionAttribute) -> Self {
		self.add(join_point, attribute);
		self
	}

	pub fn add(&mut self, join_point: JoinPoint, attribute: TransactionAttribute) {
		self.attributes.insert(join_point, Arc::new(attribute));
	}

	pub fn with_pattern(mut self, pattern: impl Into<String>, attribute: TransactionAttribute) -> Self {
		self.add_pattern(pattern, attribute);
		self
	}

	/// Register `attribute` for every method whose qualified name matches `pattern`.
	pub fn add_pattern(&mut self, pattern: impl Into<String>, attribute: TransactionAttribute) {
		let pattern = pattern.into();
		let attribute = Arc::new(attribute);
		match self.patterns.iter_mut().find(|(existing, _)| *existing == pattern) {
			Some(existing) => existing.1 = attribute,
			None => self.patterns.push((pattern, attribute)),
		}
	}

	pub fn len(&self) -> usize {
		self.attributes.len() + self.patterns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.attributes.is_empty() && self.patterns.is_empty()
	}

	fn matching_pattern(&self, join_point: &JoinPoint) -> Option<Arc<TransactionAttribute>> {
		let identification = join_point.identification();
		let declared = format!("{}.{}", join_point.declaring_type(), join_point.method());

		let mut best: Option<&(String, Arc<TransactionAttribute>)> = None;
		for mapping in &self.patterns {
			let matched = simple_match(&mapping.0, &identification) || simple_match(&mapping.0, &declared);
			if matched && best.is_none_or(|(b, _)| mapping.0.len() > b.len()) {
				best = Some(mapping);
			}
		}
		best.map(|(_, attribute)| attribute.clone())
	}
}

impl TransactionAttributeSource for MethodMapAttributeSource {
	fn lookup(&self, join_point: &JoinPoint) -> Result<Option<Arc<TransactionAttribute>>> {
		if let Some(attribute) = self.attributes.get(join_point) {
			return Ok(Some(attribute.clone()));
		}
		if join_point.target_type().is_some() {
			let declared = JoinPoint::new(join_point.declaring_type(), join_point.method());
			if let Some(attribute) = self.attributes.get(&declared) {
				return Ok(Some(attribute.clone()));
			}
		}
		Ok(self.matching_pattern(join_point))
	}
}

#[cfg(test)]
mod tests {
	use demarcate_core::{JoinPoint, TransactionAttribute, TransactionAttributeSource};

	use super::MethodMapAttributeSource;

	#[test]
	fn test_exact_lookup() {
		let source = MethodMapAttributeSource::new()
			.with(JoinPoint::new("bank::AccountService", "transfer"), TransactionAttribute::required());

		let found = source.lookup(&JoinPoint::new("bank::AccountService", "transfer")).unwrap();
		assert_eq!(found.as_deref(), Some(&TransactionAttribute::required()));
		assert!(source.lookup(&JoinPoint::new("bank::AccountService", "balance")).unwrap().is_none());
	}

	#[test]
	fn test_declared_registration_covers_targets() {
		let source = MethodMapAttributeSource::new()
			.with(JoinPoint::new("bank::AccountService", "transfer"), TransactionAttribute::required())
			.with(
				JoinPoint::new("bank::AccountService", "transfer").with_target("bank::AuditedAccountService"),
				TransactionAttribute::requires_new(),
			);

		let jdbc = JoinPoint::new("bank::AccountService", "transfer").with_target("bank::JdbcAccountService");
		assert_eq!(source.lookup(&jdbc).unwrap().as_deref(), Some(&TransactionAttribute::required()));

		let audited = JoinPoint::new("bank::AccountService", "transfer").with_target("bank::AuditedAccountService");
		assert_eq!(source.lookup(&audited).unwrap().as_deref(), Some(&TransactionAttribute::requires_new()));
	}

	#[test]
	fn test_pattern_registration() {
		let source = MethodMapAttributeSource::new()
			.with_pattern("bank::AccountService.get*", TransactionAttribute::supports().read_only())
			.with_pattern("bank::AccountService.getAndLock*", TransactionAttribute::required())
			.with(JoinPoint::new("bank::AccountService", "getOwner"), TransactionAttribute::requires_new());

		let lookup = |method: &str| source.lookup(&JoinPoint::new("bank::AccountService", method)).unwrap();

		assert_eq!(lookup("getBalance").as_deref(), Some(&TransactionAttribute::supports().read_only()));
		assert_eq!(lookup("getAndLockBalance").as_deref(), Some(&TransactionAttribute::required()));
		assert_eq!(lookup("getOwner").as_deref(), Some(&TransactionAttribute::requires_new()));
		assert!(lookup("transfer").is_none());
		assert_eq!(source.len(), 3);
	}
}
