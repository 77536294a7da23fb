// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use demarcate_core::{JoinPoint, TransactionAttribute, TransactionAttributeSource};
use demarcate_type::Result;

use super::pattern::simple_match;

/// Attributes keyed by method name patterns, regardless of the type.
///
/// An exact method name wins over patterns; among patterns the longest
/// matching one wins, and among equally long ones the first added.
#[derive(Debug, Default)]
pub struct NameMatchAttributeSource {
	mappings: Vec<(String, Arc<TransactionAttribute>)>,
}

impl NameMatchAttributeSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, pattern: impl Into<String>, attribute: TransactionAttribute) -> Self {
		self.add(pattern, attribute);
		self
	}

	/// Adding the same pattern again replaces its attribute.
	pub fn add(&mut self, pattern: impl Into<String>, attribute: TransactionAttribute) {
		let pattern = pattern.into();
		let attribute = Arc::new(attribute);
		match self.mappings.iter_mut().find(|(p, _)| *p == pattern) {
			Some(existing) => existing.1 = attribute,
			None => self.mappings.push((pattern, attribute)),
		}
	}
}

impl TransactionAttributeSource for NameMatchAttributeSource {
	fn lookup(&self, join_point: &JoinPoint) -> Result<Option<Arc<TransactionAttribute>>> {
		let method = join_point.method();

		if let Some((_, attribute)) = self.mappings.iter().find(|(pattern, _)| pattern == method) {
			return Ok(Some(attribute.clone()));
		}

		let mut best: Option<&(String, Arc<TransactionAttribute>)> = None;
		for mapping in &self.mappings {
			if simple_match(&mapping.0, method) && best.is_none_or(|(b, _)| mapping.0.len() > b.len()) {
				best = Some(mapping);
			}
		}
		Ok(best.map(|(_, attribute)| attribute.clone()))
	}
}
