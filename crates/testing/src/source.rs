// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use demarcate_core::{JoinPoint, TransactionAttribute, TransactionAttributeSource};
use demarcate_type::{Result, TransactionError};
use parking_lot::Mutex;

/// Attribute source keyed by method name that counts its lookups.
#[derive(Default)]
pub struct CountingSource {
	attributes: HashMap<String, Arc<TransactionAttribute>>,
	lookups: AtomicUsize,
	per_join_point: Mutex<HashMap<JoinPoint, usize>>,
}

impl CountingSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, method: impl Into<String>, attribute: TransactionAttribute) -> Self {
		self.attributes.insert(method.into(), Arc::new(attribute));
		self
	}

	/// Total number of lookups.
	pub fn lookups(&self) -> usize {
		self.lookups.load(Ordering::SeqCst)
	}

	pub fn lookups_of(&self, join_point: &JoinPoint) -> usize {
		self.per_join_point.lock().get(join_point).copied().unwrap_or(0)
	}
}

impl TransactionAttributeSource for CountingSource {
	fn lookup(&self, join_point: &JoinPoint) -> Result<Option<Arc<TransactionAttribute>>> {
		self.lookups.fetch_add(1, Ordering::SeqCst);
		*self.per_join_point.lock().entry(join_point.clone()).or_default() += 1;
		Ok(self.attributes.get(join_point.method()).cloned())
	}
}

/// Attribute source whose every lookup fails.
pub struct FailingSource {
	message: String,
}

impl FailingSource {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

impl TransactionAttributeSource for FailingSource {
	fn lookup(&self, join_point: &JoinPoint) -> Result<Option<Arc<TransactionAttribute>>> {
		Err(TransactionError::AttributeSource {
			join_point: join_point.identification(),
			message: self.message.clone(),
		})
	}
}
