// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use demarcate_core::{
	CallbackOutcome, CallbackTransactionManager, TransactionAttribute, TransactionCallback, TransactionManager,
};
use demarcate_type::Result;
use parking_lot::Mutex;

use crate::transaction::MemoryTransactionManager;

/// Callback-preferring manager over a [`MemoryTransactionManager`].
///
/// Records the outcome of every callback it ran. Rolls back on
/// [`CallbackOutcome::RollbackOnly`] and commits otherwise.
#[derive(Clone, Default)]
pub struct RecordingCallbackManager {
	inner: Arc<MemoryTransactionManager>,
	outcomes: Arc<Mutex<Vec<CallbackOutcome>>>,
}

impl RecordingCallbackManager {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn transactions(&self) -> &MemoryTransactionManager {
		&self.inner
	}

	pub fn outcomes(&self) -> Vec<CallbackOutcome> {
		self.outcomes.lock().clone()
	}
}

impl CallbackTransactionManager for RecordingCallbackManager {
	fn execute(&self, attribute: &TransactionAttribute, callback: &mut TransactionCallback<'_>) -> Result<CallbackOutcome> {
		let status = self.inner.begin(attribute)?;
		let outcome = callback(&status);
		self.outcomes.lock().push(outcome);

		if outcome.commits() {
			self.inner.commit(&status)?;
		} else {
			self.inner.rollback(&status)?;
		}
		Ok(outcome)
	}
}
