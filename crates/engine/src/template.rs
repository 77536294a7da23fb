// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use demarcate_core::{
	CallbackOutcome, CallbackTransactionManager, TransactionAttribute, TransactionCallback, TransactionManager,
};
use demarcate_type::Result;
use tracing::{error, trace};

/// Exposes a status-based manager through the callback-preferring shape.
///
/// Begins a transaction, runs the callback, then commits on
/// [`CallbackOutcome::Completed`] and [`CallbackOutcome::Deferred`] and rolls
/// back on [`CallbackOutcome::RollbackOnly`]. A panicking callback is rolled
/// back before the panic continues.
pub struct CallbackAdapter<M> {
	manager: M,
}

impl<M: TransactionManager> CallbackAdapter<M> {
	pub fn new(manager: M) -> Self {
		Self {
			manager,
		}
	}

	pub fn manager(&self) -> &M {
		&self.manager
	}
}

impl<M: TransactionManager> CallbackTransactionManager for CallbackAdapter<M> {
	fn execute(&self, attribute: &TransactionAttribute, callback: &mut TransactionCallback<'_>) -> Result<CallbackOutcome> {
		let status = self.manager.begin(attribute)?;

		let outcome = match catch_unwind(AssertUnwindSafe(|| callback(&status))) {
			Ok(outcome) => outcome,
			Err(payload) => {
				if let Err(err) = self.manager.rollback(&status) {
					error!("Rollback after panicking callback failed: {}", err);
				}
				resume_unwind(payload);
			}
		};

		trace!("Callback of transaction {} finished with {:?}", status.id(), outcome);
		if outcome.commits() {
			self.manager.commit(&status)?;
		} else {
			self.manager.rollback(&status)?;
		}
		Ok(outcome)
	}
}
