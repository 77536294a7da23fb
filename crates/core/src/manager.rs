// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Debug, Formatter},
	sync::Arc,
};

use demarcate_type::Result;

use crate::{attribute::TransactionAttribute, status::TransactionStatus};

/// A manager that exposes separate begin, commit and rollback steps.
///
/// Shared across all call chains; implementations must be safe for
/// concurrent use.
pub trait TransactionManager: Send + Sync {
	/// Start a transaction or join the active one, according to the
	/// attribute's propagation.
	fn begin(&self, attribute: &TransactionAttribute) -> Result<TransactionStatus>;

	/// Commit the work of `status`. A status marked rollback-only is rolled
	/// back instead.
	fn commit(&self, status: &TransactionStatus) -> Result<()>;

	fn rollback(&self, status: &TransactionStatus) -> Result<()>;
}

/// What the unit of work run by a callback-preferring manager asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackOutcome {
	/// Finished normally; commit.
	Completed,
	/// Finished with an error that does not roll back; commit, the caller
	/// raises the error afterwards.
	Deferred,
	/// Finished with an error that rolls back.
	RollbackOnly,
}

impl CallbackOutcome {
	pub fn commits(&self) -> bool {
		!matches!(self, CallbackOutcome::RollbackOnly)
	}
}

/// The unit of work handed to [`CallbackTransactionManager::execute`].
pub type TransactionCallback<'a> = dyn FnMut(&TransactionStatus) -> CallbackOutcome + 'a;

/// A manager that wraps a whole unit of work in a single call.
pub trait CallbackTransactionManager: Send + Sync {
	/// Run `callback` exactly once inside a transaction described by
	/// `attribute`, then commit or roll back according to the returned
	/// outcome and report that outcome.
	fn execute(&self, attribute: &TransactionAttribute, callback: &mut TransactionCallback<'_>) -> Result<CallbackOutcome>;
}

/// A transaction manager together with the capability it was registered with.
#[derive(Clone)]
pub enum ManagerRef {
	Status(Arc<dyn TransactionManager>),
	Callback(Arc<dyn CallbackTransactionManager>),
}

impl ManagerRef {
	pub fn status(manager: impl TransactionManager + 'static) -> Self {
		Self::Status(Arc::new(manager))
	}

	pub fn callback(manager: impl CallbackTransactionManager + 'static) -> Self {
		Self::Callback(Arc::new(manager))
	}

	pub fn is_callback(&self) -> bool {
		matches!(self, ManagerRef::Callback(_))
	}

	pub fn as_status(&self) -> Option<&Arc<dyn TransactionManager>> {
		match self {
			ManagerRef::Status(manager) => Some(manager),
			ManagerRef::Callback(_) => None,
		}
	}

	/// Whether both refer to the same manager instance.
	pub fn same(&self, other: &ManagerRef) -> bool {
		match (self, other) {
			(ManagerRef::Status(a), ManagerRef::Status(b)) => Arc::ptr_eq(a, b),
			(ManagerRef::Callback(a), ManagerRef::Callback(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl Debug for ManagerRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ManagerRef::Status(_) => f.write_str("ManagerRef::Status"),
			ManagerRef::Callback(_) => f.write_str("ManagerRef::Callback"),
		}
	}
}

impl<M: TransactionManager + ?Sized> TransactionManager for Arc<M> {
	fn begin(&self, attribute: &TransactionAttribute) -> Result<TransactionStatus> {
		(**self).begin(attribute)
	}

	fn commit(&self, status: &TransactionStatus) -> Result<()> {
		(**self).commit(status)
	}

	fn rollback(&self, status: &TransactionStatus) -> Result<()> {
		(**self).rollback(status)
	}
}

impl<M: CallbackTransactionManager + ?Sized> CallbackTransactionManager for Arc<M> {
	fn execute(&self, attribute: &TransactionAttribute, callback: &mut TransactionCallback<'_>) -> Result<CallbackOutcome> {
		(**self).execute(attribute, callback)
	}
}
