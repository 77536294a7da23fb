// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	ops::Deref,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use demarcate_type::{Result, TransactionError};
use uuid::Uuid;

use crate::attribute::TransactionAttribute;

/// A unique identifier for a transaction using UUIDv7 for time-ordered
/// uniqueness
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransactionId(Uuid);

impl Default for TransactionId {
	fn default() -> Self {
		Self::generate()
	}
}

impl Deref for TransactionId {
	type Target = Uuid;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl TransactionId {
	pub fn generate() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Display for TransactionId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// What a status stands for in the manager that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
	/// A physical transaction started by this begin call.
	New,
	/// Participation in a transaction started further up the call chain.
	Participating,
	/// No transaction, e.g. `Supports` without an active one, or `NotSupported`
	/// with the outer transaction suspended.
	Empty,
}

/// Handle to a transaction as seen by the code running inside it.
///
/// Created by a manager's begin operation and only completed by that same
/// manager. Clones share state, so marking one clone rollback-only is visible
/// through all of them.
#[derive(Debug, Clone)]
pub struct TransactionStatus {
	inner: Arc<StatusInner>,
}

#[derive(Debug)]
struct StatusInner {
	id: TransactionId,
	kind: StatusKind,
	name: Option<String>,
	read_only: bool,
	rollback_only: AtomicBool,
	completed: AtomicBool,
}

impl TransactionStatus {
	pub fn new(kind: StatusKind, attribute: &TransactionAttribute) -> Self {
		Self::with_id(TransactionId::generate(), kind, attribute)
	}

	/// A status sharing the transaction id of the transaction it participates in.
	pub fn with_id(id: TransactionId, kind: StatusKind, attribute: &TransactionAttribute) -> Self {
		Self {
			inner: Arc::new(StatusInner {
				id,
				kind,
				name: attribute.name().map(str::to_string),
				read_only: attribute.is_read_only(),
				rollback_only: AtomicBool::new(false),
				completed: AtomicBool::new(false),
			}),
		}
	}

	pub fn id(&self) -> TransactionId {
		self.inner.id
	}

	pub fn kind(&self) -> StatusKind {
		self.inner.kind
	}

	pub fn is_new_transaction(&self) -> bool {
		self.inner.kind == StatusKind::New
	}

	/// False for the empty placeholder status.
	pub fn has_transaction(&self) -> bool {
		self.inner.kind != StatusKind::Empty
	}

	pub fn name(&self) -> Option<&str> {
		self.inner.name.as_deref()
	}

	pub fn is_read_only(&self) -> bool {
		self.inner.read_only
	}

	/// Make the only possible outcome of the transaction a rollback.
	pub fn set_rollback_only(&self) {
		self.inner.rollback_only.store(true, Ordering::Release);
	}

	pub fn is_rollback_only(&self) -> bool {
		self.inner.rollback_only.load(Ordering::Acquire)
	}

	pub fn is_completed(&self) -> bool {
		self.inner.completed.load(Ordering::Acquire)
	}

	/// Called by the owning manager once it committed or rolled back.
	pub fn mark_completed(&self) -> Result<()> {
		if self.inner.completed.swap(true, Ordering::AcqRel) {
			return Err(TransactionError::illegal_state(format!(
				"transaction {} is already completed - do not call commit or rollback more than once per transaction",
				self.inner.id
			)));
		}
		Ok(())
	}

	/// Whether both handles refer to the same begin call.
	pub fn same(&self, other: &TransactionStatus) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rollback_only_is_shared_between_clones() {
		let status = TransactionStatus::new(StatusKind::New, &TransactionAttribute::required());
		let clone = status.clone();
		clone.set_rollback_only();
		assert!(status.is_rollback_only());
		assert!(status.same(&clone));
	}

	#[test]
	fn test_complete_twice() {
		let status = TransactionStatus::new(StatusKind::New, &TransactionAttribute::required());
		assert!(status.mark_completed().is_ok());
		assert!(status.is_completed());
		assert!(matches!(status.mark_completed(), Err(TransactionError::IllegalState(_))));
	}

	#[test]
	fn test_participating_shares_id() {
		let attr = TransactionAttribute::required().with_name("bank::AccountService.transfer").read_only();
		let outer = TransactionStatus::new(StatusKind::New, &attr);
		let inner = TransactionStatus::with_id(outer.id(), StatusKind::Participating, &attr);
		assert_eq!(outer.id(), inner.id());
		assert!(!outer.same(&inner));
		assert!(!inner.is_new_transaction());
		assert!(inner.has_transaction());
		assert!(inner.is_read_only());
		assert_eq!(inner.name(), Some("bank::AccountService.transfer"));
	}
}
