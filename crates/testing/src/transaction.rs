// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use demarcate_core::{
	Propagation, StatusKind, TransactionAttribute, TransactionId, TransactionManager, TransactionStatus,
};
use demarcate_type::{Result, TransactionError};
use parking_lot::Mutex;

/// Something the [`MemoryTransactionManager`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	/// A status was handed out.
	Begin {
		id: TransactionId,
		kind: StatusKind,
		name: Option<String>,
	},
	/// A physical transaction committed.
	Commit {
		id: TransactionId,
	},
	/// A physical transaction rolled back.
	Rollback {
		id: TransactionId,
	},
	/// A participant asked for the whole transaction to roll back.
	RollbackOnly {
		id: TransactionId,
	},
}

#[derive(Default)]
struct State {
	/// `None` marks a region where the outer transaction is suspended.
	active: Vec<Option<TransactionId>>,
	suspensions: HashSet<TransactionId>,
	global_rollback_only: HashSet<TransactionId>,
	events: Vec<Event>,
	fail_begin: Option<String>,
	fail_commit: Option<String>,
	fail_rollback: Option<String>,
}

/// In-memory manager that applies propagation rules and records every call.
///
/// Tracks the active transaction of a single call chain; use one instance
/// per chain in concurrent tests.
#[derive(Default)]
pub struct MemoryTransactionManager {
	state: Mutex<State>,
}

impl MemoryTransactionManager {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<Event> {
		self.state.lock().events.clone()
	}

	pub fn begins(&self) -> usize {
		self.count(|e| matches!(e, Event::Begin { .. }))
	}

	pub fn commits(&self) -> usize {
		self.count(|e| matches!(e, Event::Commit { .. }))
	}

	pub fn rollbacks(&self) -> usize {
		self.count(|e| matches!(e, Event::Rollback { .. }))
	}

	/// Number of transactions currently open, suspended regions included.
	pub fn open(&self) -> usize {
		self.state.lock().active.len()
	}

	/// Make the next `begin` fail with a system error.
	pub fn fail_next_begin(&self, message: impl Into<String>) {
		self.state.lock().fail_begin = Some(message.into());
	}

	/// Make the next `commit` fail with a system error after rolling back.
	pub fn fail_next_commit(&self, message: impl Into<String>) {
		self.state.lock().fail_commit = Some(message.into());
	}

	/// Make the next `rollback` fail with a system error.
	pub fn fail_next_rollback(&self, message: impl Into<String>) {
		self.state.lock().fail_rollback = Some(message.into());
	}

	fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
		self.state.lock().events.iter().filter(|e| predicate(e)).count()
	}
}

impl State {
	fn current(&self) -> Option<TransactionId> {
		self.active.last().copied().flatten()
	}

	fn close(&mut self, status: &TransactionStatus) {
		let opened = match status.kind() {
			StatusKind::New => true,
			StatusKind::Empty => self.suspensions.remove(&status.id()),
			StatusKind::Participating => false,
		};
		if opened {
			self.active.pop();
		}
	}
}

impl TransactionManager for MemoryTransactionManager {
	fn begin(&self, attribute: &TransactionAttribute) -> Result<TransactionStatus> {
		let mut state = self.state.lock();
		if let Some(message) = state.fail_begin.take() {
			return Err(TransactionError::system(message));
		}

		let status = match (attribute.propagation(), state.current()) {
			(Propagation::Never, Some(_)) => {
				return Err(TransactionError::illegal_state(
					"existing transaction found for transaction marked with propagation 'never'",
				));
			}
			(Propagation::Mandatory, None) => {
				return Err(TransactionError::illegal_state(
					"no existing transaction found for transaction marked with propagation 'mandatory'",
				));
			}
			(Propagation::RequiresNew, _) | (Propagation::Required | Propagation::Nested, None) => {
				let status = TransactionStatus::new(StatusKind::New, attribute);
				state.active.push(Some(status.id()));
				status
			}
			(Propagation::NotSupported, Some(_)) => {
				let status = TransactionStatus::new(StatusKind::Empty, attribute);
				state.active.push(None);
				state.suspensions.insert(status.id());
				status
			}
			(
				Propagation::Required | Propagation::Supports | Propagation::Mandatory | Propagation::Nested,
				Some(id),
			) => TransactionStatus::with_id(id, StatusKind::Participating, attribute),
			(Propagation::Supports | Propagation::NotSupported | Propagation::Never, None) => {
				TransactionStatus::new(StatusKind::Empty, attribute)
			}
		};

		state.events.push(Event::Begin {
			id: status.id(),
			kind: status.kind(),
			name: status.name().map(str::to_string),
		});
		Ok(status)
	}

	fn commit(&self, status: &TransactionStatus) -> Result<()> {
		status.mark_completed()?;
		let mut state = self.state.lock();
		state.close(status);

		if let Some(message) = state.fail_commit.take() {
			if status.is_new_transaction() {
				state.events.push(Event::Rollback {
					id: status.id(),
				});
			}
			return Err(TransactionError::system(message));
		}

		match status.kind() {
			StatusKind::New => {
				let global = state.global_rollback_only.remove(&status.id());
				if status.is_rollback_only() || global {
					state.events.push(Event::Rollback {
						id: status.id(),
					});
					if global && !status.is_rollback_only() {
						return Err(TransactionError::system(format!(
							"transaction {} rolled back because it has been marked as rollback-only",
							status.id()
						)));
					}
				} else {
					state.events.push(Event::Commit {
						id: status.id(),
					});
				}
			}
			StatusKind::Participating => {
				if status.is_rollback_only() {
					state.global_rollback_only.insert(status.id());
					state.events.push(Event::RollbackOnly {
						id: status.id(),
					});
				}
			}
			StatusKind::Empty => {}
		}
		Ok(())
	}

	fn rollback(&self, status: &TransactionStatus) -> Result<()> {
		status.mark_completed()?;
		let mut state = self.state.lock();
		state.close(status);

		if let Some(message) = state.fail_rollback.take() {
			return Err(TransactionError::system(message));
		}

		match status.kind() {
			StatusKind::New => {
				state.global_rollback_only.remove(&status.id());
				state.events.push(Event::Rollback {
					id: status.id(),
				});
			}
			StatusKind::Participating => {
				state.global_rollback_only.insert(status.id());
				state.events.push(Event::RollbackOnly {
					id: status.id(),
				});
			}
			StatusKind::Empty => {}
		}
		Ok(())
	}
}
