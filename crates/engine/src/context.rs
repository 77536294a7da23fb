// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Per call chain stack of transaction frames.
//!
//! Every intercepted invocation binds one [`TransactionInfo`] when it starts
//! and restores the previous one when it ends, whether or not it is
//! transactional. Frames are linked to their predecessor, so the stack is the
//! chain reachable from the current frame.
//!
//! A [`TransactionContext`] belongs to exactly one logical call chain. It is
//! passed by `&mut` into every nested invocation and can be moved to another
//! thread together with the task that owns it.

use std::{
	fmt::{Debug, Formatter},
	sync::Arc,
};

use demarcate_core::{ManagerRef, TransactionAttribute, TransactionStatus};
use demarcate_type::{Result, TransactionError};

/// One frame of the stack; cheap to clone.
#[derive(Clone)]
pub struct TransactionInfo {
	inner: Arc<FrameInner>,
}

struct FrameInner {
	manager: Option<ManagerRef>,
	attribute: Option<Arc<TransactionAttribute>>,
	join_point: String,
	status: Option<TransactionStatus>,
	previous: Option<TransactionInfo>,
}

impl TransactionInfo {
	pub fn manager(&self) -> Option<&ManagerRef> {
		self.inner.manager.as_ref()
	}

	/// `None` for a non-transactional join point.
	pub fn attribute(&self) -> Option<&Arc<TransactionAttribute>> {
		self.inner.attribute.as_ref()
	}

	pub fn join_point(&self) -> &str {
		&self.inner.join_point
	}

	pub fn status(&self) -> Option<&TransactionStatus> {
		self.inner.status.as_ref()
	}

	/// Whether a status was obtained for this frame, as opposed to a
	/// placeholder bound only to keep the stack balanced.
	pub fn has_transaction(&self) -> bool {
		self.inner.status.is_some()
	}

	/// The frame that was current when this one was bound.
	pub fn previous(&self) -> Option<&TransactionInfo> {
		self.inner.previous.as_ref()
	}

	pub fn same(&self, other: &TransactionInfo) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Debug for TransactionInfo {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TransactionInfo")
			.field("join_point", &self.inner.join_point)
			.field("attribute", &self.inner.attribute.as_ref().map(|a| a.to_string()))
			.field("status", &self.inner.status.as_ref().map(|s| s.id()))
			.finish()
	}
}

#[derive(Debug, Default)]
pub struct TransactionContext {
	current: Option<TransactionInfo>,
	depth: usize,
}

impl TransactionContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn current_frame(&self) -> Option<&TransactionInfo> {
		self.current.as_ref()
	}

	/// Status of the innermost intercepted invocation.
	///
	/// Meant for code that wants to mark the running transaction
	/// rollback-only without raising an error. Fails with
	/// [`TransactionError::NoTransaction`] outside any frame, and inside a
	/// frame of a non-transactional join point.
	pub fn current_status(&self) -> Result<TransactionStatus> {
		self.current.as_ref().and_then(|frame| frame.status().cloned()).ok_or(TransactionError::NoTransaction)
	}

	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn is_empty(&self) -> bool {
		self.current.is_none()
	}

	/// Install a new frame as current, remembering the current one as its predecessor.
	pub fn bind(
		&mut self,
		manager: Option<ManagerRef>,
		attribute: Option<Arc<TransactionAttribute>>,
		join_point: impl Into<String>,
		status: Option<TransactionStatus>,
	) -> TransactionInfo {
		let frame = TransactionInfo {
			inner: Arc::new(FrameInner {
				manager,
				attribute,
				join_point: join_point.into(),
				status,
				previous: self.current.take(),
			}),
		};
		self.current = Some(frame.clone());
		self.depth += 1;
		frame
	}

	/// Reinstate the predecessor of `frame`, which must be the current frame.
	pub fn restore(&mut self, frame: &TransactionInfo) -> Result<()> {
		match &self.current {
			Some(current) if current.same(frame) => {
				self.current = frame.previous().cloned();
				self.depth -= 1;
				Ok(())
			}
			Some(current) => Err(TransactionError::illegal_state(format!(
				"cannot restore frame of [{}] while frame of [{}] is current",
				frame.join_point(),
				current.join_point()
			))),
			None => Err(TransactionError::illegal_state(format!(
				"cannot restore frame of [{}]: no frame is bound",
				frame.join_point()
			))),
		}
	}
}

#[cfg(test)]
mod tests {
	use demarcate_core::{StatusKind, TransactionAttribute, TransactionStatus};
	use demarcate_type::TransactionError;

	use super::TransactionContext;

	fn status() -> TransactionStatus {
		TransactionStatus::new(StatusKind::New, &TransactionAttribute::required())
	}

	#[test]
	fn test_empty_context_has_no_status() {
		let ctx = TransactionContext::new();
		assert!(ctx.is_empty());
		assert_eq!(ctx.depth(), 0);
		assert!(matches!(ctx.current_status(), Err(TransactionError::NoTransaction)));
	}

	#[test]
	fn test_bind_and_restore_nested() {
		let mut ctx = TransactionContext::new();
		let outer_status = status();
		let inner_status = status();

		let outer = ctx.bind(None, None, "a.outer", Some(outer_status.clone()));
		let inner = ctx.bind(None, None, "a.inner", Some(inner_status.clone()));
		assert_eq!(ctx.depth(), 2);
		assert!(ctx.current_status().unwrap().same(&inner_status));
		assert!(inner.previous().unwrap().same(&outer));

		ctx.restore(&inner).unwrap();
		assert!(ctx.current_status().unwrap().same(&outer_status));

		ctx.restore(&outer).unwrap();
		assert!(ctx.is_empty());
		assert_eq!(ctx.depth(), 0);
	}

	#[test]
	fn test_placeholder_frame_has_no_status() {
		let mut ctx = TransactionContext::new();
		let frame = ctx.bind(None, None, "a.plain", None);
		assert!(!frame.has_transaction());
		assert!(matches!(ctx.current_status(), Err(TransactionError::NoTransaction)));
		ctx.restore(&frame).unwrap();
	}

	#[test]
	fn test_restore_out_of_order_leaves_stack_untouched() {
		let mut ctx = TransactionContext::new();
		let outer = ctx.bind(None, None, "a.outer", None);
		let inner = ctx.bind(None, None, "a.inner", None);

		let err = ctx.restore(&outer).unwrap_err();
		assert!(matches!(err, TransactionError::IllegalState(_)));
		assert_eq!(ctx.depth(), 2);
		assert!(ctx.current_frame().unwrap().same(&inner));

		ctx.restore(&inner).unwrap();
		ctx.restore(&outer).unwrap();
		assert!(ctx.restore(&outer).is_err());
	}
}
