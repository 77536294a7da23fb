// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use demarcate_type::Result;

use crate::{attribute::TransactionAttribute, join_point::JoinPoint};

/// Resolves the transaction attribute of a join point.
///
/// `Ok(None)` means the join point is not transactional. Implementations must
/// return the same answer for the same join point every time; callers cache.
pub trait TransactionAttributeSource: Send + Sync {
	fn lookup(&self, join_point: &JoinPoint) -> Result<Option<Arc<TransactionAttribute>>>;
}

impl<S: TransactionAttributeSource + ?Sized> TransactionAttributeSource for Arc<S> {
	fn lookup(&self, join_point: &JoinPoint) -> Result<Option<Arc<TransactionAttribute>>> {
		(**self).lookup(join_point)
	}
}
