// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Declarative transaction demarcation.
//!
//! An interceptor hands every invocation it sees to an
//! [`InvocationCoordinator`], together with a [`JoinPoint`] describing the
//! called method and the caller's [`TransactionContext`]. The coordinator asks
//! its [`TransactionAttributeSource`] whether the method is transactional,
//! begins a transaction through the resolved manager, runs the call, and
//! commits or rolls back according to the attribute's rollback rules.

pub use demarcate_core as core;
pub use demarcate_core::{
	CallbackOutcome, CallbackTransactionManager, ClassifiedError, ErrorKind, Isolation, JoinPoint, ManagerRef,
	Propagation, RollbackRule, StatusKind, TransactionAttribute, TransactionAttributeSource, TransactionCallback,
	TransactionId, TransactionManager, TransactionStatus,
};
pub use demarcate_engine as engine;
pub use demarcate_engine::{
	CallbackAdapter, InvocationCoordinator, InvocationCoordinatorBuilder, ManagerRegistry, TransactionContext,
	TransactionInfo,
	source::{CompositeAttributeSource, MethodMapAttributeSource, NameMatchAttributeSource},
};
pub use demarcate_type::{
	BoxError, CompletionAction, ConfigurationError, InvocationError, Result, TransactionError,
};
