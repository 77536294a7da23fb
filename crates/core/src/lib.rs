// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod attribute;
pub mod join_point;
pub mod manager;
pub mod rule;
pub mod source;
pub mod status;

pub use attribute::{Isolation, Propagation, TransactionAttribute};
pub use join_point::JoinPoint;
pub use manager::{CallbackOutcome, CallbackTransactionManager, ManagerRef, TransactionCallback, TransactionManager};
pub use rule::{ClassifiedError, ErrorKind, RollbackDecision, RollbackRule, RuleAction, RulePattern, should_rollback};
pub use source::TransactionAttributeSource;
pub use status::{StatusKind, TransactionId, TransactionStatus};
