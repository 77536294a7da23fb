// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	time::Duration,
};

use crate::rule::{ClassifiedError, RollbackRule, should_rollback};

/// How a call relates to a transaction that is already active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Propagation {
	/// Join the active transaction, or start one.
	#[default]
	Required,
	/// Join the active transaction, or run without one.
	Supports,
	/// Join the active transaction; fail without one.
	Mandatory,
	/// Suspend the active transaction and start a new one.
	RequiresNew,
	/// Suspend the active transaction and run without one.
	NotSupported,
	/// Fail if a transaction is active.
	Never,
	/// Run in a nested transaction (savepoint) if one is active, else like `Required`.
	Nested,
}

impl Display for Propagation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Propagation::Required => f.write_str("PROPAGATION_REQUIRED"),
			Propagation::Supports => f.write_str("PROPAGATION_SUPPORTS"),
			Propagation::Mandatory => f.write_str("PROPAGATION_MANDATORY"),
			Propagation::RequiresNew => f.write_str("PROPAGATION_REQUIRES_NEW"),
			Propagation::NotSupported => f.write_str("PROPAGATION_NOT_SUPPORTED"),
			Propagation::Never => f.write_str("PROPAGATION_NEVER"),
			Propagation::Nested => f.write_str("PROPAGATION_NESTED"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Isolation {
	/// Whatever the underlying resource uses by default.
	#[default]
	Default,
	ReadUncommitted,
	ReadCommitted,
	RepeatableRead,
	Serializable,
}

impl Display for Isolation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Isolation::Default => f.write_str("ISOLATION_DEFAULT"),
			Isolation::ReadUncommitted => f.write_str("ISOLATION_READ_UNCOMMITTED"),
			Isolation::ReadCommitted => f.write_str("ISOLATION_READ_COMMITTED"),
			Isolation::RepeatableRead => f.write_str("ISOLATION_REPEATABLE_READ"),
			Isolation::Serializable => f.write_str("ISOLATION_SERIALIZABLE"),
		}
	}
}

/// Transaction definition resolved for one join point.
///
/// Built once, then shared immutably (usually behind an `Arc`) by every
/// invocation of that join point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionAttribute {
	propagation: Propagation,
	isolation: Isolation,
	timeout: Option<Duration>,
	read_only: bool,
	qualifier: Option<String>,
	name: Option<String>,
	rollback_rules: Vec<RollbackRule>,
}

impl TransactionAttribute {
	pub fn new(propagation: Propagation) -> Self {
		Self {
			propagation,
			..Self::default()
		}
	}

	pub fn required() -> Self {
		Self::new(Propagation::Required)
	}

	pub fn requires_new() -> Self {
		Self::new(Propagation::RequiresNew)
	}

	pub fn supports() -> Self {
		Self::new(Propagation::Supports)
	}

	pub fn with_isolation(mut self, isolation: Isolation) -> Self {
		self.isolation = isolation;
		self
	}

	/// Timeout in whole seconds, passed through to the manager at begin time.
	pub fn with_timeout_secs(mut self, seconds: u64) -> Self {
		self.timeout = Some(Duration::from_secs(seconds));
		self
	}

	pub fn read_only(mut self) -> Self {
		self.read_only = true;
		self
	}

	pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
		self.qualifier = Some(qualifier.into());
		self
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_rule(mut self, rule: RollbackRule) -> Self {
		self.rollback_rules.push(rule);
		self
	}

	pub fn with_rules(mut self, rules: impl IntoIterator<Item = RollbackRule>) -> Self {
		self.rollback_rules.extend(rules);
		self
	}

	pub fn propagation(&self) -> Propagation {
		self.propagation
	}

	pub fn isolation(&self) -> Isolation {
		self.isolation
	}

	/// `None` means the manager's default timeout.
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout
	}

	pub fn is_read_only(&self) -> bool {
		self.read_only
	}

	pub fn qualifier(&self) -> Option<&str> {
		self.qualifier.as_deref().filter(|q| !q.is_empty())
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn rollback_rules(&self) -> &[RollbackRule] {
		&self.rollback_rules
	}

	/// Whether `error` rolls back a transaction demarcated by this attribute.
	pub fn rollback_on<E>(&self, error: &E) -> bool
	where
		E: ClassifiedError + ?Sized,
	{
		should_rollback(self, error)
	}
}

impl Display for TransactionAttribute {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{},{}", self.propagation, self.isolation)?;
		if let Some(timeout) = self.timeout {
			write!(f, ",timeout_{}", timeout.as_secs())?;
		}
		if self.read_only {
			f.write_str(",readOnly")?;
		}
		if let Some(qualifier) = self.qualifier() {
			write!(f, "; '{qualifier}'")?;
		}
		for rule in &self.rollback_rules {
			write!(f, ",{rule}")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let attr = TransactionAttribute::default();
		assert_eq!(attr.propagation(), Propagation::Required);
		assert_eq!(attr.isolation(), Isolation::Default);
		assert_eq!(attr.timeout(), None);
		assert!(!attr.is_read_only());
		assert!(attr.qualifier().is_none());
		assert!(attr.name().is_none());
		assert!(attr.rollback_rules().is_empty());
	}

	#[test]
	fn test_empty_qualifier_is_absent() {
		let attr = TransactionAttribute::required().with_qualifier("");
		assert!(attr.qualifier().is_none());
	}

	#[test]
	fn test_display() {
		let attr = TransactionAttribute::requires_new()
			.with_isolation(Isolation::Serializable)
			.with_timeout_secs(30)
			.read_only()
			.with_qualifier("audit")
			.with_rule(RollbackRule::commit_on("bank::"));
		assert_eq!(
			attr.to_string(),
			"PROPAGATION_REQUIRES_NEW,ISOLATION_SERIALIZABLE,timeout_30,readOnly; 'audit',+bank::*"
		);
	}
}
