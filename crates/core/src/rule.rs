// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Rollback rules and the decision procedure that applies them.
//!
//! An error raised by an intercepted call is matched against the rules of its
//! transaction attribute. Each rule is tested against every entry of the
//! error's type lineage, most specific first; the index of the first matching
//! entry is the rule's depth. The rule with the smallest depth decides, ties
//! go to the rule declared first. Rollback and commit rules compete on depth
//! alone, so a commit rule on a subtype beats a rollback rule on its parent.
//!
//! When no rule matches, the error's [`ErrorKind`] decides: expected errors
//! commit, unexpected and fatal errors roll back.

use std::{
	any::type_name,
	error::Error,
	fmt::{Display, Formatter},
};

use demarcate_type::{InvocationError, TransactionError};

use crate::attribute::TransactionAttribute;

/// Partition of application errors for the default rollback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Part of the call's contract; the work done so far is still committed.
	Expected,
	/// A bug or an unanticipated failure.
	Unexpected,
	/// The call could not possibly continue, e.g. a broken invariant.
	Fatal,
}

impl ErrorKind {
	pub fn rolls_back_by_default(&self) -> bool {
		!matches!(self, ErrorKind::Expected)
	}
}

/// An application error that can be classified by rollback rules.
pub trait ClassifiedError: Error + Send + Sync + 'static {
	/// Fully qualified type names, from the error's own type up to its most
	/// general ancestor.
	fn lineage(&self) -> Vec<&str> {
		vec![type_name::<Self>()]
	}

	fn kind(&self) -> ErrorKind {
		ErrorKind::Unexpected
	}
}

impl ClassifiedError for TransactionError {}

/// Lets a nested invocation's error propagate out of an enclosing one.
impl<E> ClassifiedError for InvocationError<E>
where
	E: ClassifiedError,
{
	fn lineage(&self) -> Vec<&str> {
		match self {
			InvocationError::Application(error) => error.lineage(),
			InvocationError::Transaction(error) => error.lineage(),
		}
	}

	fn kind(&self) -> ErrorKind {
		match self {
			InvocationError::Application(error) => error.kind(),
			InvocationError::Transaction(error) => error.kind(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RulePattern {
	/// Matches a lineage entry with exactly this name.
	Type(String),
	/// Matches every lineage entry starting with this prefix.
	Prefix(String),
}

impl RulePattern {
	fn matches(&self, name: &str) -> bool {
		match self {
			RulePattern::Type(expected) => name == expected,
			RulePattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleAction {
	Rollback,
	Commit,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RollbackRule {
	pattern: RulePattern,
	action: RuleAction,
}

impl RollbackRule {
	pub fn new(pattern: RulePattern, action: RuleAction) -> Self {
		Self {
			pattern,
			action,
		}
	}

	pub fn rollback_on(prefix: impl Into<String>) -> Self {
		Self::new(RulePattern::Prefix(prefix.into()), RuleAction::Rollback)
	}

	pub fn rollback_on_type(name: impl Into<String>) -> Self {
		Self::new(RulePattern::Type(name.into()), RuleAction::Rollback)
	}

	pub fn commit_on(prefix: impl Into<String>) -> Self {
		Self::new(RulePattern::Prefix(prefix.into()), RuleAction::Commit)
	}

	pub fn commit_on_type(name: impl Into<String>) -> Self {
		Self::new(RulePattern::Type(name.into()), RuleAction::Commit)
	}

	pub fn pattern(&self) -> &RulePattern {
		&self.pattern
	}

	pub fn action(&self) -> RuleAction {
		self.action
	}

	pub fn is_rollback(&self) -> bool {
		self.action == RuleAction::Rollback
	}

	/// Steps up `lineage` until this rule matches, or `None`.
	pub fn depth(&self, lineage: &[&str]) -> Option<usize> {
		lineage.iter().position(|name| self.pattern.matches(name))
	}
}

impl Display for RollbackRule {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let sign = match self.action {
			RuleAction::Rollback => '-',
			RuleAction::Commit => '+',
		};
		match &self.pattern {
			RulePattern::Type(name) => write!(f, "{sign}{name}"),
			RulePattern::Prefix(prefix) => write!(f, "{sign}{prefix}*"),
		}
	}
}

/// Result of applying a rule list to one error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollbackDecision<'a> {
	/// The winning rule, or `None` when the default policy applied.
	pub rule: Option<&'a RollbackRule>,
	pub depth: Option<usize>,
	pub rollback: bool,
}

pub fn decide<'a, E>(rules: &'a [RollbackRule], error: &E) -> RollbackDecision<'a>
where
	E: ClassifiedError + ?Sized,
{
	let lineage = error.lineage();

	let mut winner: Option<(&RollbackRule, usize)> = None;
	for rule in rules {
		if let Some(depth) = rule.depth(&lineage) {
			// strict comparison keeps the earlier rule on ties
			if winner.is_none_or(|(_, best)| depth < best) {
				winner = Some((rule, depth));
			}
		}
	}

	match winner {
		Some((rule, depth)) => RollbackDecision {
			rule: Some(rule),
			depth: Some(depth),
			rollback: rule.is_rollback(),
		},
		None => RollbackDecision {
			rule: None,
			depth: None,
			rollback: error.kind().rolls_back_by_default(),
		},
	}
}

/// Whether `error` raised inside a transaction demarcated by `attribute` must roll it back.
pub fn should_rollback<E>(attribute: &TransactionAttribute, error: &E) -> bool
where
	E: ClassifiedError + ?Sized,
{
	decide(attribute.rollback_rules(), error).rollback
}
