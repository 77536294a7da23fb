// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

/// Identity of an intercepted method invocation.
///
/// `declaring_type` is the type that declares the method, `target_type` the
/// concrete type the call was dispatched on (the class context), if the
/// interception mechanism knows it. Two join points are the same cache key
/// only if all three parts are equal.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct JoinPoint {
	declaring_type: String,
	method: String,
	target_type: Option<String>,
}

impl JoinPoint {
	pub fn new(declaring_type: impl Into<String>, method: impl Into<String>) -> Self {
		Self {
			declaring_type: declaring_type.into(),
			method: method.into(),
			target_type: None,
		}
	}

	pub fn with_target(mut self, target_type: impl Into<String>) -> Self {
		self.target_type = Some(target_type.into());
		self
	}

	pub fn declaring_type(&self) -> &str {
		&self.declaring_type
	}

	pub fn method(&self) -> &str {
		&self.method
	}

	pub fn target_type(&self) -> Option<&str> {
		self.target_type.as_deref()
	}

	/// `Type.method`, preferring the target type over the declaring type.
	///
	/// Used as the transaction name when the attribute does not carry one,
	/// and in every log line about this join point.
	pub fn identification(&self) -> String {
		self.to_string()
	}
}

impl Display for JoinPoint {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}", self.target_type.as_deref().unwrap_or(&self.declaring_type), self.method)
	}
}

#[cfg(test)]
mod tests {
	use super::JoinPoint;

	#[test]
	fn test_identification_uses_declaring_type() {
		let jp = JoinPoint::new("bank::AccountService", "transfer");
		assert_eq!(jp.identification(), "bank::AccountService.transfer");
	}

	#[test]
	fn test_identification_prefers_target_type() {
		let jp = JoinPoint::new("bank::AccountService", "transfer").with_target("bank::JdbcAccountService");
		assert_eq!(jp.identification(), "bank::JdbcAccountService.transfer");
		assert_eq!(jp.to_string(), jp.identification());
	}

	#[test]
	fn test_target_is_part_of_identity() {
		let a = JoinPoint::new("bank::AccountService", "transfer");
		let b = a.clone().with_target("bank::JdbcAccountService");
		assert_ne!(a, b);
	}
}
