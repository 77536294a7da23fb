// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::{error, fmt};

/// Boxed application error attached as context to a secondary failure.
pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// The action that was being performed when a transaction failed to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionAction {
	Commit,
	Rollback,
}

impl fmt::Display for CompletionAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CompletionAction::Commit => f.write_str("commit"),
			CompletionAction::Rollback => f.write_str("rollback"),
		}
	}
}

/// Misconfiguration detected while resolving the transaction manager for a join point.
///
/// Always raised before the intercepted call is allowed to proceed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
	#[error("no transaction manager configured for transactional join point [{join_point}]")]
	NoManagerConfigured {
		join_point: String,
	},

	#[error("no transaction manager registered under name '{name}'")]
	ManagerNotFound {
		name: String,
	},

	#[error("no transaction manager matches qualifier '{qualifier}'")]
	QualifierNotFound {
		qualifier: String,
	},

	#[error("expected a single transaction manager but found {}: [{}]", candidates.len(), candidates.join(", "))]
	NoUniqueManager {
		candidates: Vec<String>,
	},

	#[error("transaction manager for [{join_point}] only supports callback execution")]
	CallbackManagerUnsupported {
		join_point: String,
	},

	#[error("transaction attribute source is required")]
	MissingAttributeSource,
}

/// Failure raised by the demarcation machinery itself, as opposed to the intercepted call.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
	#[error("no transaction aspect-managed status in scope")]
	NoTransaction,

	#[error(transparent)]
	Configuration(#[from] ConfigurationError),

	#[error("failed to resolve transaction attribute for [{join_point}]: {message}")]
	AttributeSource {
		join_point: String,
		message: String,
	},

	#[error("illegal transaction state: {0}")]
	IllegalState(String),

	#[error("{message}")]
	System {
		message: String,
		application: Option<BoxError>,
	},
}

impl TransactionError {
	pub fn illegal_state(message: impl Into<String>) -> Self {
		Self::IllegalState(message.into())
	}

	pub fn system(message: impl Into<String>) -> Self {
		Self::System {
			message: message.into(),
			application: None,
		}
	}

	/// Diagnostic code for this error.
	pub fn code(&self) -> &'static str {
		match self {
			TransactionError::NoTransaction => "TXN_001",
			TransactionError::Configuration(ConfigurationError::NoManagerConfigured {
				..
			}) => "TXN_002",
			TransactionError::Configuration(ConfigurationError::ManagerNotFound {
				..
			}) => "TXN_003",
			TransactionError::Configuration(ConfigurationError::QualifierNotFound {
				..
			}) => "TXN_004",
			TransactionError::Configuration(ConfigurationError::NoUniqueManager {
				..
			}) => "TXN_005",
			TransactionError::Configuration(ConfigurationError::CallbackManagerUnsupported {
				..
			}) => "TXN_006",
			TransactionError::Configuration(ConfigurationError::MissingAttributeSource) => "TXN_007",
			TransactionError::AttributeSource {
				..
			} => "TXN_008",
			TransactionError::IllegalState(_) => "TXN_009",
			TransactionError::System {
				..
			} => "TXN_010",
		}
	}

	/// Attaches the application error that this failure overrode.
	///
	/// Only system errors carry an application error; other variants are
	/// returned unchanged and the application error is dropped. A system error
	/// that already carries one keeps the first.
	pub fn with_application_error(self, error: BoxError) -> Self {
		match self {
			TransactionError::System {
				message,
				application: None,
			} => TransactionError::System {
				message,
				application: Some(error),
			},
			other => other,
		}
	}

	/// The application error overridden by this failure, if one was attached.
	pub fn application_error(&self) -> Option<&(dyn error::Error + Send + Sync + 'static)> {
		match self {
			TransactionError::System {
				application: Some(error),
				..
			} => Some(error.as_ref()),
			_ => None,
		}
	}
}

/// Outcome of an intercepted invocation that did not produce a value.
///
/// `Application` carries the error raised by the intercepted call itself, after
/// the transaction was finalized. `Transaction` carries a failure of the
/// demarcation machinery; when it overrode an application error, that error is
/// available through [`TransactionError::application_error`].
#[derive(Debug, thiserror::Error)]
pub enum InvocationError<E> {
	#[error(transparent)]
	Application(E),

	#[error(transparent)]
	Transaction(#[from] TransactionError),
}

impl<E> InvocationError<E> {
	pub fn is_application(&self) -> bool {
		matches!(self, InvocationError::Application(_))
	}

	pub fn application(self) -> Option<E> {
		match self {
			InvocationError::Application(error) => Some(error),
			InvocationError::Transaction(_) => None,
		}
	}

	pub fn transaction(self) -> Option<TransactionError> {
		match self {
			InvocationError::Application(_) => None,
			InvocationError::Transaction(error) => Some(error),
		}
	}
}

impl<E> InvocationError<InvocationError<E>> {
	/// Collapse the error of an invocation nested in the call of another.
	pub fn flatten(self) -> InvocationError<E> {
		match self {
			InvocationError::Application(inner) => inner,
			InvocationError::Transaction(error) => InvocationError::Transaction(error),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, thiserror::Error)]
	#[error("boom")]
	struct Boom;

	#[test]
	fn test_attach_application_error_to_system_error() {
		let err = TransactionError::system("commit failed").with_application_error(Box::new(Boom));
		assert_eq!(err.application_error().map(|e| e.to_string()), Some("boom".to_string()));
		assert_eq!(err.to_string(), "commit failed");
	}

	#[test]
	fn test_attach_keeps_first_application_error() {
		#[derive(Debug, thiserror::Error)]
		#[error("second")]
		struct Second;

		let err = TransactionError::system("rollback failed")
			.with_application_error(Box::new(Boom))
			.with_application_error(Box::new(Second));
		assert_eq!(err.application_error().map(|e| e.to_string()), Some("boom".to_string()));
	}

	#[test]
	fn test_attach_ignored_for_other_variants() {
		let err = TransactionError::illegal_state("already completed").with_application_error(Box::new(Boom));
		assert!(err.application_error().is_none());
		assert_eq!(err.code(), "TXN_009");
	}

	#[test]
	fn test_no_unique_manager_message() {
		let err = ConfigurationError::NoUniqueManager {
			candidates: vec!["primary".to_string(), "audit".to_string()],
		};
		assert_eq!(err.to_string(), "expected a single transaction manager but found 2: [primary, audit]");
	}

	#[test]
	fn test_flatten_nested_invocation_error() {
		let nested: InvocationError<InvocationError<Boom>> = InvocationError::Application(InvocationError::Application(Boom));
		assert!(nested.flatten().is_application());

		let nested: InvocationError<InvocationError<Boom>> = TransactionError::NoTransaction.into();
		assert!(matches!(nested.flatten(), InvocationError::Transaction(TransactionError::NoTransaction)));
	}
}
