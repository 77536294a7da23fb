// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::any::Any;

/// A panic escaping an intercepted call.
#[derive(Debug, thiserror::Error)]
#[error("panicked: {message}")]
pub(crate) struct Panicked {
	message: String,
}

impl Panicked {
	pub(crate) fn from_payload(payload: &(dyn Any + Send)) -> Self {
		let message = if let Some(message) = payload.downcast_ref::<&str>() {
			message.to_string()
		} else if let Some(message) = payload.downcast_ref::<String>() {
			message.clone()
		} else {
			"Box<dyn Any>".to_string()
		};
		Self {
			message,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::Panicked;

	#[test]
	fn test_payload_message() {
		let payload: Box<dyn std::any::Any + Send> = Box::new("index out of bounds");
		let panicked = Panicked::from_payload(payload.as_ref());
		assert_eq!(panicked.to_string(), "panicked: index out of bounds");

		let payload: Box<dyn std::any::Any + Send> = Box::new(format!("balance {} below zero", -3));
		assert_eq!(Panicked::from_payload(payload.as_ref()).to_string(), "panicked: balance -3 below zero");
	}
}
