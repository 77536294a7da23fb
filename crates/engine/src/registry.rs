// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use demarcate_core::ManagerRef;
use demarcate_type::{ConfigurationError, Result};
use parking_lot::RwLock;
use tracing::debug;

struct Registration {
	name: String,
	qualifiers: Vec<String>,
	manager: ManagerRef,
}

impl Registration {
	fn matches_qualifier(&self, qualifier: &str) -> bool {
		self.name == qualifier || self.qualifiers.iter().any(|q| q == qualifier)
	}
}

/// Named transaction managers available for resolution.
///
/// Cheap to clone, clones share the same registrations. Registering a name
/// twice replaces the earlier manager.
#[derive(Clone, Default)]
pub struct ManagerRegistry {
	registrations: Arc<RwLock<Vec<Registration>>>,
}

impl ManagerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(self, name: impl Into<String>, manager: ManagerRef) -> Self {
		self.register(name, manager);
		self
	}

	pub fn with_qualified<Q, I>(self, name: impl Into<String>, qualifiers: I, manager: ManagerRef) -> Self
	where
		Q: Into<String>,
		I: IntoIterator<Item = Q>,
	{
		self.register_qualified(name, qualifiers, manager);
		self
	}

	pub fn register(&self, name: impl Into<String>, manager: ManagerRef) {
		self.register_qualified(name, Vec::<String>::new(), manager);
	}

	/// Register a manager that also answers to the given qualifier aliases.
	pub fn register_qualified<Q, I>(&self, name: impl Into<String>, qualifiers: I, manager: ManagerRef)
	where
		Q: Into<String>,
		I: IntoIterator<Item = Q>,
	{
		let registration = Registration {
			name: name.into(),
			qualifiers: qualifiers.into_iter().map(Into::into).collect(),
			manager,
		};
		debug!("Registered transaction manager '{}'", registration.name);

		let mut registrations = self.registrations.write();
		match registrations.iter_mut().find(|r| r.name == registration.name) {
			Some(existing) => *existing = registration,
			None => registrations.push(registration),
		}
	}

	pub fn remove(&self, name: &str) -> Option<ManagerRef> {
		let mut registrations = self.registrations.write();
		let position = registrations.iter().position(|r| r.name == name)?;
		Some(registrations.remove(position).manager)
	}

	pub fn names(&self) -> Vec<String> {
		self.registrations.read().iter().map(|r| r.name.clone()).collect()
	}

	pub fn len(&self) -> usize {
		self.registrations.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.registrations.read().is_empty()
	}

	/// The manager registered under exactly `name`.
	pub fn get(&self, name: &str) -> Result<ManagerRef> {
		self.registrations.read().iter().find(|r| r.name == name).map(|r| r.manager.clone()).ok_or_else(|| {
			ConfigurationError::ManagerNotFound {
				name: name.to_string(),
			}
			.into()
		})
	}

	/// The single manager whose name or one of whose aliases equals `qualifier`.
	pub fn qualified(&self, qualifier: &str) -> Result<ManagerRef> {
		let registrations = self.registrations.read();
		let mut candidates = registrations.iter().filter(|r| r.matches_qualifier(qualifier));

		match (candidates.next(), candidates.next()) {
			(Some(found), None) => Ok(found.manager.clone()),
			(None, _) => Err(ConfigurationError::QualifierNotFound {
				qualifier: qualifier.to_string(),
			}
			.into()),
			(Some(_), Some(_)) => Err(ConfigurationError::NoUniqueManager {
				candidates: registrations
					.iter()
					.filter(|r| r.matches_qualifier(qualifier))
					.map(|r| r.name.clone())
					.collect(),
			}
			.into()),
		}
	}

	/// The only registered manager; `Ok(None)` when none is registered.
	pub fn single(&self) -> Result<Option<ManagerRef>> {
		let registrations = self.registrations.read();
		match registrations.as_slice() {
			[] => Ok(None),
			[only] => Ok(Some(only.manager.clone())),
			many => Err(ConfigurationError::NoUniqueManager {
				candidates: many.iter().map(|r| r.name.clone()).collect(),
			}
			.into()),
		}
	}
}
