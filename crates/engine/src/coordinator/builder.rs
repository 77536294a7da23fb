// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use dashmap::DashMap;
use demarcate_core::{ManagerRef, TransactionAttributeSource};
use demarcate_type::{ConfigurationError, Result};

use super::InvocationCoordinator;
use crate::registry::ManagerRegistry;

/// Builder for [`InvocationCoordinator`].
///
/// An attribute source is required. Managers are resolved from the explicit
/// manager if one is set, otherwise from the registry.
pub struct InvocationCoordinatorBuilder {
	source: Option<Arc<dyn TransactionAttributeSource>>,
	manager: Option<ManagerRef>,
	registry: Option<ManagerRegistry>,
	default_manager_name: Option<String>,
	cache_attributes: bool,
}

impl InvocationCoordinatorBuilder {
	pub fn new() -> Self {
		Self {
			source: None,
			manager: None,
			registry: None,
			default_manager_name: None,
			cache_attributes: true,
		}
	}

	pub fn attribute_source(mut self, source: impl TransactionAttributeSource + 'static) -> Self {
		self.source = Some(Arc::new(source));
		self
	}

	pub fn shared_attribute_source(mut self, source: Arc<dyn TransactionAttributeSource>) -> Self {
		self.source = Some(source);
		self
	}

	/// Use this manager for every join point, ignoring qualifiers.
	pub fn transaction_manager(mut self, manager: ManagerRef) -> Self {
		self.manager = Some(manager);
		self
	}

	pub fn manager_registry(mut self, registry: ManagerRegistry) -> Self {
		self.registry = Some(registry);
		self
	}

	/// Registry name of the manager for attributes without a qualifier.
	pub fn default_manager_name(mut self, name: impl Into<String>) -> Self {
		self.default_manager_name = Some(name.into());
		self
	}

	pub fn cache_attributes(mut self, enabled: bool) -> Self {
		self.cache_attributes = enabled;
		self
	}

	pub fn build(self) -> Result<InvocationCoordinator> {
		let source = self.source.ok_or(ConfigurationError::MissingAttributeSource)?;

		Ok(InvocationCoordinator {
			source,
			manager: self.manager,
			registry: self.registry,
			default_manager_name: self.default_manager_name,
			cache: self.cache_attributes.then(DashMap::new),
		})
	}
}

impl Default for InvocationCoordinatorBuilder {
	fn default() -> Self {
		Self::new()
	}
}
