// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Transaction demarcation around intercepted invocations.
//!
//! [`InvocationCoordinator::invoke_within_transaction`] is the single entry
//! point for around-style interception. Interception styles that only see the
//! start and the end of an invocation use the decomposed steps instead:
//! [`prepare`](InvocationCoordinator::prepare), then either
//! [`complete_on_return`](InvocationCoordinator::complete_on_return) or
//! [`complete_on_error`](InvocationCoordinator::complete_on_error), then
//! always [`cleanup`](InvocationCoordinator::cleanup).
//!
//! Completion always happens before the frame is restored, on every exit path.

mod builder;
mod panic;

use std::{
	panic::{AssertUnwindSafe, catch_unwind, resume_unwind},
	sync::Arc,
};

pub use builder::InvocationCoordinatorBuilder;
use dashmap::{DashMap, mapref::entry::Entry};
use demarcate_core::{
	CallbackOutcome, CallbackTransactionManager, ClassifiedError, JoinPoint, ManagerRef, TransactionAttribute,
	TransactionAttributeSource, TransactionManager, TransactionStatus,
};
use demarcate_type::{BoxError, CompletionAction, ConfigurationError, InvocationError, Result, TransactionError};
use tracing::{debug, error, instrument, trace};

use self::panic::Panicked;
use crate::{
	context::{TransactionContext, TransactionInfo},
	registry::ManagerRegistry,
};

pub struct InvocationCoordinator {
	source: Arc<dyn TransactionAttributeSource>,
	manager: Option<ManagerRef>,
	registry: Option<ManagerRegistry>,
	default_manager_name: Option<String>,
	cache: Option<DashMap<JoinPoint, Option<Arc<TransactionAttribute>>>>,
}

impl InvocationCoordinator {
	pub fn builder() -> InvocationCoordinatorBuilder {
		InvocationCoordinatorBuilder::new()
	}

	/// Run `proceed` inside the transaction demarcated for `join_point`.
	///
	/// Returns the value of `proceed`, or the error it raised once the
	/// transaction has been committed or rolled back. If committing or
	/// rolling back fails, that failure is returned instead and carries the
	/// error of `proceed` as its application error. A panic in `proceed` rolls
	/// back, restores the frame and continues unwinding.
	#[instrument(name = "engine::coordinator::invoke", level = "trace", skip_all, fields(join_point = %join_point))]
	pub fn invoke_within_transaction<T, E, F>(
		&self,
		ctx: &mut TransactionContext,
		join_point: &JoinPoint,
		proceed: F,
	) -> std::result::Result<T, InvocationError<E>>
	where
		E: ClassifiedError,
		F: FnOnce(&mut TransactionContext) -> std::result::Result<T, E>,
	{
		let attribute = self.attribute(join_point)?;
		let manager = self.determine_manager(join_point, attribute.as_deref())?;

		match (attribute, manager) {
			(Some(attribute), Some(ManagerRef::Callback(manager))) => {
				self.invoke_with_callback(ctx, join_point, attribute, manager, proceed)
			}
			(attribute, manager) => self.invoke_with_status(ctx, join_point, attribute, manager, proceed),
		}
	}

	fn invoke_with_status<T, E, F>(
		&self,
		ctx: &mut TransactionContext,
		join_point: &JoinPoint,
		attribute: Option<Arc<TransactionAttribute>>,
		manager: Option<ManagerRef>,
		proceed: F,
	) -> std::result::Result<T, InvocationError<E>>
	where
		E: ClassifiedError,
		F: FnOnce(&mut TransactionContext) -> std::result::Result<T, E>,
	{
		let info = self.create_frame(ctx, join_point, attribute, manager)?;

		match catch_unwind(AssertUnwindSafe(|| proceed(&mut *ctx))) {
			Ok(Ok(value)) => {
				let completed = self.complete_on_return(&info);
				let restored = self.cleanup(ctx, &info);
				completed?;
				restored?;
				Ok(value)
			}
			Ok(Err(err)) => {
				let raised = self.complete_on_error(&info, err);
				if let Err(restore) = self.cleanup(ctx, &info) {
					error!("Failed to restore transaction frame of [{}]: {}", info.join_point(), restore);
				}
				Err(raised)
			}
			Err(payload) => {
				let panicked = Panicked::from_payload(payload.as_ref());
				if let Err(err) = self.rollback_after_panic(&info) {
					error!("Failed to roll back transaction of [{}] after {}: {}", info.join_point(), panicked, err);
				}
				if let Err(restore) = self.cleanup(ctx, &info) {
					error!("Failed to restore transaction frame of [{}]: {}", info.join_point(), restore);
				}
				resume_unwind(payload)
			}
		}
	}

	fn invoke_with_callback<T, E, F>(
		&self,
		ctx: &mut TransactionContext,
		join_point: &JoinPoint,
		attribute: Arc<TransactionAttribute>,
		manager: Arc<dyn CallbackTransactionManager>,
		proceed: F,
	) -> std::result::Result<T, InvocationError<E>>
	where
		E: ClassifiedError,
		F: FnOnce(&mut TransactionContext) -> std::result::Result<T, E>,
	{
		let identification = join_point.identification();
		let manager_ref = ManagerRef::Callback(manager.clone());

		let mut proceed = Some(proceed);
		let mut produced: Option<std::result::Result<T, E>> = None;
		let mut panicked = None;
		let mut restore_failure = None;
		let mut invoked_twice = false;

		let executed = {
			let mut callback = |status: &TransactionStatus| -> CallbackOutcome {
				let Some(proceed) = proceed.take() else {
					invoked_twice = true;
					return CallbackOutcome::RollbackOnly;
				};

				trace!("Getting transaction for [{}]", identification);
				let info = ctx.bind(
					Some(manager_ref.clone()),
					Some(attribute.clone()),
					identification.as_str(),
					Some(status.clone()),
				);
				let result = catch_unwind(AssertUnwindSafe(|| proceed(&mut *ctx)));
				if let Err(err) = ctx.restore(&info) {
					restore_failure = Some(err);
				}

				match result {
					Ok(Ok(value)) => {
						produced = Some(Ok(value));
						CallbackOutcome::Completed
					}
					Ok(Err(err)) => {
						let rollback = attribute.rollback_on(&err);
						trace!("Completing transaction for [{}] after error: {}", identification, err);
						produced = Some(Err(err));
						if rollback {
							CallbackOutcome::RollbackOnly
						} else {
							CallbackOutcome::Deferred
						}
					}
					Err(payload) => {
						panicked = Some(payload);
						CallbackOutcome::RollbackOnly
					}
				}
			};
			manager.execute(&attribute, &mut callback)
		};

		let restore_failure = restore_failure.and_then(|err| {
			if panicked.is_none() && executed.is_ok() && matches!(produced, Some(Ok(_))) {
				Some(err)
			} else {
				error!("Failed to restore transaction frame of [{}]: {}", identification, err);
				None
			}
		});

		if let Some(payload) = panicked {
			if let Err(err) = executed {
				error!("Failed to complete transaction of [{}] after panic: {}", identification, err);
			}
			resume_unwind(payload);
		}

		if invoked_twice {
			error!("Callback-preferring manager invoked the unit of work of [{}] more than once", identification);
		}

		match executed {
			Err(err) => match produced {
				Some(Err(app)) => Err(self.override_application_error(&identification, err, app).into()),
				_ => Err(err.into()),
			},
			Ok(outcome) => {
				trace!("Completed transaction for [{}] with {:?}", identification, outcome);
				match produced {
					Some(Ok(value)) => match restore_failure {
						Some(err) => Err(err.into()),
						None => Ok(value),
					},
					Some(Err(app)) => Err(InvocationError::Application(app)),
					None => Err(TransactionError::illegal_state(format!(
						"callback-preferring transaction manager did not run the unit of work of [{}]",
						identification
					))
					.into()),
				}
			}
		}
	}

	/// Resolve the attribute, bind a frame for `join_point` and begin its
	/// transaction if it has one.
	///
	/// The returned frame must be handed to exactly one of
	/// [`complete_on_return`](Self::complete_on_return) or
	/// [`complete_on_error`](Self::complete_on_error), then to
	/// [`cleanup`](Self::cleanup). Requires a status-based manager.
	#[instrument(name = "engine::coordinator::prepare", level = "trace", skip_all, fields(join_point = %join_point))]
	pub fn prepare(&self, ctx: &mut TransactionContext, join_point: &JoinPoint) -> Result<TransactionInfo> {
		let attribute = self.attribute(join_point)?;
		let manager = self.determine_manager(join_point, attribute.as_deref())?;
		self.create_frame(ctx, join_point, attribute, manager)
	}

	/// Commit the transaction of `info`, if it has one.
	pub fn complete_on_return(&self, info: &TransactionInfo) -> Result<()> {
		let Some((manager, status)) = Self::frame_transaction(info)? else {
			return Ok(());
		};
		trace!("Completing transaction for [{}]", info.join_point());
		manager.commit(status)
	}

	/// Commit or roll back the transaction of `info` after `err` was raised,
	/// as decided by the rollback rules of its attribute.
	///
	/// Returns the error the caller has to raise: `err` itself, or the
	/// failure of the completion with `err` attached.
	pub fn complete_on_error<E>(&self, info: &TransactionInfo, err: E) -> InvocationError<E>
	where
		E: ClassifiedError,
	{
		let (manager, status) = match Self::frame_transaction(info) {
			Ok(Some(found)) => found,
			Ok(None) => return InvocationError::Application(err),
			Err(failure) => return InvocationError::Transaction(failure),
		};
		let Some(attribute) = info.attribute() else {
			return InvocationError::Application(err);
		};

		trace!("Completing transaction for [{}] after error: {}", info.join_point(), err);
		let (action, completed) = if attribute.rollback_on(&err) {
			(CompletionAction::Rollback, manager.rollback(status))
		} else {
			// still rolls back if the status was marked rollback-only
			(CompletionAction::Commit, manager.commit(status))
		};

		match completed {
			Ok(()) => InvocationError::Application(err),
			Err(failure) => {
				debug!("Transaction {} of [{}] failed to {}", status.id(), info.join_point(), action);
				InvocationError::Transaction(self.override_application_error(info.join_point(), failure, err))
			}
		}
	}

	/// Restore the frame that was current before `info` was bound.
	pub fn cleanup(&self, ctx: &mut TransactionContext, info: &TransactionInfo) -> Result<()> {
		ctx.restore(info)
	}

	/// The attribute of `join_point`, named after the join point if it has no name.
	///
	/// Cached per join point unless caching was disabled; the attribute source
	/// is asked at most once per join point until the cache is invalidated.
	pub fn attribute(&self, join_point: &JoinPoint) -> Result<Option<Arc<TransactionAttribute>>> {
		let Some(cache) = &self.cache else {
			return self.resolve_attribute(join_point);
		};

		if let Some(cached) = cache.get(join_point) {
			return Ok(cached.value().clone());
		}

		match cache.entry(join_point.clone()) {
			Entry::Occupied(entry) => Ok(entry.get().clone()),
			Entry::Vacant(entry) => {
				let attribute = self.resolve_attribute(join_point)?;
				match &attribute {
					Some(attribute) => {
						debug!("Adding transactional join point [{}] with attribute: {}", join_point, attribute)
					}
					None => trace!("Join point [{}] is not transactional", join_point),
				}
				entry.insert(attribute.clone());
				Ok(attribute)
			}
		}
	}

	/// Whether `join_point` is transactional at all.
	pub fn matches(&self, join_point: &JoinPoint) -> Result<bool> {
		Ok(self.attribute(join_point)?.is_some())
	}

	pub fn invalidate_attribute_cache(&self) {
		if let Some(cache) = &self.cache {
			cache.clear();
		}
	}

	/// The manager responsible for `join_point`.
	///
	/// An explicitly configured manager always wins. Otherwise, and only for
	/// transactional join points, the registry is asked by the attribute's
	/// qualifier, then by the default manager name, then for its only manager.
	pub fn determine_manager(
		&self,
		join_point: &JoinPoint,
		attribute: Option<&TransactionAttribute>,
	) -> Result<Option<ManagerRef>> {
		if let Some(manager) = &self.manager {
			return Ok(Some(manager.clone()));
		}
		let Some(attribute) = attribute else {
			return Ok(None);
		};
		let Some(registry) = &self.registry else {
			return Err(no_manager(join_point));
		};

		let manager = if let Some(qualifier) = attribute.qualifier() {
			debug!("Resolving transaction manager of [{}] by qualifier '{}'", join_point, qualifier);
			registry.qualified(qualifier)?
		} else if let Some(name) = &self.default_manager_name {
			registry.get(name)?
		} else {
			registry.single()?.ok_or_else(|| no_manager(join_point))?
		};
		Ok(Some(manager))
	}

	fn resolve_attribute(&self, join_point: &JoinPoint) -> Result<Option<Arc<TransactionAttribute>>> {
		let attribute = self.source.lookup(join_point)?;
		Ok(attribute.map(|attribute| {
			if attribute.name().is_some() {
				attribute
			} else {
				Arc::new(TransactionAttribute::clone(&attribute).with_name(join_point.identification()))
			}
		}))
	}

	fn create_frame(
		&self,
		ctx: &mut TransactionContext,
		join_point: &JoinPoint,
		attribute: Option<Arc<TransactionAttribute>>,
		manager: Option<ManagerRef>,
	) -> Result<TransactionInfo> {
		let identification = join_point.identification();

		let status = match (&attribute, &manager) {
			(Some(attribute), Some(ManagerRef::Status(manager))) => {
				trace!("Getting transaction for [{}]", identification);
				Some(manager.begin(attribute)?)
			}
			(Some(_), Some(ManagerRef::Callback(_))) => {
				return Err(ConfigurationError::CallbackManagerUnsupported {
					join_point: identification,
				}
				.into());
			}
			(Some(_), None) => return Err(no_manager(join_point)),
			(None, _) => {
				trace!("No transaction needed for [{}]: not transactional", identification);
				None
			}
		};

		Ok(ctx.bind(manager, attribute, identification, status))
	}

	/// Roll back regardless of the rollback rules; a panicked unit of work never commits.
	fn rollback_after_panic(&self, info: &TransactionInfo) -> Result<()> {
		let Some((manager, status)) = Self::frame_transaction(info)? else {
			return Ok(());
		};
		trace!("Rolling back transaction for [{}] after panic", info.join_point());
		manager.rollback(status)
	}

	fn frame_transaction(
		info: &TransactionInfo,
	) -> Result<Option<(&Arc<dyn TransactionManager>, &TransactionStatus)>> {
		let Some(status) = info.status() else {
			return Ok(None);
		};
		match info.manager() {
			Some(ManagerRef::Status(manager)) => Ok(Some((manager, status))),
			Some(ManagerRef::Callback(_)) => Err(TransactionError::illegal_state(format!(
				"transaction of [{}] is completed by its callback-preferring manager",
				info.join_point()
			))),
			None => Err(TransactionError::illegal_state(format!(
				"transaction of [{}] has no manager",
				info.join_point()
			))),
		}
	}

	fn override_application_error<E>(&self, join_point: &str, failure: TransactionError, err: E) -> TransactionError
	where
		E: ClassifiedError,
	{
		error!("Application error of [{}] overridden by transaction failure: {} (original: {})", join_point, failure, err);
		failure.with_application_error(Box::new(err) as BoxError)
	}
}

fn no_manager(join_point: &JoinPoint) -> TransactionError {
	ConfigurationError::NoManagerConfigured {
		join_point: join_point.identification(),
	}
	.into()
}
