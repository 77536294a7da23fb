// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use demarcate_core::{JoinPoint, ManagerRef, TransactionAttribute};
use demarcate_engine::{InvocationCoordinator, ManagerRegistry, TransactionContext};
use demarcate_testing::{CountingSource, FailingSource, MemoryTransactionManager, TestError, init_tracing};
use demarcate_type::{ConfigurationError, TransactionError};

fn source() -> CountingSource {
	CountingSource::new()
		.with("plain", TransactionAttribute::required())
		.with("billing", TransactionAttribute::required().with_qualifier("billing"))
		.with("ledger", TransactionAttribute::required().with_qualifier("accounting"))
		.with("empty_qualifier", TransactionAttribute::required().with_qualifier(""))
}

fn join_point(method: &str) -> JoinPoint {
	JoinPoint::new("app::InvoiceService", method)
}

fn managers() -> (Arc<MemoryTransactionManager>, Arc<MemoryTransactionManager>, ManagerRegistry) {
	let orders = Arc::new(MemoryTransactionManager::new());
	let billing = Arc::new(MemoryTransactionManager::new());
	let registry = ManagerRegistry::new()
		.with("orders", ManagerRef::Status(orders.clone()))
		.with_qualified("billing", ["accounting"], ManagerRef::Status(billing.clone()));
	(orders, billing, registry)
}

fn run(coordinator: &InvocationCoordinator, method: &str) -> Result<(), TransactionError> {
	let mut ctx = TransactionContext::new();
	coordinator
		.invoke_within_transaction(&mut ctx, &join_point(method), |_| Ok::<_, TestError>(()))
		.map_err(|err| err.transaction().unwrap())
}

#[test]
fn test_resolve_by_qualifier() {
	init_tracing();
	let (orders, billing, registry) = managers();
	let coordinator = InvocationCoordinator::builder()
		.attribute_source(source())
		.manager_registry(registry)
		.default_manager_name("orders")
		.build()
		.unwrap();

	run(&coordinator, "billing").unwrap();
	run(&coordinator, "ledger").unwrap();

	assert_eq!(billing.commits(), 2);
	assert_eq!(orders.commits(), 0);
}

#[test]
fn test_resolve_by_default_name() {
	let (orders, billing, registry) = managers();
	let coordinator = InvocationCoordinator::builder()
		.attribute_source(source())
		.manager_registry(registry)
		.default_manager_name("orders")
		.build()
		.unwrap();

	run(&coordinator, "plain").unwrap();
	run(&coordinator, "empty_qualifier").unwrap();

	assert_eq!(orders.commits(), 2);
	assert_eq!(billing.commits(), 0);
}

#[test]
fn test_resolve_single_registered() {
	let only = Arc::new(MemoryTransactionManager::new());
	let coordinator = InvocationCoordinator::builder()
		.attribute_source(source())
		.manager_registry(ManagerRegistry::new().with("only", ManagerRef::Status(only.clone())))
		.build()
		.unwrap();

	run(&coordinator, "plain").unwrap();
	assert_eq!(only.commits(), 1);
}

#[test]
fn test_ambiguous_without_default() {
	let (_, _, registry) = managers();
	let coordinator = InvocationCoordinator::builder().attribute_source(source()).manager_registry(registry).build().unwrap();

	let err = run(&coordinator, "plain").unwrap_err();
	assert!(matches!(err, TransactionError::Configuration(ConfigurationError::NoUniqueManager { .. })));
}

#[test]
fn test_unknown_qualifier() {
	let (_, _, registry) = managers();
	let coordinator = InvocationCoordinator::builder()
		.attribute_source(CountingSource::new().with("audit", TransactionAttribute::required().with_qualifier("audit")))
		.manager_registry(registry)
		.build()
		.unwrap();

	let err = run(&coordinator, "audit").unwrap_err();
	assert_eq!(
		err.to_string(),
		ConfigurationError::QualifierNotFound {
			qualifier: "audit".to_string()
		}
		.to_string()
	);
}

#[test]
fn test_unknown_default_name() {
	let (_, _, registry) = managers();
	let coordinator = InvocationCoordinator::builder()
		.attribute_source(source())
		.manager_registry(registry)
		.default_manager_name("inventory")
		.build()
		.unwrap();

	let err = run(&coordinator, "plain").unwrap_err();
	assert!(matches!(err, TransactionError::Configuration(ConfigurationError::ManagerNotFound { .. })));
}

#[test]
fn test_explicit_manager_wins_over_qualifier() {
	let explicit = Arc::new(MemoryTransactionManager::new());
	let (_, billing, registry) = managers();
	let coordinator = InvocationCoordinator::builder()
		.attribute_source(source())
		.transaction_manager(ManagerRef::Status(explicit.clone()))
		.manager_registry(registry)
		.build()
		.unwrap();

	run(&coordinator, "billing").unwrap();
	assert_eq!(explicit.commits(), 1);
	assert_eq!(billing.commits(), 0);
}

#[test]
fn test_no_manager_for_transactional_join_point() {
	let coordinator = InvocationCoordinator::builder().attribute_source(source()).build().unwrap();
	let mut ctx = TransactionContext::new();
	let mut ran = false;

	let err = coordinator
		.invoke_within_transaction(&mut ctx, &join_point("plain"), |_| {
			ran = true;
			Ok::<_, TestError>(())
		})
		.unwrap_err();

	assert!(!ran);
	assert_eq!(err.transaction().unwrap().code(), "TXN_002");
	assert!(ctx.is_empty());
}

#[test]
fn test_no_manager_needed_for_plain_join_point() {
	let coordinator = InvocationCoordinator::builder().attribute_source(source()).build().unwrap();
	run(&coordinator, "unannotated").unwrap();
}

#[test]
fn test_empty_registry_reports_no_manager() {
	let coordinator = InvocationCoordinator::builder()
		.attribute_source(source())
		.manager_registry(ManagerRegistry::new())
		.build()
		.unwrap();

	let err = run(&coordinator, "plain").unwrap_err();
	assert!(matches!(err, TransactionError::Configuration(ConfigurationError::NoManagerConfigured { .. })));
}

#[test]
fn test_source_failure_stops_invocation() {
	let coordinator = InvocationCoordinator::builder()
		.attribute_source(FailingSource::new("metadata unavailable"))
		.transaction_manager(ManagerRef::status(MemoryTransactionManager::new()))
		.build()
		.unwrap();

	let err = run(&coordinator, "plain").unwrap_err();
	assert!(matches!(err, TransactionError::AttributeSource { .. }));
}

#[test]
fn test_registry_changes_seen_by_coordinator() {
	let registry = ManagerRegistry::new();
	let coordinator =
		InvocationCoordinator::builder().attribute_source(source()).manager_registry(registry.clone()).build().unwrap();
	assert!(run(&coordinator, "plain").is_err());

	let late = Arc::new(MemoryTransactionManager::new());
	registry.register("late", ManagerRef::Status(late.clone()));
	run(&coordinator, "plain").unwrap();
	assert_eq!(late.commits(), 1);
}
