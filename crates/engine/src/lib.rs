// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

// #![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod context;
pub mod coordinator;
pub mod registry;
pub mod source;
pub mod template;

pub use context::{TransactionContext, TransactionInfo};
pub use coordinator::{InvocationCoordinator, InvocationCoordinatorBuilder};
pub use registry::ManagerRegistry;
pub use template::CallbackAdapter;
