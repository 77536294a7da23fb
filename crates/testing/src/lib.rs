// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Test doubles for code built on demarcate.

mod callback;
mod error;
mod logging;
mod source;
mod transaction;

pub use callback::RecordingCallbackManager;
pub use error::TestError;
pub use logging::{capture_logs, init_tracing};
pub use source::{CountingSource, FailingSource};
pub use transaction::{Event, MemoryTransactionManager};
