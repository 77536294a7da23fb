// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

pub mod error;

pub use error::{BoxError, CompletionAction, ConfigurationError, InvocationError, TransactionError};

pub type Result<T> = std::result::Result<T, TransactionError>;
