// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod composite;
mod method_map;
mod name_match;
pub mod pattern;

pub use composite::CompositeAttributeSource;
pub use method_map::MethodMapAttributeSource;
pub use name_match::NameMatchAttributeSource;
