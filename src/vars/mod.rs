// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Runtime variables
//!
//! Builds the per-run substitution context, interpolates tokens into
//! command templates, and evaluates step conditions.

mod condition;
mod context;
mod interpolate;

pub use condition::evaluate;
pub use context::RuntimeContext;
pub use interpolate::interpolate;
