// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Pipeline definition and execution

mod definition;
mod engine;
pub mod shell;

pub use definition::{ParallelGroup, PipelineConfig, Step};
pub use engine::{PipelineEngine, PipelineReport};
