// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pins the execution order of a collected test suite and assigns per-item timeouts.
//!
//! `test-sequencer plan` reads the item list produced by a test collector, sorts it by module and
//! test name, and writes a plan with an explicit rank for every item. Items in timed test groups
//! also get a timeout for the external runner to enforce.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;
#[cfg(test)]
mod tests_integration;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
