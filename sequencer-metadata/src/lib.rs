// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable input and output formats for the test sequencer.
//!
//! A collector writes a [`TestItemListSummary`] describing every test it discovered. The
//! sequencer reads it and produces a [`SequencePlanSummary`]: the same items in execution order,
//! each carrying an order rank and an optional timeout. An external runner consumes the plan.

mod exit_codes;
mod item_list;
mod plan;

pub use exit_codes::*;
pub use item_list::*;
pub use plan::*;
