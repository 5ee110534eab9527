// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [test-sequencer](https://crates.io/crates/test-sequencer).
//!
//! The main entry point is [`Sequencer`](sequence::Sequencer), which takes a list of collected
//! [`TestItem`](item::TestItem)s and returns them in a fixed execution order, with a timeout
//! assigned to each item in a timed test group.

pub mod config;
pub mod errors;
pub mod helpers;
pub mod item;
pub mod output_format;
pub mod sequence;
pub mod session;
pub mod show_config;
