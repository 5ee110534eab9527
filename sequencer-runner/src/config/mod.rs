// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for the test sequencer.
//!
//! The default config is embedded in the binary; see [`SequencerConfig::DEFAULT_CONFIG`].

mod classify;
mod config_impl;
mod identifier;
mod test_group;
#[cfg(test)]
mod test_helpers;

pub use classify::*;
pub use config_impl::*;
pub use identifier::*;
pub use test_group::*;
