// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `test-sequencer` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum SequencerExitCode {}

impl SequencerExitCode {
    /// No errors occurred and the sequencer exited normally.
    pub const OK: i32 = 0;

    /// The item list was empty, and `--no-items-ok` was not passed in.
    pub const NO_ITEMS: i32 = 4;

    /// A user issue happened while setting up a sequencer invocation: for example, a
    /// configuration file failed to parse.
    pub const SETUP_ERROR: i32 = 96;

    /// Reading or parsing the collected item list produced an error.
    pub const ITEM_LIST_PARSE_FAILED: i32 = 104;

    /// Loading the session context produced an error.
    pub const SESSION_CONTEXT_FAILED: i32 = 105;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
