// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output formats for plans and session context.

use owo_colors::Style;
use serde::Serialize;
use std::io;

/// Output formats for a sequence plan.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum OutputFormat {
    /// A human-readable output format.
    Human {
        /// Whether to produce verbose output.
        verbose: bool,
    },

    /// Machine-readable output format.
    Serializable(SerializableFormat),
}

/// A serialized, machine-readable output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SerializableFormat {
    /// JSON with no whitespace.
    Json,
    /// JSON, prettified.
    JsonPretty,
}

impl SerializableFormat {
    /// Write this data in the given format to the writer.
    pub fn to_writer(
        self,
        value: &impl Serialize,
        mut writer: impl io::Write,
    ) -> serde_json::Result<()> {
        match self {
            SerializableFormat::Json => serde_json::to_writer(&mut writer, value)?,
            SerializableFormat::JsonPretty => serde_json::to_writer_pretty(&mut writer, value)?,
        }
        // One document per line.
        writer.write_all(b"\n").map_err(serde_json::Error::io)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Styles {
    pub(crate) order: Style,
    pub(crate) module: Style,
    pub(crate) test_name: Style,
    pub(crate) timeout: Style,
    pub(crate) group: Style,
    pub(crate) field: Style,
}

impl Styles {
    pub(crate) fn colorize(&mut self) {
        self.order = Style::new().dimmed();
        self.module = Style::new().cyan();
        self.test_name = Style::new().blue().bold();
        self.timeout = Style::new().purple();
        self.group = Style::new().bold();
        self.field = Style::new().yellow().bold();
    }
}
