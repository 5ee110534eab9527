// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable rendering of the effective configuration.

use crate::{
    config::SequencerConfig,
    helpers::{format_timeout, plural},
    output_format::Styles,
};
use owo_colors::OwoColorize;
use std::io;

/// Shows the effective test groups and classification rules.
#[derive(Clone, Copy, Debug)]
pub struct ShowConfig<'a> {
    config: &'a SequencerConfig,
}

impl<'a> ShowConfig<'a> {
    /// Creates a new `ShowConfig`.
    pub fn new(config: &'a SequencerConfig) -> Self {
        Self { config }
    }

    /// Writes the config to the given writer in a human-friendly format.
    pub fn write_human(&self, mut writer: impl io::Write, colorize: bool) -> io::Result<()> {
        static INDENT: &str = "    ";

        let mut styles = Styles::default();
        if colorize {
            styles.colorize();
        }

        let groups = self.config.test_groups();
        writeln!(
            writer,
            "{} test {}:",
            groups.len().style(styles.group),
            plural::groups_str(groups.len()),
        )?;
        for (group, group_config) in groups {
            write!(writer, "  {}", group.style(styles.group))?;
            match group_config.timeout {
                Some(timeout) => writeln!(
                    writer,
                    " ({} {})",
                    "timeout:".style(styles.field),
                    format_timeout(timeout).style(styles.timeout),
                )?,
                None => writeln!(writer, " ({} none)", "timeout:".style(styles.field))?,
            }
            for timeout_override in &group_config.overrides {
                writeln!(
                    writer,
                    "{INDENT}{} {} => {}",
                    "tag".style(styles.field),
                    timeout_override.tag,
                    format_timeout(timeout_override.timeout).style(styles.timeout),
                )?;
            }
        }

        let rules = self.config.classify_rules();
        writeln!(
            writer,
            "{} classification {}:",
            rules.len().style(styles.group),
            plural::rules_str(rules.len()),
        )?;
        for rule in rules {
            write!(writer, "  {}", rule.matcher())?;
            if let Some(group) = rule.group() {
                write!(writer, " {} {}", "group:".style(styles.field), group)?;
            }
            if let Some(tag) = rule.tag() {
                write!(writer, " {} {}", "tag:".style(styles.field), tag)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}
