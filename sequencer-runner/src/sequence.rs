// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordering and timeout assignment for collected test items.
//!
//! Some test harnesses don't cooperate reliably with shared, non-automatic fixtures unless the
//! execution order is pinned. The sequencer pins it: items are sorted by module and then by test
//! name, each item is given an explicit rank, and items in timed test groups are given a timeout
//! for the external runner to enforce.

use crate::{
    config::{SequencerConfig, TestGroup, TestTag},
    errors::WriteOutputError,
    helpers::{format_timeout, plural},
    item::{TagSource, TestItem},
    output_format::{OutputFormat, Styles},
};
use itertools::Itertools;
use owo_colors::OwoColorize;
use sequencer_metadata::{SequencePlanSummary, SequencedItemSummary};
use std::{collections::BTreeSet, fmt, io, time::Duration};
use tracing::debug;

/// The execution rank of an item, counting up from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderAnnotation(usize);

impl OrderAnnotation {
    /// Creates a new order annotation.
    pub fn new(rank: usize) -> Self {
        Self(rank)
    }

    /// Returns the rank.
    pub fn rank(self) -> usize {
        self.0
    }
}

impl fmt::Display for OrderAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The maximum time an item is allowed to run, enforced by the external runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeoutAnnotation(Duration);

impl TimeoutAnnotation {
    /// Creates a new timeout annotation.
    pub fn new(timeout: Duration) -> Self {
        Self(timeout)
    }

    /// Returns the timeout.
    pub fn duration(self) -> Duration {
        self.0
    }
}

impl fmt::Display for TimeoutAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_timeout(self.0))
    }
}

/// Decides the timeout for an item from its group and tags.
pub trait TimeoutPolicy {
    /// Returns the timeout for an item in `group` carrying `tags`, or `None` for no timeout.
    fn timeout_for(&self, group: Option<&TestGroup>, tags: &BTreeSet<TestTag>) -> Option<Duration>;
}

impl TimeoutPolicy for SequencerConfig {
    fn timeout_for(&self, group: Option<&TestGroup>, tags: &BTreeSet<TestTag>) -> Option<Duration> {
        SequencerConfig::timeout_for(self, group, tags)
    }
}

/// Sorts `items` in place and annotates each with its rank and timeout.
///
/// * Items are stable-sorted by `(module, original name)`, so parametrized instances of the same
///   test keep their relative order.
/// * The item at position `i` gets rank `i`.
/// * Each item's timeout is resolved through `policy` from its group and tags.
///
/// This is a pure function of its inputs: it performs no I/O and cannot fail.
pub fn sequence_items(items: &mut [TestItem], policy: &impl TimeoutPolicy) {
    // sort_by is stable.
    items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    for (rank, item) in items.iter_mut().enumerate() {
        item.set_order(OrderAnnotation::new(rank));
        let timeout = policy
            .timeout_for(item.group(), item.tags())
            .map(TimeoutAnnotation::new);
        item.set_timeout(timeout);
    }
}

/// Classifies and sequences collected items according to a [`SequencerConfig`].
#[derive(Clone, Copy, Debug)]
pub struct Sequencer<'cfg> {
    config: &'cfg SequencerConfig,
}

impl<'cfg> Sequencer<'cfg> {
    /// Creates a new sequencer.
    pub fn new(config: &'cfg SequencerConfig) -> Self {
        Self { config }
    }

    /// Infers groups and tags for items that don't declare any.
    pub fn classify(&self, items: &mut [TestItem]) {
        let rules = self.config.classify_rules();
        for item in items.iter_mut() {
            item.classify(rules);
        }
    }

    /// Classifies, sorts and annotates `items` in place.
    pub fn sequence_in_place(&self, items: &mut [TestItem]) {
        self.classify(items);
        sequence_items(items, self.config);
    }

    /// Classifies, sorts and annotates `items`, returning the resulting plan.
    pub fn sequence(&self, mut items: Vec<TestItem>) -> SequencePlan {
        self.sequence_in_place(&mut items);
        let plan = SequencePlan { items };

        debug!(
            "sequenced {} {}, {} with a timeout",
            plan.len(),
            plural::items_str(plan.len()),
            plan.timed_count(),
        );
        plan
    }
}

/// Items in execution order, each annotated with a rank and optional timeout.
///
/// Returned by [`Sequencer::sequence`].
#[derive(Clone, Debug)]
pub struct SequencePlan {
    // Invariant: items[i].order() == Some(OrderAnnotation(i)).
    items: Vec<TestItem>,
}

impl SequencePlan {
    /// Returns the items in execution order.
    pub fn items(&self) -> &[TestItem] {
        &self.items
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items with a timeout.
    pub fn timed_count(&self) -> usize {
        self.items.iter().filter(|item| item.timeout().is_some()).count()
    }

    /// Consumes the plan, returning the items in execution order.
    pub fn into_items(self) -> Vec<TestItem> {
        self.items
    }

    /// Constructs a serializable summary for this plan.
    pub fn to_summary(&self) -> SequencePlanSummary {
        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(rank, item)| {
                SequencedItemSummary::new(
                    item.order().map_or(rank, OrderAnnotation::rank),
                    item.module(),
                    item.original_name(),
                    item.nodeid(),
                    item.tag_source().to_summary(),
                )
                .with_group(item.group().map(|g| g.as_identifier().as_smol_str().clone()))
                .with_tags(item.tags().iter().map(|t| t.as_str()))
                .with_timeout_secs(item.timeout().map(|t| t.duration().as_secs()))
            });

        SequencePlanSummary::new(items)
    }

    /// Outputs this plan in the given format to the given writer.
    pub fn write(
        &self,
        output_format: OutputFormat,
        mut writer: impl io::Write,
        colorize: bool,
    ) -> Result<(), WriteOutputError> {
        match output_format {
            OutputFormat::Human { verbose } => self
                .write_human(&mut writer, verbose, colorize)
                .map_err(WriteOutputError::Io),
            OutputFormat::Serializable(format) => format
                .to_writer(&self.to_summary(), &mut writer)
                .map_err(WriteOutputError::Json),
        }
    }

    /// Outputs this plan as a string with the given format.
    pub fn to_string(&self, output_format: OutputFormat) -> Result<String, WriteOutputError> {
        let mut buf = Vec::with_capacity(1024);
        self.write(output_format, &mut buf, false)?;
        Ok(String::from_utf8(buf).expect("buffer is valid UTF-8"))
    }

    fn write_human(&self, mut writer: impl io::Write, verbose: bool, colorize: bool) -> io::Result<()> {
        let mut styles = Styles::default();
        if colorize {
            styles.colorize();
        }
        let width = self.len().saturating_sub(1).to_string().len();

        for item in &self.items {
            let rank = item.order().map_or(0, OrderAnnotation::rank);
            write!(
                writer,
                "{} {}::{}",
                format!("{rank:>width$}").style(styles.order),
                item.module().style(styles.module),
                item.original_name().style(styles.test_name),
            )?;
            if let Some(timeout) = item.timeout() {
                write!(writer, " [timeout: {}]", timeout.style(styles.timeout))?;
            }
            writeln!(writer)?;

            if verbose {
                let indent = width + 2;
                writeln!(
                    writer,
                    "{:indent$}{} {}",
                    "",
                    "nodeid:".style(styles.field),
                    item.nodeid()
                )?;
                if let Some(group) = item.group() {
                    writeln!(
                        writer,
                        "{:indent$}{} {} ({})",
                        "",
                        "group:".style(styles.field),
                        group,
                        tag_source_str(item.tag_source()),
                    )?;
                }
                if !item.tags().is_empty() {
                    writeln!(
                        writer,
                        "{:indent$}{} {}",
                        "",
                        "tags:".style(styles.field),
                        item.tags().iter().map(|t| t.as_str()).join(", "),
                    )?;
                }
            }
        }

        Ok(())
    }
}

fn tag_source_str(tag_source: TagSource) -> &'static str {
    match tag_source {
        TagSource::Declared => "declared",
        TagSource::Inferred => "inferred",
        TagSource::None => "none",
    }
}
