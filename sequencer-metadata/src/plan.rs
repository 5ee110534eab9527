// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeSet;

/// The sequenced list of test items.
///
/// This is the output format of `test-sequencer plan --message-format json`. Items are listed in
/// execution order, so `items[i].order == i` always holds.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct SequencePlanSummary {
    /// The number of items that have a timeout assigned.
    pub timed_count: usize,

    /// The sequenced items, in execution order.
    pub items: Vec<SequencedItemSummary>,
}

impl SequencePlanSummary {
    /// Creates a new summary from items already in execution order.
    pub fn new(items: impl IntoIterator<Item = SequencedItemSummary>) -> Self {
        let items: Vec<_> = items.into_iter().collect();
        let timed_count = items.iter().filter(|item| item.timeout_secs.is_some()).count();
        Self { timed_count, items }
    }

    /// Parse JSON output produced by `test-sequencer plan`.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }
}

/// A single item in a [`SequencePlanSummary`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct SequencedItemSummary {
    /// The execution rank of this item, counting up from 0.
    pub order: usize,

    /// The identifier of the module containing this test.
    pub module: SmolStr,

    /// The unqualified test function name.
    #[serde(rename = "originalname")]
    pub original_name: SmolStr,

    /// The fully qualified identifier of this instance.
    pub nodeid: String,

    /// The test group this item is in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<SmolStr>,

    /// The tags used to resolve this item's timeout.
    #[serde(default)]
    pub tags: BTreeSet<SmolStr>,

    /// Where the group and tags came from.
    pub tag_source: TagSourceSummary,

    /// The timeout assigned to this item, in whole seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl SequencedItemSummary {
    /// Creates a new item with no group, tags or timeout.
    pub fn new(
        order: usize,
        module: impl Into<SmolStr>,
        original_name: impl Into<SmolStr>,
        nodeid: impl Into<String>,
        tag_source: TagSourceSummary,
    ) -> Self {
        Self {
            order,
            module: module.into(),
            original_name: original_name.into(),
            nodeid: nodeid.into(),
            group: None,
            tags: BTreeSet::new(),
            tag_source,
            timeout_secs: None,
        }
    }

    /// Sets the group for this item.
    pub fn with_group(mut self, group: Option<impl Into<SmolStr>>) -> Self {
        self.group = group.map(Into::into);
        self
    }

    /// Sets the tags for this item.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<SmolStr>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the timeout for this item, in whole seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Where an item's group and tags came from.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TagSourceSummary {
    /// The collector declared the group or tags on the item.
    Declared,

    /// The group or tags were inferred by classification rules.
    Inferred,

    /// The item has no group and no tags.
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_serializes_kebab_case() {
        let summary = SequencePlanSummary::new([SequencedItemSummary::new(
            0,
            "a",
            "x",
            "foundation_models/a.py::x",
            TagSourceSummary::Inferred,
        )
        .with_group(Some("foundation-models"))
        .with_timeout_secs(Some(120))]);
        assert_eq!(summary.timed_count, 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["timed-count"], 1);
        assert_eq!(json["items"][0]["originalname"], "x");
        assert_eq!(json["items"][0]["tag-source"], "inferred");
        assert_eq!(json["items"][0]["timeout-secs"], 120);

        let round_tripped =
            SequencePlanSummary::parse_json(json.to_string()).expect("output parses back");
        assert_eq!(round_tripped, summary);
    }

    #[test]
    fn timed_count_ignores_untimed_items() {
        let summary = SequencePlanSummary::new([
            SequencedItemSummary::new(0, "a", "x", "a.py::x", TagSourceSummary::None),
            SequencedItemSummary::new(1, "b", "y", "b.py::y", TagSourceSummary::Declared)
                .with_tags(["prompt-tuning"])
                .with_timeout_secs(Some(2100)),
        ]);
        assert_eq!(summary.timed_count, 1);
        assert_eq!(summary.items[0].timeout_secs, None);
        assert!(summary.items[1].tags.contains("prompt-tuning"));
    }
}
