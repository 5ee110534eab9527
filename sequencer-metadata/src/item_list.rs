// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeSet;

/// The list of test items produced by a collector, before sequencing.
///
/// This is the input format accepted by `test-sequencer plan`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct TestItemListSummary {
    /// The items, in the order the collector discovered them.
    pub items: Vec<TestItemSummary>,
}

impl TestItemListSummary {
    /// Creates a new summary from the given items.
    pub fn new(items: impl IntoIterator<Item = TestItemSummary>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Parse JSON output from a collector.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }
}

/// A single collected test item.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct TestItemSummary {
    /// The identifier of the module containing this test.
    pub module: SmolStr,

    /// The unqualified test function name, shared by all parametrized instances of the test.
    // Collectors in the wild use this exact spelling, so accept it without a hyphen.
    #[serde(rename = "originalname")]
    pub original_name: SmolStr,

    /// The fully qualified identifier of this particular instance, e.g.
    /// `foundation_models/fvt/test_model_init.py::TestTextGeneration::test_01[flan]`.
    pub nodeid: String,

    /// The test group this item was declared in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<SmolStr>,

    /// Tags attached to this item at declaration time.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<SmolStr>,
}

impl TestItemSummary {
    /// Creates a new item with no declared group or tags.
    pub fn new(
        module: impl Into<SmolStr>,
        original_name: impl Into<SmolStr>,
        nodeid: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            original_name: original_name.into(),
            nodeid: nodeid.into(),
            group: None,
            tags: BTreeSet::new(),
        }
    }

    /// Sets the declared group for this item.
    pub fn with_group(mut self, group: impl Into<SmolStr>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Adds a declared tag to this item.
    pub fn with_tag(mut self, tag: impl Into<SmolStr>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}
