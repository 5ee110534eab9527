// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collected test items.

use crate::{
    config::{ClassifyRule, TestGroup, TestTag},
    errors::ItemListParseError,
    sequence::{OrderAnnotation, TimeoutAnnotation},
};
use sequencer_metadata::{TagSourceSummary, TestItemListSummary, TestItemSummary};
use smol_str::SmolStr;
use std::{collections::BTreeSet, io};
use tracing::debug;

/// A single discovered test case.
///
/// Items are produced by an external collector. The sequencer reorders them and attaches
/// annotations, but never creates or removes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestItem {
    module: SmolStr,
    original_name: SmolStr,
    nodeid: String,
    group: Option<TestGroup>,
    tags: BTreeSet<TestTag>,
    tag_source: TagSource,
    order: Option<OrderAnnotation>,
    timeout: Option<TimeoutAnnotation>,
}

impl TestItem {
    /// Creates a new item with no group or tags.
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
            tag_source: TagSource::None,
            order: None,
            timeout: None,
        }
    }

    /// Declares the group for this item.
    pub fn with_group(mut self, group: TestGroup) -> Self {
        self.group = Some(group);
        self.tag_source = TagSource::Declared;
        self
    }

    /// Declares a tag on this item.
    pub fn with_tag(mut self, tag: TestTag) -> Self {
        self.tags.insert(tag);
        self.tag_source = TagSource::Declared;
        self
    }

    /// Converts a collected item summary into an item, validating group and tag names.
    pub fn from_summary(summary: TestItemSummary) -> Result<Self, ItemListParseError> {
        let TestItemSummary {
            module,
            original_name,
            nodeid,
            group,
            tags,
            ..
        } = summary;

        let group = group
            .map(TestGroup::new)
            .transpose()
            .map_err(|err| ItemListParseError::InvalidGroup {
                nodeid: nodeid.clone(),
                err,
            })?;
        let tags = tags
            .into_iter()
            .map(TestTag::new)
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|err| ItemListParseError::InvalidTag {
                nodeid: nodeid.clone(),
                err,
            })?;

        let tag_source = if group.is_some() || !tags.is_empty() {
            TagSource::Declared
        } else {
            TagSource::None
        };

        Ok(Self {
            module,
            original_name,
            nodeid,
            group,
            tags,
            tag_source,
            order: None,
            timeout: None,
        })
    }

    /// Returns the identifier of the module containing this test.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the unqualified test name.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Returns the fully qualified node ID.
    pub fn nodeid(&self) -> &str {
        &self.nodeid
    }

    /// Returns the group this item is in, if any.
    pub fn group(&self) -> Option<&TestGroup> {
        self.group.as_ref()
    }

    /// Returns the tags on this item.
    pub fn tags(&self) -> &BTreeSet<TestTag> {
        &self.tags
    }

    /// Returns where this item's group and tags came from.
    pub fn tag_source(&self) -> TagSource {
        self.tag_source
    }

    /// Returns the order annotation, if the item has been sequenced.
    pub fn order(&self) -> Option<OrderAnnotation> {
        self.order
    }

    /// Returns the timeout annotation, if one was assigned.
    pub fn timeout(&self) -> Option<TimeoutAnnotation> {
        self.timeout
    }

    /// The key items are sorted by.
    pub(crate) fn sort_key(&self) -> (&str, &str) {
        (self.module.as_str(), self.original_name.as_str())
    }

    pub(crate) fn set_order(&mut self, order: OrderAnnotation) {
        self.order = Some(order);
    }

    pub(crate) fn set_timeout(&mut self, timeout: Option<TimeoutAnnotation>) {
        self.timeout = timeout;
    }

    /// Infers a group and tags from `rules` if this item doesn't declare any.
    ///
    /// The first matching rule that names a group decides the group. Tags from every matching
    /// rule are added.
    pub(crate) fn classify(&mut self, rules: &[ClassifyRule]) {
        if self.tag_source != TagSource::None {
            return;
        }

        for rule in rules {
            if !rule.matches(&self.nodeid, &self.original_name) {
                continue;
            }
            if self.group.is_none() {
                self.group = rule.group().cloned();
            }
            if let Some(tag) = rule.tag() {
                self.tags.insert(tag.clone());
            }
        }

        if self.group.is_some() || !self.tags.is_empty() {
            debug!(
                nodeid = %self.nodeid,
                group = ?self.group.as_ref().map(|g| g.as_str()),
                tags = ?self.tags.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                "classified item",
            );
            self.tag_source = TagSource::Inferred;
        }
    }
}

/// Where an item's group and tags came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagSource {
    /// The collector declared a group or tags on the item.
    Declared,

    /// Classification rules inferred the group or tags.
    Inferred,

    /// The item has no group and no tags.
    None,
}

impl TagSource {
    pub(crate) fn to_summary(self) -> TagSourceSummary {
        match self {
            TagSource::Declared => TagSourceSummary::Declared,
            TagSource::Inferred => TagSourceSummary::Inferred,
            TagSource::None => TagSourceSummary::None,
        }
    }
}

/// Reads a collected item list.
pub fn parse_item_list(json: &str) -> Result<Vec<TestItem>, ItemListParseError> {
    let summary = TestItemListSummary::parse_json(json).map_err(ItemListParseError::Json)?;
    items_from_summary(summary)
}

/// Reads a collected item list from a reader.
pub fn read_item_list(reader: impl io::Read) -> Result<Vec<TestItem>, ItemListParseError> {
    let summary: TestItemListSummary =
        serde_json::from_reader(reader).map_err(ItemListParseError::Json)?;
    items_from_summary(summary)
}

fn items_from_summary(summary: TestItemListSummary) -> Result<Vec<TestItem>, ItemListParseError> {
    summary
        .items
        .into_iter()
        .map(TestItem::from_summary)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SequencerConfig;
    use indoc::indoc;

    #[test]
    fn parse_declared_and_undeclared() {
        let input = indoc! {r#"
            {
                "items": [
                    {
                        "module": "a",
                        "originalname": "test_03_run_prompt_tuning",
                        "nodeid": "foundation_models/a.py::test_03_run_prompt_tuning",
                        "group": "foundation-models",
                        "tags": ["prompt-tuning"]
                    },
                    { "module": "b", "originalname": "z", "nodeid": "pkg/b.py::z" }
                ]
            }
        "#};

        let items = parse_item_list(input).expect("input is valid");
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].tag_source(), TagSource::Declared);
        assert_eq!(items[0].group().map(|g| g.as_str()), Some("foundation-models"));
        assert_eq!(items[0].order(), None);

        assert_eq!(items[1].tag_source(), TagSource::None);
        assert_eq!(items[1].group(), None);
        assert!(items[1].tags().is_empty());
    }

    #[test]
    fn parse_invalid_tag() {
        let input = r#"{ "items": [
            { "module": "a", "originalname": "x", "nodeid": "a.py::x", "tags": ["not valid"] }
        ] }"#;

        match parse_item_list(input) {
            Err(ItemListParseError::InvalidTag { nodeid, .. }) => assert_eq!(nodeid, "a.py::x"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn read_from_reader() {
        let input = br#"{ "items": [ { "module": "a", "originalname": "x", "nodeid": "a.py::x" } ] }"#;
        let items = read_item_list(&input[..]).expect("input is valid");
        assert_eq!(items, vec![TestItem::new("a", "x", "a.py::x")]);
    }

    #[test]
    fn classify_undeclared_items() {
        let config = SequencerConfig::default_config("/fake/dir");
        let rules = config.classify_rules();

        let mut tuning = TestItem::new(
            "test_prompt_tuning_e2e",
            "test_03_run_prompt_tuning",
            "foundation_models/fvt/test_prompt_tuning_e2e.py::TestPromptTuning::test_03_run_prompt_tuning",
        );
        tuning.classify(rules);
        assert_eq!(tuning.tag_source(), TagSource::Inferred);
        assert_eq!(tuning.group().map(|g| g.as_str()), Some("foundation-models"));
        assert_eq!(
            tuning.tags().iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            vec!["prompt-tuning"]
        );

        let mut other = TestItem::new("b", "z", "pkg/b.py::z");
        other.classify(rules);
        assert_eq!(other.tag_source(), TagSource::None);
        assert_eq!(other.group(), None);
    }

    #[test]
    fn declared_items_are_not_classified() {
        let config = SequencerConfig::default_config("/fake/dir");

        // Declared as a plain test in another group, even though the path and name match the
        // default rules.
        let mut item = TestItem::new(
            "a",
            "test_run_prompt_tuning_dry",
            "foundation_models/a.py::test_run_prompt_tuning_dry",
        )
        .with_group("smoke".parse().unwrap());
        item.classify(config.classify_rules());

        assert_eq!(item.tag_source(), TagSource::Declared);
        assert_eq!(item.group().map(|g| g.as_str()), Some("smoke"));
        assert!(item.tags().is_empty());
    }
}
