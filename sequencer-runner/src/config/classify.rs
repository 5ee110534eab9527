// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification rules, for collectors that can't attach groups and tags at declaration time.
//!
//! A rule matches an item by a fragment of its node ID, by an exact segment of the path portion
//! of its node ID, or by a fragment of its test name. Rules only apply to items that declare
//! neither a group nor tags.

use super::{TestGroup, TestTag};
use crate::errors::InvalidClassifyRule;
use serde::Deserialize;
use smol_str::SmolStr;
use std::fmt;

/// A validated classification rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifyRule {
    matcher: ClassifyMatcher,
    group: Option<TestGroup>,
    tag: Option<TestTag>,
}

impl ClassifyRule {
    /// Creates a new rule. At least one of `group` and `tag` should be set.
    pub fn new(matcher: ClassifyMatcher, group: Option<TestGroup>, tag: Option<TestTag>) -> Self {
        Self {
            matcher,
            group,
            tag,
        }
    }

    /// Returns the matcher for this rule.
    pub fn matcher(&self) -> &ClassifyMatcher {
        &self.matcher
    }

    /// Returns the group this rule assigns, if any.
    pub fn group(&self) -> Option<&TestGroup> {
        self.group.as_ref()
    }

    /// Returns the tag this rule adds, if any.
    pub fn tag(&self) -> Option<&TestTag> {
        self.tag.as_ref()
    }

    /// Returns true if this rule matches an item with the given node ID and test name.
    pub fn matches(&self, nodeid: &str, original_name: &str) -> bool {
        self.matcher.matches(nodeid, original_name)
    }
}

/// How a [`ClassifyRule`] matches items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassifyMatcher {
    /// Matches if the node ID contains this string anywhere.
    NodeidContains(SmolStr),

    /// Matches if any `/`-separated segment of the node ID's path equals this string exactly.
    ///
    /// The path is the portion of the node ID before the first `::`.
    PathSegment(SmolStr),

    /// Matches if the test name contains this string.
    NameContains(SmolStr),
}

impl ClassifyMatcher {
    /// Returns true if this matcher matches the given node ID and test name.
    pub fn matches(&self, nodeid: &str, original_name: &str) -> bool {
        match self {
            ClassifyMatcher::NodeidContains(fragment) => nodeid.contains(fragment.as_str()),
            ClassifyMatcher::PathSegment(segment) => {
                path_segments(nodeid).any(|s| s == segment.as_str())
            }
            ClassifyMatcher::NameContains(fragment) => original_name.contains(fragment.as_str()),
        }
    }
}

impl fmt::Display for ClassifyMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyMatcher::NodeidContains(fragment) => {
                write!(f, "nodeid-contains = {fragment:?}")
            }
            ClassifyMatcher::PathSegment(segment) => write!(f, "path-segment = {segment:?}"),
            ClassifyMatcher::NameContains(fragment) => write!(f, "name-contains = {fragment:?}"),
        }
    }
}

fn path_segments(nodeid: &str) -> impl Iterator<Item = &str> {
    let path = nodeid.split_once("::").map_or(nodeid, |(path, _)| path);
    path.split(['/', '\\']).filter(|s| !s.is_empty())
}

/// A classification rule as written in a config file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct DeserializedClassifyRule {
    #[serde(default)]
    nodeid_contains: Option<SmolStr>,
    #[serde(default)]
    path_segment: Option<SmolStr>,
    #[serde(default)]
    name_contains: Option<SmolStr>,
    #[serde(default)]
    group: Option<TestGroup>,
    #[serde(default)]
    tag: Option<TestTag>,
}

impl DeserializedClassifyRule {
    pub(super) fn validate(self, index: usize) -> Result<ClassifyRule, InvalidClassifyRule> {
        let mut matchers = [
            self.nodeid_contains.map(ClassifyMatcher::NodeidContains),
            self.path_segment.map(ClassifyMatcher::PathSegment),
            self.name_contains.map(ClassifyMatcher::NameContains),
        ]
        .into_iter()
        .flatten();
        let matcher = match (matchers.next(), matchers.next()) {
            (None, _) => return Err(InvalidClassifyRule::NoMatcher { index }),
            (Some(_), Some(_)) => return Err(InvalidClassifyRule::MultipleMatchers { index }),
            (Some(matcher), None) => matcher,
        };

        let is_empty = match &matcher {
            ClassifyMatcher::NodeidContains(s)
            | ClassifyMatcher::PathSegment(s)
            | ClassifyMatcher::NameContains(s) => s.is_empty(),
        };
        if is_empty {
            return Err(InvalidClassifyRule::EmptyMatcher { index });
        }

        if self.group.is_none() && self.tag.is_none() {
            return Err(InvalidClassifyRule::NoEffect { index });
        }

        Ok(ClassifyRule::new(matcher, self.group, self.tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("foundation_models/a.py::y", true ; "leading directory")]
    #[test_case("foundation_models_extra/a.py::y", true ; "directory prefix")]
    #[test_case("tests/test_foundation_models.py::test_00", true ; "file name")]
    #[test_case("pkg/c.py::test_foundation_models", true ; "test name")]
    #[test_case("pkg/b.py::z", false ; "unrelated")]
    #[test_case("pkg/foundation-models/b.py::z", false ; "different spelling")]
    fn nodeid_contains_matcher(nodeid: &str, expected: bool) {
        let matcher = ClassifyMatcher::NodeidContains("foundation_models".into());
        assert_eq!(matcher.matches(nodeid, "test_00"), expected);
    }

    #[test_case("foundation_models/a.py::y", true ; "leading segment")]
    #[test_case("tests/foundation_models/fvt/test_model_init.py::TestTextGeneration::test_01", true ; "nested segment")]
    #[test_case(r"tests\foundation_models\fvt\test_x.py::test_01", true ; "windows separators")]
    #[test_case("pkg/b.py::z", false ; "unrelated path")]
    #[test_case("pkg/foundation_models_extra/b.py::z", false ; "segment prefix does not match")]
    #[test_case("pkg/b.py::foundation_models", false ; "test name is not a path segment")]
    fn path_segment_matcher(nodeid: &str, expected: bool) {
        let matcher = ClassifyMatcher::PathSegment("foundation_models".into());
        assert_eq!(matcher.matches(nodeid, "test_00"), expected);
    }

    #[test_case("test_03_run_prompt_tuning", true ; "suffix")]
    #[test_case("run_prompt_tuning", true ; "exact")]
    #[test_case("test_04_get_run_status", false ; "other test")]
    fn name_contains_matcher(name: &str, expected: bool) {
        let matcher = ClassifyMatcher::NameContains("run_prompt_tuning".into());
        assert_eq!(matcher.matches("foundation_models/a.py::x", name), expected);
    }

    fn deserialized(
        nodeid_contains: Option<&str>,
        path_segment: Option<&str>,
        name_contains: Option<&str>,
        group: Option<&str>,
        tag: Option<&str>,
    ) -> DeserializedClassifyRule {
        DeserializedClassifyRule {
            nodeid_contains: nodeid_contains.map(SmolStr::from),
            path_segment: path_segment.map(SmolStr::from),
            name_contains: name_contains.map(SmolStr::from),
            group: group.map(|g| g.parse().unwrap()),
            tag: tag.map(|t| t.parse().unwrap()),
        }
    }

    #[test]
    fn validate_rules() {
        assert_eq!(
            deserialized(None, None, None, Some("g"), None).validate(3),
            Err(InvalidClassifyRule::NoMatcher { index: 3 })
        );
        assert_eq!(
            deserialized(None, Some("a"), Some("b"), Some("g"), None).validate(0),
            Err(InvalidClassifyRule::MultipleMatchers { index: 0 })
        );
        assert_eq!(
            deserialized(Some("a"), None, Some("b"), None, Some("t")).validate(4),
            Err(InvalidClassifyRule::MultipleMatchers { index: 4 })
        );
        assert_eq!(
            deserialized(Some(""), None, None, Some("g"), None).validate(1),
            Err(InvalidClassifyRule::EmptyMatcher { index: 1 })
        );
        assert_eq!(
            deserialized(None, Some("a"), None, None, None).validate(2),
            Err(InvalidClassifyRule::NoEffect { index: 2 })
        );

        let rule = deserialized(None, None, Some("run_prompt_tuning"), None, Some("prompt-tuning"))
            .validate(0)
            .expect("rule is valid");
        assert_eq!(
            rule.matcher(),
            &ClassifyMatcher::NameContains("run_prompt_tuning".into())
        );
        assert_eq!(rule.group(), None);
        assert_eq!(rule.tag().map(|t| t.as_str()), Some("prompt-tuning"));

        let rule = deserialized(
            Some("foundation_models"),
            None,
            None,
            Some("foundation-models"),
            None,
        )
        .validate(0)
        .expect("rule is valid");
        assert_eq!(
            rule.matcher(),
            &ClassifyMatcher::NodeidContains("foundation_models".into())
        );
        assert!(rule.matches("tests/test_foundation_models.py::test_00", "test_00"));
    }
}
