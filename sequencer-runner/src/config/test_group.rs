// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::ConfigIdentifier;
use crate::errors::InvalidIdentifier;
use serde::Deserialize;
use smol_str::SmolStr;
use std::{collections::BTreeSet, fmt, str::FromStr, time::Duration};

/// A named test group, e.g. `foundation-models`.
///
/// Groups are declared in configuration under `[test-groups.<name>]`. An item is in at most one
/// group.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TestGroup(ConfigIdentifier);

impl TestGroup {
    /// Creates a new test group, returning an error if the name is invalid.
    pub fn new(name: SmolStr) -> Result<Self, InvalidIdentifier> {
        ConfigIdentifier::new(name).map(Self)
    }

    /// Returns the test group as a [`ConfigIdentifier`].
    pub fn as_identifier(&self) -> &ConfigIdentifier {
        &self.0
    }

    /// Returns the test group as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<'de> Deserialize<'de> for TestGroup {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        ConfigIdentifier::deserialize(deserializer).map(Self)
    }
}

impl FromStr for TestGroup {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.into())
    }
}

impl fmt::Display for TestGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tag attached to a test item, e.g. `prompt-tuning`.
///
/// Tags select timeout overrides within a group.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TestTag(ConfigIdentifier);

impl TestTag {
    /// Creates a new tag, returning an error if the name is invalid.
    pub fn new(name: SmolStr) -> Result<Self, InvalidIdentifier> {
        ConfigIdentifier::new(name).map(Self)
    }

    /// Returns the tag as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<'de> Deserialize<'de> for TestTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        ConfigIdentifier::deserialize(deserializer).map(Self)
    }
}

impl FromStr for TestTag {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.into())
    }
}

impl fmt::Display for TestTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for a test group.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TestGroupConfig {
    /// The timeout for items in this group that don't match any override.
    ///
    /// If unset, such items get no timeout.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,

    /// Tag-based overrides, checked in order.
    #[serde(default)]
    pub overrides: Vec<TimeoutOverride>,
}

impl TestGroupConfig {
    /// Resolves the timeout for an item in this group carrying the given tags.
    ///
    /// The first override whose tag is in `tags` wins. Otherwise the group's own timeout is used.
    pub fn timeout_for(&self, tags: &BTreeSet<TestTag>) -> Option<Duration> {
        self.overrides
            .iter()
            .find(|o| tags.contains(&o.tag))
            .map(|o| o.timeout)
            .or(self.timeout)
    }
}

/// A timeout that applies to items in a group carrying a particular tag.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TimeoutOverride {
    /// The tag this override applies to.
    pub tag: TestTag,

    /// The timeout for matching items.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}
