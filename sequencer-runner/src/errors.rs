// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by test-sequencer.

use crate::config::{TestGroup, TestTag};
use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use itertools::Itertools;
use smol_str::SmolStr;
use std::collections::BTreeSet;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse sequencer config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// Errors occurred while validating classification rules.
    #[error("invalid classification rules: {}", .0.iter().join(", "))]
    InvalidClassifyRules(Vec<InvalidClassifyRule>),

    /// A timeout of zero was specified.
    #[error("{}", zero_timeout_str(.group, .tag.as_ref()))]
    ZeroTimeout {
        /// The group the timeout was specified for.
        group: TestGroup,

        /// The tag override the timeout was specified for, if any.
        tag: Option<TestTag>,
    },

    /// Classification rules referred to test groups that weren't declared.
    #[error("unknown test groups specified by config (destructure this variant for more details)")]
    UnknownTestGroups {
        /// The list of errors that occurred.
        errors: Vec<UnknownTestGroupError>,

        /// Known test groups up to this point.
        known_groups: BTreeSet<TestGroup>,
    },
}

fn zero_timeout_str(group: &TestGroup, tag: Option<&TestTag>) -> String {
    match tag {
        Some(tag) => format!("test group `{group}`, override for tag `{tag}`: timeout must be > 0"),
        None => format!("test group `{group}`: timeout must be > 0"),
    }
}

/// A single invalid classification rule.
///
/// Part of [`ConfigParseErrorKind::InvalidClassifyRules`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidClassifyRule {
    /// None of `nodeid-contains`, `path-segment` or `name-contains` was specified.
    #[error(
        "rule {index}: one of `nodeid-contains`, `path-segment` or `name-contains` must be specified"
    )]
    NoMatcher {
        /// The index of the rule within its config file, counting up from 0.
        index: usize,
    },

    /// More than one matcher was specified.
    #[error(
        "rule {index}: only one of `nodeid-contains`, `path-segment` or `name-contains` can be specified"
    )]
    MultipleMatchers {
        /// The index of the rule within its config file.
        index: usize,
    },

    /// The matcher was an empty string.
    #[error("rule {index}: matcher must not be empty")]
    EmptyMatcher {
        /// The index of the rule within its config file.
        index: usize,
    },

    /// Neither `group` nor `tag` was specified.
    #[error("rule {index}: at least one of `group` or `tag` must be specified")]
    NoEffect {
        /// The index of the rule within its config file.
        index: usize,
    },
}

/// An unknown test group was specified in the config.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownTestGroupError {
    /// The index of the classification rule that referred to the group.
    pub rule_index: usize,

    /// The name of the test group that was unknown.
    pub name: TestGroup,
}

/// An identifier is invalid.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidIdentifier {
    /// The identifier is empty.
    #[error("identifier is empty")]
    Empty,

    /// The identifier is not in the correct Unicode format.
    #[error("invalid identifier `{0}`")]
    InvalidXid(SmolStr),
}

/// An error that occurred while reading a collected item list.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ItemListParseError {
    /// The item list was not valid JSON, or didn't match the expected schema.
    #[error("error deserializing item list")]
    Json(#[source] serde_json::Error),

    /// An item declared a group with an invalid name.
    #[error("item `{nodeid}` declares an invalid group")]
    InvalidGroup {
        /// The node ID of the item.
        nodeid: String,

        /// The underlying error.
        #[source]
        err: InvalidIdentifier,
    },

    /// An item declared a tag with an invalid name.
    #[error("item `{nodeid}` declares an invalid tag")]
    InvalidTag {
        /// The node ID of the item.
        nodeid: String,

        /// The underlying error.
        #[source]
        err: InvalidIdentifier,
    },
}

/// An error that occurs while writing a sequence plan or session context.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteOutputError {
    /// An error occurred while writing the plan to the provided output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),

    /// An error occurred while serializing JSON, or while writing it to the provided output.
    #[error("error serializing to JSON")]
    Json(#[source] serde_json::Error),
}

/// An error that occurred while loading a [`SessionContext`](crate::session::SessionContext).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionContextError {
    /// The credentials file could not be read or deserialized.
    #[error("failed to load credentials from `{credentials_file}`")]
    Load {
        /// The credentials file.
        credentials_file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: Box<ConfigError>,
    },

    /// A required value was missing.
    #[error("credentials in `{credentials_file}` are missing `{key}`")]
    MissingKey {
        /// The credentials file.
        credentials_file: Utf8PathBuf,

        /// The dotted path of the missing key.
        key: &'static str,
    },
}
