// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    ClassifyRule, TestGroup, TestGroupConfig, TestTag, classify::DeserializedClassifyRule,
};
use crate::errors::{ConfigParseError, ConfigParseErrorKind, UnknownTestGroupError};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};
use tracing::{debug, warn};

/// Trait for handling configuration warnings.
///
/// This trait allows for different warning handling strategies, such as logging warnings
/// (the default behavior) or collecting them for testing purposes.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        workspace_root: &Utf8Path,
        unknown: &BTreeSet<String>,
    );
}

/// Default implementation of ConfigWarnings that logs warnings using the tracing crate.
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        workspace_root: &Utf8Path,
        unknown: &BTreeSet<String>,
    ) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.push_str(unknown.iter().next().expect("unknown has one element"));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!(
            "in config file {}, ignoring unknown configuration {unknown_str}",
            config_file
                .strip_prefix(workspace_root)
                .unwrap_or(config_file),
        )
    }
}

/// Overall configuration for the test sequencer.
///
/// Declares test groups with their timeouts, and the classification rules used to place
/// untagged items into groups. The built-in [default config](Self::DEFAULT_CONFIG) is always
/// loaded first; a repository config is layered on top of it.
#[derive(Clone, Debug)]
pub struct SequencerConfig {
    workspace_root: Utf8PathBuf,
    test_groups: BTreeMap<TestGroup, TestGroupConfig>,
    // Repository rules come first, followed by the default rules.
    classify: Vec<ClassifyRule>,
}

impl SequencerConfig {
    /// The default location of the config within the workspace root: `.config/sequencer.toml`.
    pub const CONFIG_PATH: &'static str = ".config/sequencer.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// The file name reported for errors in the default config.
    const DEFAULT_CONFIG_NAME: &'static str = "<default config>";

    /// Reads the sequencer config from the given file, or if not specified from
    /// `.config/sequencer.toml` in the workspace root.
    ///
    /// If `config_file` is not specified and the workspace root doesn't have
    /// `.config/sequencer.toml`, uses the default config options.
    pub fn from_sources(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_warnings(workspace_root, config_file, &mut DefaultConfigWarnings)
    }

    /// Load configuration from the given sources with custom warning handling.
    pub fn from_sources_with_warnings(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let workspace_root = workspace_root.into();
        let ReadSources {
            test_groups,
            classify,
        } = Self::read_from_sources(&workspace_root, config_file, warnings)?;
        Ok(Self {
            workspace_root,
            test_groups,
            classify,
        })
    }

    /// Returns the default sequencer config.
    pub fn default_config(workspace_root: impl Into<Utf8PathBuf>) -> Self {
        let deserialized: SequencerConfigDeserialize = Self::make_default_config()
            .build()
            .and_then(|config| config.try_deserialize())
            .expect("default config is always valid");
        let classify = deserialized
            .classify
            .into_iter()
            .enumerate()
            .map(|(index, rule)| rule.validate(index))
            .collect::<Result<Vec<_>, _>>()
            .expect("default classify rules are always valid");

        Self {
            workspace_root: workspace_root.into(),
            test_groups: deserialized.test_groups,
            classify,
        }
    }

    /// Returns the workspace root this config was read relative to.
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Returns the declared test groups.
    pub fn test_groups(&self) -> &BTreeMap<TestGroup, TestGroupConfig> {
        &self.test_groups
    }

    /// Returns the classification rules, in the order they're checked.
    pub fn classify_rules(&self) -> &[ClassifyRule] {
        &self.classify
    }

    /// Resolves the timeout for an item in `group` carrying `tags`.
    ///
    /// Items in no group, or in a group that isn't declared, get no timeout.
    pub fn timeout_for(
        &self,
        group: Option<&TestGroup>,
        tags: &BTreeSet<TestTag>,
    ) -> Option<Duration> {
        self.test_groups.get(group?)?.timeout_for(tags)
    }

    // ---
    // Helper methods
    // ---

    fn read_from_sources(
        workspace_root: &Utf8Path,
        file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<ReadSources, ConfigParseError> {
        let (config_file, source) = match file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        // Classification rules are handled additively, so each file is deserialized on its own.
        let default_rules = {
            let (config, _unknown) = Self::build_and_deserialize_config(
                &Self::make_default_config(),
            )
            .map_err(|kind| ConfigParseError::new(Self::DEFAULT_CONFIG_NAME, kind))?;
            Self::validate_rules(Self::DEFAULT_CONFIG_NAME, config.classify)?
        };

        let repo_rules = {
            let builder = Config::builder().add_source(source.clone());
            let (config, unknown) = Self::build_and_deserialize_config(&builder)
                .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
            if !unknown.is_empty() {
                warnings.unknown_config_keys(&config_file, workspace_root, &unknown);
            }
            Self::validate_rules(&config_file, config.classify)?
        };

        // Test groups are merged key by key with the default config.
        let composite_builder = Self::make_default_config().add_source(source);
        let (composite, _unknown) = Self::build_and_deserialize_config(&composite_builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        let test_groups = composite.test_groups;

        Self::check_timeouts(&config_file, &test_groups)?;

        debug!(
            "loaded {} test groups, {} repository and {} default classify rules",
            test_groups.len(),
            repo_rules.len(),
            default_rules.len(),
        );

        let mut classify = repo_rules;
        let repo_count = classify.len();
        classify.extend(default_rules);

        // Every group named by a rule must be declared.
        let unknown_groups: Vec<_> = classify
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| {
                let group = rule.group()?;
                (!test_groups.contains_key(group)).then(|| UnknownTestGroupError {
                    // Report indexes relative to the file the rule came from.
                    rule_index: if index < repo_count {
                        index
                    } else {
                        index - repo_count
                    },
                    name: group.clone(),
                })
            })
            .collect();
        if !unknown_groups.is_empty() {
            return Err(ConfigParseError::new(
                config_file,
                ConfigParseErrorKind::UnknownTestGroups {
                    errors: unknown_groups,
                    known_groups: test_groups.keys().cloned().collect(),
                },
            ));
        }

        Ok(ReadSources {
            test_groups,
            classify,
        })
    }

    fn validate_rules(
        config_file: impl Into<Utf8PathBuf>,
        rules: Vec<DeserializedClassifyRule>,
    ) -> Result<Vec<ClassifyRule>, ConfigParseError> {
        let mut valid = Vec::with_capacity(rules.len());
        let mut invalid = Vec::new();
        for (index, rule) in rules.into_iter().enumerate() {
            match rule.validate(index) {
                Ok(rule) => valid.push(rule),
                Err(error) => invalid.push(error),
            }
        }

        if invalid.is_empty() {
            Ok(valid)
        } else {
            Err(ConfigParseError::new(
                config_file,
                ConfigParseErrorKind::InvalidClassifyRules(invalid),
            ))
        }
    }

    fn check_timeouts(
        config_file: &Utf8Path,
        test_groups: &BTreeMap<TestGroup, TestGroupConfig>,
    ) -> Result<(), ConfigParseError> {
        for (group, config) in test_groups {
            if config.timeout == Some(Duration::ZERO) {
                return Err(ConfigParseError::new(
                    config_file,
                    ConfigParseErrorKind::ZeroTimeout {
                        group: group.clone(),
                        tag: None,
                    },
                ));
            }
            if let Some(o) = config.overrides.iter().find(|o| o.timeout.is_zero()) {
                return Err(ConfigParseError::new(
                    config_file,
                    ConfigParseErrorKind::ZeroTimeout {
                        group: group.clone(),
                        tag: Some(o.tag.clone()),
                    },
                ));
            }
        }
        Ok(())
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(SequencerConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: SequencerConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // Both serde_path_to_error and the config crate report the key. Drop the key
                // from the config error for consistency.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

struct ReadSources {
    test_groups: BTreeMap<TestGroup, TestGroupConfig>,
    classify: Vec<ClassifyRule>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SequencerConfigDeserialize {
    #[serde(default)]
    test_groups: BTreeMap<TestGroup, TestGroupConfig>,
    #[serde(default)]
    classify: Vec<DeserializedClassifyRule>,
}
