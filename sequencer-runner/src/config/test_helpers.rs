// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Test helpers for configuration.

use super::{ConfigWarnings, SequencerConfig};
use crate::errors::ConfigParseError;
use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use camino_tempfile_ext::prelude::*;
use std::collections::BTreeSet;

pub(in crate::config) fn write_repo_config(temp_dir: &Utf8TempDir, config_contents: &str) {
    temp_dir
        .child(SequencerConfig::CONFIG_PATH)
        .write_str(config_contents)
        .expect("error writing config file");
}

pub(in crate::config) fn load_repo_config(
    temp_dir: &Utf8TempDir,
    config_contents: &str,
) -> Result<SequencerConfig, ConfigParseError> {
    write_repo_config(temp_dir, config_contents);
    SequencerConfig::from_sources(temp_dir.path(), None)
}

/// Collects warnings instead of logging them.
#[derive(Default)]
pub(in crate::config) struct CollectedWarnings {
    pub(in crate::config) unknown: BTreeSet<String>,
}

impl ConfigWarnings for CollectedWarnings {
    fn unknown_config_keys(
        &mut self,
        _config_file: &Utf8Path,
        _workspace_root: &Utf8Path,
        unknown: &BTreeSet<String>,
    ) {
        self.unknown.extend(unknown.iter().cloned());
    }
}
