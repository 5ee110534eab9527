// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use itertools::Itertools;
use owo_colors::OwoColorize;
use sequencer_metadata::SequencerExitCode;
use sequencer_runner::errors::*;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are mostly placeholder messages: the expected way to print out errors is
// with the display_to_stderr method, which colorizes errors.

/// An error that the sequencer expects to happen, with a documented exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: camino::FromPathBufError,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("error reading item list")]
    ItemListReadError {
        // None means stdin.
        path: Option<Utf8PathBuf>,
        #[source]
        err: std::io::Error,
    },
    #[error("error parsing item list")]
    ItemListParseError {
        path: Option<Utf8PathBuf>,
        #[source]
        err: ItemListParseError,
    },
    #[error("no items to sequence")]
    NoItems,
    #[error("session context error")]
    SessionContextError {
        #[from]
        err: SessionContextError,
    },
    #[error("writing output failed")]
    WriteOutputError {
        #[from]
        err: WriteOutputError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. } => SequencerExitCode::SETUP_ERROR,
            Self::ItemListReadError { .. } | Self::ItemListParseError { .. } => {
                SequencerExitCode::ITEM_LIST_PARSE_FAILED
            }
            Self::NoItems => SequencerExitCode::NO_ITEMS,
            Self::SessionContextError { .. } => SequencerExitCode::SESSION_CONTEXT_FAILED,
            Self::WriteOutputError { .. } => SequencerExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirFailed { err } => {
                error!("could not determine the current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                error!(
                    "current directory `{}` is not valid UTF-8 (pass in --workspace-root)",
                    err.as_path().display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => match err.kind() {
                ConfigParseErrorKind::UnknownTestGroups {
                    errors,
                    known_groups,
                } => {
                    let known_groups_str = known_groups
                        .iter()
                        .map(|group| group.style(styles.bold))
                        .join(", ");
                    let errors_str = errors
                        .iter()
                        .map(|error| {
                            format!(
                                " - group `{}` in classification rule {}\n",
                                error.name.style(styles.bold),
                                error.rule_index,
                            )
                        })
                        .join("");

                    error!(
                        "for config file `{}`, unknown test groups specified \
                         (known groups: {known_groups_str}):\n{errors_str}",
                        err.config_file(),
                    );
                    None
                }
                ConfigParseErrorKind::InvalidClassifyRules(rules) => {
                    let rules_str = rules.iter().map(|rule| format!(" - {rule}\n")).join("");
                    error!(
                        "for config file `{}`, invalid classification rules:\n{rules_str}",
                        err.config_file(),
                    );
                    None
                }
                _ => {
                    error!("{err}");
                    err.source()
                }
            },
            Self::ItemListReadError { path, err } => {
                error!("failed to read item list from {}", source_str(path.as_ref(), styles));
                Some(err as &dyn Error)
            }
            Self::ItemListParseError { path, err } => {
                error!("failed to parse item list from {}", source_str(path.as_ref(), styles));
                Some(err as &dyn Error)
            }
            Self::NoItems => {
                error!("no items to sequence (pass in --no-items-ok to allow an empty item list)");
                None
            }
            Self::SessionContextError { err } => {
                error!("{err}");
                err.source()
            }
            Self::WriteOutputError { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

fn source_str(path: Option<&Utf8PathBuf>, styles: &StderrStyles) -> String {
    match path {
        Some(path) => format!("`{}`", path.style(styles.bold)),
        None => "standard input".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(ExpectedError::NoItems.process_exit_code(), 4);

        let parse_err = sequencer_runner::item::parse_item_list("not json").unwrap_err();
        let error = ExpectedError::ItemListParseError {
            path: None,
            err: parse_err,
        };
        assert_eq!(
            error.process_exit_code(),
            SequencerExitCode::ITEM_LIST_PARSE_FAILED
        );
    }
}
