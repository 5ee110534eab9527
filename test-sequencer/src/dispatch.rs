// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sequencer_metadata::SequencerExitCode;
use sequencer_runner::{
    config::SequencerConfig,
    errors::WriteOutputError,
    item::{TestItem, read_item_list},
    output_format::{OutputFormat, SerializableFormat},
    sequence::Sequencer,
    session::SessionContext,
    show_config::ShowConfig,
};
use std::{fs::File, io::Write};
use tracing::{debug, info};

/// Pins the execution order of a collected test suite and assigns per-item timeouts.
#[derive(Debug, Parser)]
#[command(
    version,
    bin_name = "test-sequencer",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100
)]
pub struct SequencerApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl SequencerApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Plan(opts) => opts.exec(output, output_writer),
            Command::ShowConfig(opts) => opts.exec(output, output_writer),
            Command::ShowSession(opts) => opts.exec(output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sequence a collected item list
    ///
    /// Reads the item list produced by the test collector, infers groups and tags for items that
    /// don't declare any, and writes the items in execution order with their timeouts. Use
    /// --message-format json to get machine-readable output.
    Plan(PlanOpts),

    /// Show the effective test groups and classification rules
    ShowConfig(ShowConfigOpts),

    /// Load the session context and show it, with secrets redacted
    ShowSession(ShowSessionOpts),
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: workspace-root/.config/sequencer.toml]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Workspace root [default: current directory]
    #[arg(long, value_name = "DIR")]
    workspace_root: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn workspace_root(&self) -> Result<Utf8PathBuf> {
        match &self.workspace_root {
            Some(root) => Ok(root.clone()),
            None => {
                let current_dir = std::env::current_dir()
                    .map_err(|err| ExpectedError::CurrentDirFailed { err })?;
                Utf8PathBuf::try_from(current_dir)
                    .map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })
            }
        }
    }

    fn make_config(&self) -> Result<SequencerConfig> {
        let workspace_root = self.workspace_root()?;
        let config = SequencerConfig::from_sources(&workspace_root, self.config_file.as_deref())?;
        debug!(%workspace_root, "loaded sequencer config");
        Ok(config)
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum MessageFormatOpts {
    /// A human-readable output format.
    #[default]
    Human,
    /// JSON with no whitespace.
    Json,
    /// JSON, prettified.
    JsonPretty,
}

impl MessageFormatOpts {
    fn to_output_format(self, verbose: bool) -> OutputFormat {
        match self {
            Self::Human => OutputFormat::Human { verbose },
            Self::Json => OutputFormat::Serializable(SerializableFormat::Json),
            Self::JsonPretty => OutputFormat::Serializable(SerializableFormat::JsonPretty),
        }
    }
}

#[derive(Debug, Args)]
struct PlanOpts {
    /// Item list to read, or `-` for standard input
    #[arg(long, value_name = "FILE", default_value = "-")]
    items: Utf8PathBuf,

    /// Output format
    #[arg(
        short = 'T',
        long,
        value_enum,
        default_value_t,
        help_heading = "Output options",
        value_name = "FMT"
    )]
    message_format: MessageFormatOpts,

    /// Exit successfully if the item list is empty
    #[arg(long)]
    no_items_ok: bool,

    #[clap(flatten)]
    config_opts: ConfigOpts,
}

impl PlanOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.config_opts.make_config()?;
        let items = read_items(&self.items)?;

        if items.is_empty() {
            if self.no_items_ok {
                info!("item list is empty, nothing to sequence");
            } else {
                return Err(ExpectedError::NoItems);
            }
        }

        let plan = Sequencer::new(&config).sequence(items);

        let mut writer = output_writer.stdout_writer();
        plan.write(
            self.message_format.to_output_format(output.verbose),
            &mut writer,
            output.colorize_stdout(),
        )?;
        writer.flush().map_err(WriteOutputError::Io)?;

        Ok(SequencerExitCode::OK)
    }
}

fn read_items(path: &Utf8Path) -> Result<Vec<TestItem>> {
    if path.as_str() == "-" {
        let stdin = std::io::stdin().lock();
        return read_item_list(stdin)
            .map_err(|err| ExpectedError::ItemListParseError { path: None, err });
    }

    let file = File::open(path).map_err(|err| ExpectedError::ItemListReadError {
        path: Some(path.to_owned()),
        err,
    })?;
    read_item_list(std::io::BufReader::new(file)).map_err(|err| {
        ExpectedError::ItemListParseError {
            path: Some(path.to_owned()),
            err,
        }
    })
}

#[derive(Debug, Args)]
struct ShowConfigOpts {
    #[clap(flatten)]
    config_opts: ConfigOpts,
}

impl ShowConfigOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.config_opts.make_config()?;

        let mut writer = output_writer.stdout_writer();
        ShowConfig::new(&config)
            .write_human(&mut writer, output.colorize_stdout())
            .map_err(WriteOutputError::Io)?;
        writer.flush().map_err(WriteOutputError::Io)?;

        Ok(SequencerExitCode::OK)
    }
}

#[derive(Debug, Args)]
struct ShowSessionOpts {
    /// Credentials file (TOML)
    #[arg(long, value_name = "FILE", env = "SEQUENCER_CREDENTIALS")]
    credentials: Utf8PathBuf,

    /// Output format
    #[arg(
        short = 'T',
        long,
        value_enum,
        default_value_t,
        help_heading = "Output options",
        value_name = "FMT"
    )]
    message_format: MessageFormatOpts,
}

impl ShowSessionOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let context = SessionContext::from_file(&self.credentials)?;

        let mut writer = output_writer.stdout_writer();
        context.write(
            self.message_format.to_output_format(output.verbose),
            &mut writer,
            output.colorize_stdout(),
        )?;
        writer.flush().map_err(WriteOutputError::Io)?;

        Ok(SequencerExitCode::OK)
    }
}
