// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: item list in, sequence plan out.

use camino_tempfile::Utf8TempDir;
use camino_tempfile_ext::prelude::*;
use color_eyre::eyre::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use sequencer_metadata::{SequencePlanSummary, TagSourceSummary};
use sequencer_runner::{
    config::SequencerConfig,
    item::parse_item_list,
    output_format::{OutputFormat, SerializableFormat},
    sequence::Sequencer,
};

const ITEM_LIST: &str = indoc! {r#"
    {
        "items": [
            {
                "module": "test_prompt_tuning_e2e",
                "originalname": "test_04_run_prompt_tuning",
                "nodeid": "tests/foundation_models/test_prompt_tuning_e2e.py::TestPromptTuning::test_04_run_prompt_tuning"
            },
            {
                "module": "test_prompt_tuning_e2e",
                "originalname": "test_01_create_space",
                "nodeid": "tests/foundation_models/test_prompt_tuning_e2e.py::TestPromptTuning::test_01_create_space"
            },
            {
                "module": "test_deployments",
                "originalname": "test_02_deploy",
                "nodeid": "tests/e2e/test_deployments.py::test_02_deploy"
            },
            {
                "module": "test_client",
                "originalname": "test_version",
                "nodeid": "tests/unit/test_client.py::test_version",
                "group": "foundation-models",
                "tags": ["prompt-tuning"]
            }
        ]
    }
"#};

fn plan_with(config: &SequencerConfig) -> Result<SequencePlanSummary> {
    let items = parse_item_list(ITEM_LIST)?;
    let plan = Sequencer::new(config).sequence(items);
    let json = plan.to_string(OutputFormat::Serializable(SerializableFormat::JsonPretty))?;
    Ok(SequencePlanSummary::parse_json(json)?)
}

#[test]
fn default_config_plan() -> Result<()> {
    let temp_dir = Utf8TempDir::with_prefix("sequencer-integration-")?;
    let config = SequencerConfig::from_sources(temp_dir.path(), None)?;
    let summary = plan_with(&config)?;

    let view: Vec<_> = summary
        .items
        .iter()
        .map(|item| {
            (
                item.order,
                format!("{}::{}", item.module, item.original_name),
                item.timeout_secs,
                item.tag_source,
            )
        })
        .collect();
    assert_eq!(
        view,
        vec![
            (
                0,
                "test_client::test_version".to_owned(),
                Some(35 * 60),
                TagSourceSummary::Declared
            ),
            (
                1,
                "test_deployments::test_02_deploy".to_owned(),
                None,
                TagSourceSummary::None
            ),
            (
                2,
                "test_prompt_tuning_e2e::test_01_create_space".to_owned(),
                Some(120),
                TagSourceSummary::Inferred
            ),
            (
                3,
                "test_prompt_tuning_e2e::test_04_run_prompt_tuning".to_owned(),
                Some(35 * 60),
                TagSourceSummary::Inferred
            ),
        ]
    );
    assert_eq!(summary.timed_count, 3);

    Ok(())
}

#[test]
fn repository_config_adds_groups_and_rules() -> Result<()> {
    let temp_dir = Utf8TempDir::with_prefix("sequencer-integration-")?;
    temp_dir
        .child(SequencerConfig::CONFIG_PATH)
        .write_str(indoc! {r#"
            [test-groups.e2e]
            timeout = "10m"

            [test-groups.foundation-models]
            timeout = "5m"

            [[classify]]
            path-segment = "e2e"
            group = "e2e"
        "#})?;

    let config = SequencerConfig::from_sources(temp_dir.path(), None)?;
    let summary = plan_with(&config)?;

    let timeouts: Vec<_> = summary
        .items
        .iter()
        .map(|item| (item.original_name.as_str(), item.group.as_deref(), item.timeout_secs))
        .collect();
    assert_eq!(
        timeouts,
        vec![
            ("test_version", Some("foundation-models"), Some(35 * 60)),
            ("test_02_deploy", Some("e2e"), Some(600)),
            ("test_01_create_space", Some("foundation-models"), Some(300)),
            ("test_04_run_prompt_tuning", Some("foundation-models"), Some(35 * 60)),
        ]
    );

    Ok(())
}

#[test]
fn plan_is_reproducible() -> Result<()> {
    let config = SequencerConfig::default_config("/fake/dir");
    let first = plan_with(&config)?;
    let second = plan_with(&config)?;
    assert_eq!(first, second);

    for (index, item) in first.items.iter().enumerate() {
        assert_eq!(item.order, index, "ranks match positions");
    }

    Ok(())
}
