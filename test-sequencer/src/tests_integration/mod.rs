// Copyright (c) The test-sequencer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the command-line interface.
//!
//! These live inside the crate so that output can be captured through [`OutputWriter`].

use crate::{ExpectedError, OutputWriter, SequencerApp};
use camino::Utf8PathBuf;
use camino_tempfile::Utf8TempDir;
use camino_tempfile_ext::prelude::*;
use clap::Parser;
use indoc::indoc;
use pretty_assertions::assert_eq;
use sequencer_metadata::{SequencePlanSummary, SequencerExitCode};

const ITEM_LIST: &str = indoc! {r#"
    {
        "items": [
            { "module": "b", "originalname": "z", "nodeid": "pkg/b.py::z" },
            { "module": "a", "originalname": "y", "nodeid": "foundation_models/a.py::y" },
            { "module": "a", "originalname": "x", "nodeid": "foundation_models/a.py::x" }
        ]
    }
"#};

struct TempWorkspace {
    dir: Utf8TempDir,
}

impl TempWorkspace {
    fn new() -> Self {
        let dir = Utf8TempDir::with_prefix("test-sequencer-cli-").expect("created temp dir");
        Self { dir }
    }

    fn root(&self) -> &str {
        self.dir.path().as_str()
    }

    fn write(&self, path: &str, contents: &str) -> Utf8PathBuf {
        let child = self.dir.child(path);
        child.write_str(contents).expect("wrote file");
        child.to_path_buf()
    }
}

fn run(args: &[&str]) -> (Result<i32, ExpectedError>, OutputWriter) {
    let app = SequencerApp::parse_from(
        std::iter::once("test-sequencer").chain(args.iter().copied()),
    );
    let output = app.init_output();
    let mut output_writer = OutputWriter::new_test();
    let result = app.exec(output, &mut output_writer);
    (result, output_writer)
}

#[test]
fn plan_human() {
    let workspace = TempWorkspace::new();
    let items = workspace.write("items.json", ITEM_LIST);

    let (result, output) = run(&[
        "--color",
        "never",
        "plan",
        "--items",
        items.as_str(),
        "--workspace-root",
        workspace.root(),
    ]);
    assert_eq!(result.expect("plan succeeded"), SequencerExitCode::OK);
    assert_eq!(
        output.stdout().expect("stdout is captured"),
        indoc! {"
            0 a::x [timeout: 2m]
            1 a::y [timeout: 2m]
            2 b::z
        "}
    );
}

#[test]
fn plan_json() {
    let workspace = TempWorkspace::new();
    let items = workspace.write("items.json", ITEM_LIST);

    let (result, output) = run(&[
        "plan",
        "--items",
        items.as_str(),
        "--workspace-root",
        workspace.root(),
        "--message-format",
        "json",
    ]);
    assert_eq!(result.expect("plan succeeded"), SequencerExitCode::OK);

    let summary = SequencePlanSummary::parse_json(output.stdout().expect("stdout is captured"))
        .expect("output is valid JSON");
    let view: Vec<_> = summary
        .items
        .iter()
        .map(|item| (item.order, item.nodeid.as_str(), item.timeout_secs))
        .collect();
    assert_eq!(
        view,
        vec![
            (0, "foundation_models/a.py::x", Some(120)),
            (1, "foundation_models/a.py::y", Some(120)),
            (2, "pkg/b.py::z", None),
        ]
    );
}

#[test]
fn plan_with_repository_config() {
    let workspace = TempWorkspace::new();
    let items = workspace.write("items.json", ITEM_LIST);
    workspace.write(
        ".config/sequencer.toml",
        indoc! {r#"
            [test-groups.packages]
            timeout = "30s"

            [[classify]]
            path-segment = "pkg"
            group = "packages"
        "#},
    );

    let (result, output) = run(&[
        "--color",
        "never",
        "plan",
        "--items",
        items.as_str(),
        "--workspace-root",
        workspace.root(),
    ]);
    assert_eq!(result.expect("plan succeeded"), SequencerExitCode::OK);
    assert!(
        output
            .stdout()
            .expect("stdout is captured")
            .contains("2 b::z [timeout: 30s]"),
    );
}

#[test]
fn plan_empty_items() {
    let workspace = TempWorkspace::new();
    let items = workspace.write("items.json", r#"{ "items": [] }"#);
    let base = [
        "plan",
        "--items",
        items.as_str(),
        "--workspace-root",
        workspace.root(),
    ];

    let (result, _) = run(&base);
    let error = result.expect_err("empty item list fails");
    assert_eq!(error.process_exit_code(), SequencerExitCode::NO_ITEMS);

    let (result, output) = run(&[&base[..], &["--no-items-ok"][..]].concat());
    assert_eq!(result.expect("--no-items-ok succeeds"), SequencerExitCode::OK);
    assert_eq!(output.stdout(), Some(""));
}

#[test]
fn plan_invalid_items() {
    let workspace = TempWorkspace::new();
    let items = workspace.write("items.json", r#"{ "items": [ { "module": "a" } ] }"#);

    let (result, _) = run(&[
        "plan",
        "--items",
        items.as_str(),
        "--workspace-root",
        workspace.root(),
    ]);
    match result {
        Err(error @ ExpectedError::ItemListParseError { .. }) => assert_eq!(
            error.process_exit_code(),
            SequencerExitCode::ITEM_LIST_PARSE_FAILED
        ),
        other => panic!("unexpected result: {other:?}"),
    }

    let (result, _) = run(&[
        "plan",
        "--items",
        workspace.dir.path().join("missing.json").as_str(),
        "--workspace-root",
        workspace.root(),
    ]);
    assert!(
        matches!(result, Err(ExpectedError::ItemListReadError { .. })),
        "missing item list is a read error"
    );
}

#[test]
fn plan_invalid_config() {
    let workspace = TempWorkspace::new();
    let items = workspace.write("items.json", ITEM_LIST);
    workspace.write(
        ".config/sequencer.toml",
        indoc! {r#"
            [[classify]]
            name-contains = "test"
            group = "does-not-exist"
        "#},
    );

    let (result, _) = run(&[
        "plan",
        "--items",
        items.as_str(),
        "--workspace-root",
        workspace.root(),
    ]);
    let error = result.expect_err("unknown group fails");
    assert!(matches!(error, ExpectedError::ConfigParseError { .. }));
    assert_eq!(error.process_exit_code(), SequencerExitCode::SETUP_ERROR);
}

#[test]
fn show_config() {
    let workspace = TempWorkspace::new();
    let (result, output) = run(&[
        "--color",
        "never",
        "show-config",
        "--workspace-root",
        workspace.root(),
    ]);
    assert_eq!(result.expect("show-config succeeded"), SequencerExitCode::OK);

    let stdout = output.stdout().expect("stdout is captured");
    assert!(stdout.starts_with("1 test group:\n  foundation-models (timeout: 2m)\n"), "{stdout}");
}

#[test]
fn show_session() {
    let workspace = TempWorkspace::new();
    let credentials = workspace.write(
        "credentials.toml",
        indoc! {r#"
            [platform]
            url = "https://platform.example.com"
            apikey = "super-secret"
        "#},
    );

    let (result, output) = run(&[
        "--color",
        "never",
        "show-session",
        "--credentials",
        credentials.as_str(),
    ]);
    assert_eq!(result.expect("show-session succeeded"), SequencerExitCode::OK);

    let stdout = output.stdout().expect("stdout is captured");
    assert!(stdout.contains("platform url: https://platform.example.com"), "{stdout}");
    assert!(!stdout.contains("super-secret"), "secret is redacted: {stdout}");

    let missing = workspace.write("missing-url.toml", "[platform]\napikey = \"k\"\n");
    let (result, _) = run(&["show-session", "--credentials", missing.as_str()]);
    let error = result.expect_err("missing url fails");
    assert_eq!(
        error.process_exit_code(),
        SequencerExitCode::SESSION_CONTEXT_FAILED
    );
}
