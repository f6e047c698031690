use anyhow::Result;
use chrono::Local;
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::CliTest;
use crate::stub_api::StubApi;

const CONFIG: &str = ".github/pmw-config.json";
const SHA: &str = "8e5e7e5ab8b370d6c329ec480221332ada57f0ab";
const SHA_MAIN: &str = "2b6b8e8a5d3f0c1e4a7b9d2c6e1f3a5b7c9d0e2f";

const CHECKOUT_TAGS: (&str, u16, &str) = (
    "/repos/actions/checkout/tags",
    200,
    r#"[
        {"name": "v4.0.0", "commit": {"sha": "0000000000000000000000000000000000000000"}},
        {"name": "v4.1.1", "commit": {"sha": "8e5e7e5ab8b370d6c329ec480221332ada57f0ab"}},
        {"name": "v3.6.0", "commit": {"sha": "1111111111111111111111111111111111111111"}}
    ]"#,
);

const TOOL_MAIN: (&str, u16, &str) = (
    "/repos/octo/tool/git/ref/heads/main",
    200,
    r#"{"ref": "refs/heads/main", "object": {"type": "commit", "sha": "2b6b8e8a5d3f0c1e4a7b9d2c6e1f3a5b7c9d0e2f"}}"#,
);

const CHOICES: &str = "Choose option: (y)es, (n)o, (a)dd to allowedOrgs, (q)uit: ";

fn accepted(test: &CliTest) -> Result<Value> {
    let config: Value = serde_json::from_str(&test.read_file(CONFIG)?)?;
    Ok(config["acceptedMapping"].clone())
}

fn config_with(allowed: &[&str], accepted: &[(&str, &str)]) -> String {
    let mapping: serde_json::Map<String, Value> = accepted
        .iter()
        .map(|(key, sha)| (key.to_string(), Value::from(*sha)))
        .collect();
    serde_json::json!({
        "allowedOrgs": allowed,
        "acceptedMapping": mapping,
    })
    .to_string()
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_first_run_creates_config_from_input() -> Result<()> {
    let test = CliTest::with_file(
        ".github/workflows/ci.yml",
        "steps:\n  - uses: actions/checkout@v4\n",
    )?;

    let output = test.run_with_input(test.command(), "actions, my-org,\n")?;

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("No configuration found."));

    let config: Value = serde_json::from_str(&test.read_file(CONFIG)?)?;
    assert_eq!(config["allowedOrgs"], serde_json::json!(["actions", "my-org"]));
    assert_eq!(config["acceptedMapping"], serde_json::json!({}));

    // Allowed organization: left on its tag
    assert_eq!(
        test.read_file(".github/workflows/ci.yml")?,
        "steps:\n  - uses: actions/checkout@v4\n"
    );

    Ok(())
}

#[test]
fn test_accepted_mapping_rewrites_without_prompt() -> Result<()> {
    let test = CliTest::with_file(
        ".github/workflows/ci.yml",
        "jobs:\r\n  build:\r\n    steps:\r\n      - uses: actions/checkout@v4\r\n      - run: make\r\n",
    )?;
    test.write_file(CONFIG, &config_with(&[], &[("actions/checkout@v4", SHA)]))?;

    let output = test.command().output()?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        test.read_file(".github/workflows/ci.yml")?,
        format!(
            "jobs:\r\n  build:\r\n    steps:\r\n      - uses: actions/checkout@{} #v4\r\n      - run: make\r\n",
            SHA
        )
    );

    let out = stdout(&output);
    assert!(out.contains(&format!(
        "Previously accepted for actions/checkout@v4: using commit {}",
        SHA
    )));
    assert!(out.contains("Updated file:"));
    assert!(out.contains("Pinned 1 reference(s) in 1 file(s) (1 workflow file(s) checked)."));

    Ok(())
}

#[test]
fn test_branch_pin_records_date() -> Result<()> {
    let test = CliTest::with_file(".github/workflows/nightly.yaml", "  uses: octo/tool@main\n")?;
    test.write_file(CONFIG, &config_with(&[], &[("octo/tool@main", SHA)]))?;

    let output = test.command().output()?;

    assert_eq!(output.status.code(), Some(0));
    let today = Local::now().date_naive().format("%Y-%m-%d");
    assert_eq!(
        test.read_file(".github/workflows/nightly.yaml")?,
        format!("  uses: octo/tool@{} #main-{}\n", SHA, today)
    );

    Ok(())
}

#[test]
fn test_allowed_and_pinned_references_untouched() -> Result<()> {
    let workflow = format!(
        "steps:\n  - uses: Actions/setup-node@v4\n  - uses: octo/tool@{} #v1\n",
        SHA
    );
    let test = CliTest::with_file(".github/workflows/ci.yml", &workflow)?;
    test.write_file(CONFIG, &config_with(&["actions"], &[]))?;

    let output = test.command().output()?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(test.read_file(".github/workflows/ci.yml")?, workflow);
    assert!(stdout(&output).contains("No references pinned (1 workflow file(s) checked)."));

    Ok(())
}

#[test]
fn test_resolution_failure_is_reported_and_run_continues() -> Result<()> {
    let test = CliTest::with_file(
        ".github/workflows/ci.yml",
        "steps:\n  - uses: unknown/repo@v1\n  - uses: actions/checkout@v4\n",
    )?;
    test.write_file(CONFIG, &config_with(&[], &[("actions/checkout@v4", SHA)]))?;

    let output = test.command().output()?;

    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).contains("Failed to retrieve commit SHA for unknown/repo@v1"));
    assert_eq!(
        test.read_file(".github/workflows/ci.yml")?,
        format!(
            "steps:\n  - uses: unknown/repo@v1\n  - uses: actions/checkout@{} #v4\n",
            SHA
        )
    );

    Ok(())
}

#[test]
fn test_docker_references_ignored() -> Result<()> {
    let workflow = "steps:\n  - uses: docker://alpine/git@v2.40\n";
    let test = CliTest::with_file(".github/workflows/ci.yml", workflow)?;
    test.write_file(CONFIG, &config_with(&[], &[]))?;

    let output = test.command().output()?;

    assert_eq!(output.status.code(), Some(0));
    assert!(!stderr(&output).contains("Failed to retrieve"));
    assert_eq!(test.read_file(".github/workflows/ci.yml")?, workflow);

    Ok(())
}

#[test]
fn test_custom_config_path() -> Result<()> {
    let test = CliTest::with_file(".github/workflows/ci.yml", "  uses: actions/cache@v3\n")?;
    test.write_file("pins.json", &config_with(&[], &[("actions/cache@v3", SHA)]))?;

    let output = test.command().args(["-c", "pins.json"]).output()?;

    assert_eq!(output.status.code(), Some(0));
    assert!(!test.root().join(CONFIG).exists());
    assert_eq!(
        test.read_file(".github/workflows/ci.yml")?,
        format!("  uses: actions/cache@{} #v3\n", SHA)
    );

    Ok(())
}

#[test]
fn test_missing_workflows_directory() -> Result<()> {
    let test = CliTest::with_file(CONFIG, &config_with(&["actions"], &[]))?;

    let output = test.command().output()?;

    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).contains("Cannot access path"));
    assert!(stdout(&output).contains("No references pinned (0 workflow file(s) checked)."));

    Ok(())
}

#[test]
fn test_invalid_config_fails() -> Result<()> {
    let test = CliTest::with_file(CONFIG, "{ not json")?;

    let output = test.command().output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Failed to parse config file"));

    Ok(())
}

#[test]
fn test_config_saved_after_run() -> Result<()> {
    let test = CliTest::with_file(".github/workflows/ci.yml", "  uses: actions/cache@v3\n")?;
    test.write_file(
        CONFIG,
        "{\"allowedOrgs\": [\"octo\"], \"acceptedMapping\": {\"actions/cache@v3\": \"abc\"}}",
    )?;

    let output = test.command().output()?;

    assert_eq!(output.status.code(), Some(0));
    // Rewritten in the tool's own layout
    assert_eq!(
        test.read_file(CONFIG)?,
        "{\n  \"allowedOrgs\": [\n    \"octo\"\n  ],\n  \"acceptedMapping\": {\n    \"actions/cache@v3\": \"abc\"\n  }\n}"
    );

    Ok(())
}

#[test]
fn test_accept_then_quit_saves_progress() -> Result<()> {
    let api = StubApi::start(&[CHECKOUT_TAGS, TOOL_MAIN])?;
    let workflow = "steps:\n  - uses: actions/checkout@v4\n  - uses: octo/tool@main\n";
    let test = CliTest::with_file(".github/workflows/a.yml", workflow)?;
    test.write_file(".github/workflows/b.yml", "  - uses: octo/later@v1\n")?;
    test.write_file(CONFIG, &config_with(&[], &[]))?;

    let output = test.run_with_input(test.api_command(api.url()), "y\nq\n")?;

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains(&format!("[+]New: uses: actions/checkout@{} #v4", SHA)));
    assert!(out.contains("[.]Latest tag for v4: v4.1.1"));
    assert!(out.contains("Quitting processing..."));
    assert_eq!(out.matches(CHOICES).count(), 2);

    assert_eq!(
        test.read_file(".github/workflows/a.yml")?,
        format!(
            "steps:\n  - uses: actions/checkout@{} #v4\n  - uses: octo/tool@main\n",
            SHA
        )
    );
    assert_eq!(
        test.read_file(".github/workflows/b.yml")?,
        "  - uses: octo/later@v1\n"
    );
    assert_eq!(
        accepted(&test)?,
        serde_json::json!({ "actions/checkout@v4": SHA })
    );

    Ok(())
}

#[test]
fn test_accepted_branch_pin() -> Result<()> {
    let api = StubApi::start(&[TOOL_MAIN])?;
    let test = CliTest::with_file(".github/workflows/ci.yml", "    - uses: octo/tool@main\n")?;
    test.write_file(CONFIG, &config_with(&[], &[]))?;

    let output = test.run_with_input(test.api_command(api.url()), "yes\n")?;

    assert_eq!(output.status.code(), Some(0));
    let today = Local::now().date_naive().format("%Y-%m-%d");
    assert_eq!(
        test.read_file(".github/workflows/ci.yml")?,
        format!("    - uses: octo/tool@{} #main-{}\n", SHA_MAIN, today)
    );
    assert_eq!(
        accepted(&test)?,
        serde_json::json!({ "octo/tool@main": SHA_MAIN })
    );

    Ok(())
}

#[test]
fn test_allow_org_from_prompt() -> Result<()> {
    let api = StubApi::start(&[TOOL_MAIN])?;
    let workflow = "steps:\n  - uses: octo/tool@main\n  - uses: octo/other@v1\n";
    let test = CliTest::with_file(".github/workflows/ci.yml", workflow)?;
    test.write_file(CONFIG, &config_with(&["actions"], &[]))?;

    let output = test.run_with_input(test.api_command(api.url()), "a\n")?;

    assert_eq!(output.status.code(), Some(0));
    // The second octo reference is skipped without a prompt
    assert_eq!(stdout(&output).matches(CHOICES).count(), 1);
    assert!(stdout(&output).contains("Added octo to allowed organizations."));
    assert_eq!(test.read_file(".github/workflows/ci.yml")?, workflow);

    let config: Value = serde_json::from_str(&test.read_file(CONFIG)?)?;
    assert_eq!(config["allowedOrgs"], serde_json::json!(["actions", "octo"]));
    assert_eq!(config["acceptedMapping"], serde_json::json!({}));

    Ok(())
}

#[test]
fn test_nested_tag_note_shown() -> Result<()> {
    let api = StubApi::start(&[
        (
            "/repos/octo/tool/git/ref/heads/master",
            200,
            r#"{"object": {"type": "tag", "sha": "tagA"}}"#,
        ),
        (
            "/repos/octo/tool/git/tags/tagA",
            200,
            r#"{"object": {"type": "commit", "sha": "2b6b8e8a5d3f0c1e4a7b9d2c6e1f3a5b7c9d0e2f"}}"#,
        ),
    ])?;
    let test = CliTest::with_file(".github/workflows/ci.yml", "  uses: octo/tool@master\n")?;
    test.write_file(CONFIG, &config_with(&[], &[]))?;

    let output = test.run_with_input(test.api_command(api.url()), "y\n")?;

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains(&format!(
        "note: master points to an annotated tag, followed 1 level(s); verify at {}/repos/octo/tool/git/ref/heads/master",
        api.url()
    )));
    assert!(!out.contains("warning:"));
    assert!(test
        .read_file(".github/workflows/ci.yml")?
        .starts_with(&format!("  uses: octo/tool@{} #master-", SHA_MAIN)));

    Ok(())
}

#[test]
fn test_unreadable_tag_object_is_flagged() -> Result<()> {
    let api = StubApi::start(&[
        (
            "/repos/octo/tool/git/ref/heads/main",
            200,
            r#"{"object": {"type": "tag", "sha": "tagA"}}"#,
        ),
        ("/repos/octo/tool/git/tags/tagA", 200, "not json"),
    ])?;
    let workflow = "  uses: octo/tool@main\n";
    let test = CliTest::with_file(".github/workflows/ci.yml", workflow)?;
    test.write_file(CONFIG, &config_with(&[], &[]))?;

    let output = test.run_with_input(test.api_command(api.url()), "n\n")?;

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("note: main points to an annotated tag, followed 0 level(s)"));
    assert!(out.contains(
        "warning: a tag object could not be read; the proposed sha is a tag object, not a commit"
    ));
    assert_eq!(test.read_file(".github/workflows/ci.yml")?, workflow);

    Ok(())
}

/// Read from `stdout` until `pattern` has appeared `count` times.
#[cfg(unix)]
fn wait_for_output(stdout: &mut impl std::io::Read, pattern: &str, count: usize) -> Result<String> {
    let mut seen = String::new();
    let mut buffer = [0u8; 1024];
    while seen.matches(pattern).count() < count {
        let read = stdout.read(&mut buffer)?;
        anyhow::ensure!(read > 0, "output ended before prompt: {}", seen);
        seen.push_str(&String::from_utf8_lossy(&buffer[..read]));
    }
    Ok(seen)
}

#[cfg(unix)]
#[test]
fn test_interrupt_saves_last_checkpoint() -> Result<()> {
    use std::io::Write;
    use std::process::{Command, Stdio};

    use anyhow::Context;

    let api = StubApi::start(&[CHECKOUT_TAGS, TOOL_MAIN])?;
    let workflow = "steps:\n  - uses: actions/checkout@v4\n  - uses: octo/tool@main\n";
    let test = CliTest::with_file(".github/workflows/ci.yml", workflow)?;
    test.write_file(CONFIG, &config_with(&[], &[]))?;

    let mut child = test
        .api_command(api.url())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let mut stdin = child.stdin.take().context("stdin not captured")?;
    let mut stdout = child.stdout.take().context("stdout not captured")?;

    // Accept the first reference, then stay blocked on the second prompt
    stdin.write_all(b"y\n")?;
    wait_for_output(&mut stdout, CHOICES, 2)?;

    let killed = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()?;
    assert!(killed.success());
    let status = child.wait()?;
    drop(stdin);

    assert_eq!(status.code(), Some(0));
    assert_eq!(
        accepted(&test)?,
        serde_json::json!({ "actions/checkout@v4": SHA })
    );
    // Interrupted runs persist decisions only; files are left as they were
    assert_eq!(test.read_file(".github/workflows/ci.yml")?, workflow);

    Ok(())
}
