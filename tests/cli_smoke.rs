use assert_cmd::prelude::*;
use std::process::Command;

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("ghtally").unwrap();
    // Make sure ambient credentials never leak into the assertions.
    cmd.env_remove("USER_NAME")
        .env_remove("ACCESS_TOKEN")
        .env_remove("GITHUB_TOKEN");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let out = bin().arg("--help").assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("sync"));
    assert!(stdout.contains("stats"));
    assert!(stdout.contains("render"));
}

#[test]
fn sync_without_user_fails_with_guidance() {
    let out = bin().arg("sync").assert().failure();
    let stderr = String::from_utf8(out.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("USER_NAME"));
}

#[test]
fn sync_without_token_fails_with_guidance() {
    let out = bin().args(["--user", "octocat", "sync"]).assert().failure();
    let stderr = String::from_utf8(out.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("ACCESS_TOKEN"));
}

#[test]
fn render_requires_a_template_argument() {
    bin().arg("render").assert().failure();
}
