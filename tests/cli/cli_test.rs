//! Command-line surface of the `pdzs` binary.

use assert_cmd::Command;

fn pdzs() -> Command {
    Command::cargo_bin("pdzs").expect("binary should build")
}

fn stdout_of(args: &[&str]) -> String {
    let output = pdzs().args(args).output().expect("binary should run");
    assert!(output.status.success(), "pdzs {args:?} failed: {output:?}");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn help_lists_subcommands() {
    let help = stdout_of(&["--help"]);
    for command in ["start", "show", "reset", "preview"] {
        assert!(help.contains(command), "help is missing {command}: {help}");
    }
}

#[test]
fn unknown_subcommand_fails() {
    pdzs().arg("frobnicate").assert().failure();
}

#[test]
fn preview_applies_stored_defaults() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let output = pdzs()
        .env("HOME", tmp.path())
        .env("PDZS_DATABASE", tmp.path().join("pdzs.db"))
        .args(["preview", "--chat", "-1001234567890", "Hello 😀"])
        .output()
        .expect("binary should run");
    assert!(output.status.success(), "{output:?}");

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("preview prints JSON");
    assert_eq!(json["text"], "Hello 😀");
    assert_eq!(json["length"], 8);
}

#[test]
fn show_prints_default_settings() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let output = pdzs()
        .env("HOME", tmp.path())
        .env("PDZS_DATABASE", tmp.path().join("pdzs.db"))
        .args(["show", "--chat", "-1001"])
        .output()
        .expect("binary should run");
    assert!(output.status.success(), "{output:?}");

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("show prints JSON");
    assert_eq!(json["separator"], "|");
    assert_eq!(json["disable_preview"], true);
}
