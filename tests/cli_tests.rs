// ABOUTME: CLI-level tests covering exit codes and file-extension enforcement

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::Builder;

fn gkg() -> Command {
    Command::cargo_bin("gkg").unwrap()
}

#[test]
fn running_a_gkg_script_prints_its_output_and_exits_zero() {
    let mut file = Builder::new().suffix(".gkg").tempfile().unwrap();
    writeln!(file, "print 1 + 2;").unwrap();

    gkg()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));
}

#[test]
fn wrong_extension_exits_74() {
    let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "print 1;").unwrap();

    gkg().arg(file.path()).assert().code(74);
}

#[test]
fn runtime_error_exits_65() {
    let mut file = Builder::new().suffix(".gkg").tempfile().unwrap();
    writeln!(file, "print undefinedThing;").unwrap();

    gkg().arg(file.path()).assert().code(65);
}

#[test]
fn two_positional_arguments_is_a_usage_error_exiting_64() {
    gkg().arg("a.gkg").arg("b.gkg").assert().code(64);
}
