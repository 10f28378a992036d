use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn cmd() -> Command {
    Command::cargo_bin("ebooktools").unwrap()
}

/// An empty configuration file, so the user's own configuration is never read.
fn empty_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, "").unwrap();
    path
}

#[test]
fn help_flag_prints_usage_with_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("find"))
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("split"))
        .stdout(predicate::str::contains("edit"));
}

#[test]
fn split_subcommand_help() {
    cmd()
        .args(["split", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FOLDER"))
        .stdout(predicate::str::contains("--fpf"))
        .stdout(predicate::str::contains("--output-folder"));
}

#[test]
fn find_prints_isbns_of_a_string() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["-q", "find", "ISBN 978-3-16-148410-0, also 0-306-40615-2"])
        .assert()
        .success()
        .stdout("9783161484100\n0306406152\n");
}

#[test]
fn find_prints_nothing_without_isbns() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["-q", "find", "no numbers here"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn separator_from_config_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "isbn_ret_separator = \",\"\n").unwrap();
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["-q", "find", "0306406152 9783161484100"])
        .assert()
        .success()
        .stdout("0306406152,9783161484100\n");
}

#[test]
fn missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .args(["find", "0306406152"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not load the configuration file"));
}

#[test]
fn invalid_isbn_regex_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["-q", "--isbn-regex", "([0-9]", "find", "0306406152"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn edit_log_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["edit", "log"])
        .assert()
        .failure();
}

#[test]
fn edit_reset_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    cmd()
        .arg("--config")
        .arg(&config)
        .args(["-q", "edit", "main", "--reset"])
        .assert()
        .success();

    let content = std::fs::read_to_string(&config).unwrap();
    assert!(content.contains("isbn_blacklist_regex"));
    assert!(content.contains("ocr_command = \"tesseract\""));
}

#[test]
fn split_rejects_zero_files_per_folder() {
    cmd()
        .args(["split", ".", "--fpf", "0"])
        .assert()
        .failure();
}

#[test]
fn split_dry_run_moves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    let books = dir.path().join("books");
    let output = dir.path().join("out");
    std::fs::create_dir_all(&books).unwrap();
    std::fs::create_dir_all(&output).unwrap();
    std::fs::write(books.join("a.epub"), "a").unwrap();

    cmd()
        .arg("--config")
        .arg(&config)
        .args(["-q", "--dry-run", "split"])
        .arg(&books)
        .arg("--output-folder")
        .arg(&output)
        .assert()
        .success();

    assert!(books.join("a.epub").is_file());
    assert_eq!(std::fs::read_dir(&output).unwrap().count(), 0);
}

#[test]
fn split_moves_books() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    let books = dir.path().join("books");
    let output = dir.path().join("out");
    std::fs::create_dir_all(&books).unwrap();
    std::fs::write(books.join("a.epub"), "a").unwrap();
    std::fs::write(books.join("b.pdf"), "b").unwrap();

    cmd()
        .arg("--config")
        .arg(&config)
        .args(["-q", "split"])
        .arg(&books)
        .args(["-o"])
        .arg(&output)
        .args(["-s", "3", "--fpf", "1", "-f", "batch-%d"])
        .assert()
        .success();

    assert!(output.join("batch-3").join("a.epub").is_file());
    assert!(output.join("batch-4").join("b.pdf").is_file());
    assert!(output.join("batch-4.meta").is_dir());
}
