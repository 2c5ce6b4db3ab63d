// Cucumber step functions receive captured strings as owned `String` values;
// clippy's needless_pass_by_value lint does not apply here.
#![allow(clippy::needless_pass_by_value)]

use std::path::PathBuf;

use cucumber::gherkin::Step;
use cucumber::{World, given, then, when};
use tempfile::TempDir;

// =============================================================================
// CliWorld: runs the keycmd binary in an isolated home directory
// =============================================================================

#[derive(Debug, Default, World)]
struct CliWorld {
    binary_path: Option<PathBuf>,
    home: Option<TempDir>,
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
}

impl CliWorld {
    fn home(&mut self) -> PathBuf {
        self.home
            .get_or_insert_with(|| TempDir::new().expect("failed to create temp home"))
            .path()
            .to_path_buf()
    }
}

fn binary_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_BIN_EXE_keycmd"));
    if let Ok(canonical) = path.canonicalize() {
        path = canonical;
    }
    path
}

fn parse_json(text: &str, stream: &str) -> serde_json::Value {
    let trimmed = text.trim();
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("{stream} is not valid JSON: {e}\n{stream}: {trimmed}"))
}

// --- Given steps ---

#[given("keycmd is built")]
fn keycmd_is_built(world: &mut CliWorld) {
    let path = binary_path();
    assert!(path.exists(), "Binary not found at {}", path.display());
    world.binary_path = Some(path);
}

#[given("a config file containing:")]
fn config_file_containing(world: &mut CliWorld, step: &Step) {
    let contents = step.docstring.as_deref().expect("step needs a docstring");
    let path = world.home().join(".keycmd.toml");
    std::fs::write(&path, contents)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}

// --- When steps ---

fn run_keycmd(world: &mut CliWorld, args: &[String]) {
    let binary = world
        .binary_path
        .clone()
        .expect("Binary path not set, did you forget 'Given keycmd is built'?");
    let home = world.home();

    let output = std::process::Command::new(&binary)
        .args(args)
        .current_dir(&home)
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("KEYCMD_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run {}: {e}", binary.display()));

    world.stdout = String::from_utf8_lossy(&output.stdout).to_string();
    world.stderr = String::from_utf8_lossy(&output.stderr).to_string();
    world.exit_code = Some(output.status.code().unwrap_or(-1));
}

#[when(expr = "I run {string}")]
fn i_run_command(world: &mut CliWorld, command_line: String) {
    let parts = shlex::split(&command_line)
        .unwrap_or_else(|| panic!("unbalanced quotes in step: {command_line}"));
    let args = match parts.split_first() {
        Some((first, rest)) if first == "keycmd" => rest,
        _ => &parts[..],
    };
    run_keycmd(world, args);
}

/// Passes the docstring verbatim as the single argument of `keycmd parse`.
#[when("I parse the line:")]
fn i_parse_the_line(world: &mut CliWorld, step: &Step) {
    let line = step.docstring.as_deref().expect("step needs a docstring");
    run_keycmd(world, &["parse".to_owned(), line.trim().to_owned()]);
}

// --- Then steps ---

#[then(expr = "the exit code should be {int}")]
fn exit_code_should_be(world: &mut CliWorld, expected: i32) {
    let actual = world.exit_code.expect("No exit code captured");
    assert_eq!(
        actual, expected,
        "Expected exit code {expected}, got {actual}\nstdout: {}\nstderr: {}",
        world.stdout, world.stderr
    );
}

#[then(expr = "stdout should contain {string}")]
fn stdout_should_contain(world: &mut CliWorld, expected: String) {
    assert!(
        world.stdout.contains(&expected),
        "stdout does not contain '{expected}'\nstdout: {}",
        world.stdout
    );
}

#[then(expr = "stdout should not contain {string}")]
fn stdout_should_not_contain(world: &mut CliWorld, unexpected: String) {
    assert!(
        !world.stdout.contains(&unexpected),
        "stdout should NOT contain '{unexpected}'\nstdout: {}",
        world.stdout
    );
}

#[then(expr = "stdout should have {int} lines")]
fn stdout_should_have_lines(world: &mut CliWorld, expected: usize) {
    let lines = world.stdout.lines().count();
    assert_eq!(lines, expected, "stdout: {}", world.stdout);
}

#[then(expr = "stderr should contain {string}")]
fn stderr_should_contain(world: &mut CliWorld, expected: String) {
    assert!(
        world.stderr.contains(&expected),
        "stderr does not contain '{expected}'\nstderr: {}",
        world.stderr
    );
}

#[then("stderr should be valid JSON")]
fn stderr_should_be_valid_json(world: &mut CliWorld) {
    parse_json(&world.stderr, "stderr");
}

#[then(expr = "stderr JSON {string} should be {string}")]
fn stderr_json_field(world: &mut CliWorld, key: String, expected: String) {
    let json = parse_json(&world.stderr, "stderr");
    assert_eq!(json[&key].as_str(), Some(expected.as_str()), "JSON: {json}");
}

#[then("stdout should be valid JSON")]
fn stdout_should_be_valid_json(world: &mut CliWorld) {
    parse_json(&world.stdout, "stdout");
}

#[then(expr = "stdout JSON should have key {string}")]
fn stdout_json_should_have_key(world: &mut CliWorld, key: String) {
    let json = parse_json(&world.stdout, "stdout");
    assert!(
        json.get(&key).is_some(),
        "stdout JSON does not have key '{key}'\nJSON: {json}"
    );
}

#[then(expr = "stdout JSON {string} should be {string}")]
fn stdout_json_field(world: &mut CliWorld, key: String, expected: String) {
    let json = parse_json(&world.stdout, "stdout");
    assert_eq!(json[&key].as_str(), Some(expected.as_str()), "JSON: {json}");
}

#[then(expr = "stdout JSON {string} should be null")]
fn stdout_json_field_null(world: &mut CliWorld, key: String) {
    let json = parse_json(&world.stdout, "stdout");
    assert!(json[&key].is_null(), "JSON: {json}");
}

#[then(expr = "stdout JSON should not have key {string}")]
fn stdout_json_should_not_have_key(world: &mut CliWorld, key: String) {
    let json = parse_json(&world.stdout, "stdout");
    assert!(json.get(&key).is_none(), "JSON: {json}");
}

#[then(expr = "stdout JSON {string} should have key {string}")]
fn stdout_json_nested_key(world: &mut CliWorld, outer: String, key: String) {
    let json = parse_json(&world.stdout, "stdout");
    assert!(json[&outer].get(&key).is_some(), "JSON: {json}");
}

#[then(expr = "stdout JSON argument {string} should be {string}")]
fn stdout_json_argument(world: &mut CliWorld, name: String, expected: String) {
    let json = parse_json(&world.stdout, "stdout");
    let actual = &json["args"][&name];
    let rendered = actual
        .as_str()
        .map_or_else(|| actual.to_string(), str::to_owned);
    assert_eq!(rendered, expected, "JSON: {json}");
}

#[then(expr = "the file {string} should exist in the home directory")]
fn file_should_exist(world: &mut CliWorld, relative: String) {
    let path = world.home().join(relative);
    assert!(path.exists(), "{} does not exist", path.display());
}

#[tokio::main]
async fn main() {
    CliWorld::run("tests/features/parse.feature").await;
    CliWorld::run("tests/features/help.feature").await;
    CliWorld::run("tests/features/commands.feature").await;
    CliWorld::run("tests/features/config.feature").await;
    CliWorld::run("tests/features/shell-completions.feature").await;
}
