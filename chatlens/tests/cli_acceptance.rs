use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    output: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let output = base.join("Output");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        write_config(&xdg_config, &output);

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
            output,
        }
    }
}

fn export_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../chatlens-core/tests/fixtures/export")
}

fn write_config(xdg_config: &Path, output: &Path) {
    let dir = xdg_config.join("chatlens");
    fs::create_dir_all(&dir).expect("failed to create config dir");
    let config = format!(
        r#"
self_name = "Jonathan Chow"
archive_dir = "{}"
output_dir = "{}"

[analysis]
words_of_interest = ["lol"]

[conversations.Alice]
folders = ["alicesmith_ab12cd"]

[conversations.Friends]
folders = ["friends_ef34gh"]
mode = "group"
"#,
        export_root().display(),
        output.display()
    );
    fs::write(dir.join("config.toml"), config).expect("failed to write config");
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("chatlens"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute chatlens: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "chatlens {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        output.status,
        stdout,
        stderr
    );
}

#[test]
fn renders_charts_for_named_conversation() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["Alice"]);
    assert_success(&["Alice"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines.first().is_some_and(|l| l.ends_with(": Started")));
    assert!(lines.last().is_some_and(|l| l.ends_with(": Finished")));

    let charts = env.output.join("Alice");
    for name in ["Number of Messages.svg", "Number of Words.svg", "Most Common Words.svg"] {
        assert!(
            charts.join(name).exists(),
            "expected {} in {}",
            name,
            charts.display()
        );
    }
}

#[test]
fn group_mode_and_output_override() {
    let env = CliTestEnv::new();
    let custom = env.home.join("charts");
    let custom_arg = custom.to_string_lossy().into_owned();
    let args = ["Friends", "--output", custom_arg.as_str()];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert!(custom.join("Friends/Messages Sent to Others.svg").exists());
    assert!(!env.output.exists());
}

#[test]
fn exports_json_instead_of_charts() {
    let env = CliTestEnv::new();
    let args = ["Alice", "--export", "json"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    let body = lines[1..lines.len() - 1].join("\n");
    let json: serde_json::Value = serde_json::from_str(&body).expect("stdout is not JSON");

    assert_eq!(json["conversation"], "Alice");
    assert_eq!(json["self_name"], "Jonathan Chow");
    assert_eq!(json["outputs"][0]["metric"], "messages_per_day");
    assert!(!env.output.join("Alice").exists());
}

#[test]
fn lists_conversation_folders() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["--list"]);
    assert_success(&["--list"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("alicesmith_ab12cd\tAlice Smith"));
    assert!(stdout.contains("friends_ef34gh\tFriends"));
}

#[test]
fn unknown_conversation_fails() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["Nobody"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unknown conversation: Nobody"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn self_name_override_must_be_a_participant() {
    let env = CliTestEnv::new();
    let args = ["Alice", "--self-name", "Someone Else"];

    let output = run_bin(&env, &args);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'Someone Else' is not a participant"));
}
