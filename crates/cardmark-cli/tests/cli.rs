use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    if let Some(path) = env::var_os("CARGO_BIN_EXE_cardmark") {
        return PathBuf::from(path);
    }
    let exe = env::current_exe().expect("current exe");
    let mut debug_dir = exe.as_path();
    while let Some(parent) = debug_dir.parent() {
        if parent.file_name().and_then(|name| name.to_str()) == Some("debug") {
            let candidate = parent.join("cardmark");
            if candidate.exists() {
                return candidate;
            }
        }
        debug_dir = parent;
    }
    panic!("binary path missing");
}

fn temp_file(name: &str, extension: &str, contents: &str) -> PathBuf {
    let mut path = env::temp_dir();
    let now = SystemTime::now().duration_since(UNIX_EPOCH).expect("time");
    let file_name = format!(
        "cardmark_cli_{}_{}_{}.{}",
        name,
        now.as_secs(),
        now.subsec_nanos(),
        extension
    );
    path.push(file_name);
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn renders_file_to_stdout() {
    let input = temp_file("render", "md", "foo\n\nhttps://example.com\n");
    let output = Command::new(bin_path())
        .arg(&input)
        .output()
        .expect("run");

    assert!(output.status.success(), "expected success exit code");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<p>foo</p>\n<p><div class=\"embed-zenn-link\">"));
    assert!(stdout.contains("style=\"display: none\""));
}

#[test]
fn reads_stdin_when_no_input_is_given() {
    let mut child = Command::new(bin_path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"https://twitter.com/jack/status/20\n")
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait");

    assert!(output.status.success(), "expected success exit code");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<embed-tweet src=\"https://twitter.com/jack/status/20\">"));
}

#[test]
fn config_file_sets_options() {
    let config = temp_file(
        "config",
        "toml",
        "embeds = false\ntrustedHost = \"example.com\"\n",
    );
    let input = temp_file("config_input", "md", "https://example.com\n");
    let output = Command::new(bin_path())
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .output()
        .expect("run");

    assert!(output.status.success(), "expected success exit code");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "<p><a href=\"https://example.com\" target=\"_blank\">https://example.com</a></p>\n"
    );
}

#[test]
fn no_breaks_flag_keeps_newlines() {
    let input = temp_file("no_breaks", "md", "a\nb\n");
    let output = Command::new(bin_path())
        .arg("--no-breaks")
        .arg(&input)
        .output()
        .expect("run");

    assert!(output.status.success(), "expected success exit code");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "<p>a\nb</p>\n");
}

#[test]
fn unknown_config_keys_fail() {
    let config = temp_file("bad_config", "toml", "cardproxy = \"x\"\n");
    let input = temp_file("bad_config_input", "md", "text\n");
    let output = Command::new(bin_path())
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .output()
        .expect("run");

    assert!(!output.status.success(), "expected error exit code");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to parse config"), "{}", stderr);
}

#[test]
fn invalid_card_proxy_fails() {
    let config = temp_file("bad_proxy", "toml", "cardProxy = \"not a url\"\n");
    let input = temp_file("bad_proxy_input", "md", "text\n");
    let output = Command::new(bin_path())
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .output()
        .expect("run");

    assert!(!output.status.success(), "expected error exit code");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid render options"), "{}", stderr);
}

#[test]
fn missing_input_file_fails() {
    let output = Command::new(bin_path())
        .arg("/nonexistent/cardmark/input.md")
        .output()
        .expect("run");

    assert!(!output.status.success(), "expected error exit code");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read"), "{}", stderr);
}
