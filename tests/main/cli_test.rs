//! CLI contract tests for the `skynet` binary.

use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use serde_json::Value;

fn skynet() -> Command {
    match Command::cargo_bin("skynet") {
        Ok(cmd) => cmd,
        Err(err) => panic!("skynet binary should be built: {err}"),
    }
}

#[test]
fn summary_prints_trace_line() {
    let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
    write!(
        file,
        r#"{{"participant_name":"worker1","fields":{{"ev":{{"id":"42"}},"project":"acme","params":{{"timeout":30,"ref":"x","if":"true"}}}}}}"#
    )
    .expect("write workitem");

    let output = skynet()
        .arg("summary")
        .arg(file.path())
        .output()
        .expect("run skynet summary");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end(), "Taking workitem #42 for acme: worker1 timeout=30");
}

#[test]
fn summary_rejects_non_workitem() {
    let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
    write!(file, "[1, 2, 3]").expect("write file");

    let output = skynet()
        .arg("summary")
        .arg(file.path())
        .output()
        .expect("run skynet summary");
    assert!(!output.status.success());
}

#[test]
fn run_echoes_each_workitem_back_to_the_engine() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let config_path = tmp.path().join("skynet.toml");
    std::fs::write(
        &config_path,
        "[participant]\nname = \"echo\"\nreply_queue = \"replies\"\nshutdown_timeout_seconds = 5\n",
    )
    .expect("write config");

    let input = concat!(
        "{\"action\":\"control\",\"token\":\"start\"}\n",
        "{\"action\":\"consume\",\"workitem\":{\"participant_name\":\"echo\",\"fields\":{\"n\":1}}}\n",
        "{\"action\":\"cancel\",\"workitem\":{\"participant_name\":\"echo\"}}\n",
        "{\"action\":\"consume\",\"workitem\":{\"participant_name\":\"echo\",\"fields\":{\"n\":2}}}\n",
        "{\"action\":\"stop\",\"workitem\":{}}\n",
    );

    let output = skynet()
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .env_remove("SKYNET_CONFIG_PATH")
        .env_remove("SKYNET_PARTICIPANT_NAME")
        .env_remove("SKYNET_REPLY_QUEUE")
        .env_remove("SKYNET_LOGS_DIR")
        .write_stdin(input)
        .output()
        .expect("run skynet");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut seen: Vec<i64> = stdout
        .lines()
        .map(|line| {
            let reply: Value = serde_json::from_str(line).expect("reply is JSON");
            assert_eq!(reply["reply_queue"], "replies");
            assert_eq!(reply["workitem"]["fields"]["__result__"], true);
            reply["workitem"]["fields"]["n"].as_i64().expect("n echoed")
        })
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, [1, 2]);
}

#[test]
fn run_exits_after_stop_while_stdin_stays_open() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let config_path = tmp.path().join("skynet.toml");
    std::fs::write(&config_path, "[participant]\nshutdown_timeout_seconds = 2\n")
        .expect("write config");

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("skynet"))
        .arg("run")
        .arg("--config")
        .arg(&config_path)
        .env_remove("SKYNET_CONFIG_PATH")
        .env_remove("SKYNET_LOGS_DIR")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn skynet");

    let mut stdin = child.stdin.take().expect("stdin piped");
    stdin
        .write_all(b"{\"action\":\"stop\",\"workitem\":{}}\n")
        .expect("write stop");
    stdin.flush().expect("flush stop");

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().expect("poll skynet") {
            break Some(status);
        }
        if Instant::now() >= deadline {
            break None;
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    if status.is_none() {
        let _ = child.kill();
    }
    drop(stdin);
    let status = status.expect("skynet should exit once stopped, without waiting for EOF");
    assert!(status.success());
}
