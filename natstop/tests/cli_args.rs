//! CLI surface of the nats-top binary: flags, validation, and the startup
//! paths that never touch the terminal.

mod common;

use assert_cmd::Command;

fn nats_top() -> Command {
    Command::cargo_bin("nats-top").unwrap()
}

#[test]
fn help_mentions_short_and_long_flags() {
    let out = nats_top().arg("--help").output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    for flag in [
        "-s, --server",
        "-m, --port",
        "-n, --conns",
        "-d, --delay",
        "--sort",
        "-o, --output",
        "-l, --delimiter",
        "-r, --max-refresh",
        "--profile",
        "--cacert",
    ] {
        assert!(text.contains(flag), "help missing {flag}\n{text}");
    }
}

#[test]
fn invalid_sort_is_rejected_before_any_request() {
    let out = nats_top()
        .args(["--sort", "fastest", "-m", &common::closed_port().to_string()])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("not a valid option to sort by: fastest"), "{err}");
}

#[test]
fn unreachable_server_is_fatal() {
    let out = nats_top()
        .args(["-m", &common::closed_port().to_string(), "-o", "-"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.starts_with("nats-top: could not get stats from server"), "{err}");
    assert!(out.stdout.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn one_shot_table_to_stdout() {
    let (addr, _mock) = common::spawn_mock().await;
    let port = addr.port().to_string();
    let out = tokio::task::spawn_blocking(move || {
        nats_top()
            .args(["-m", &port, "-o", "-", "--sort", "msgs_to"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("NATS server version 2.10.7 (uptime: 1h2m3s)"), "{text}");
    assert!(text.contains("Memory: 12.0M"));
    assert!(text.contains("HOST"));
    assert!(text.contains("127.0.0.1:50001"));
    assert!(text.contains("orders"));
}

#[tokio::test(flavor = "multi_thread")]
async fn one_shot_delimited_to_file() {
    let (addr, _mock) = common::spawn_mock().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conns.csv");
    let (port, file) = (addr.port().to_string(), path.clone());
    let out = tokio::task::spawn_blocking(move || {
        nats_top()
            .args(["-m", &port, "-l", ",", "-b", "-o"])
            .arg(&file)
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let data = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = data.lines().collect();
    // header + both clients (the second joins on the second request)
    assert_eq!(lines.len(), 3, "{data}");
    assert!(lines[0].starts_with("HOST,CID,NAME,"));
    assert!(lines[1].starts_with("127.0.0.1:50001,1,orders,"));
    assert!(!data.contains("NATS server version"));
}
