#![cfg(unix)]

use mist::{BlockingClient, Client, Config, ErrorKind, Message, MistError, Payload};
use serde_json::json;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// Writing an executable while another test thread forks can make exec fail
// with ETXTBSY, so script-driven tests run one at a time.
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

fn fake_tool(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn test_config() -> Config {
    Config {
        bin_dir: None,
        bundled_dir: None,
        ..Config::default()
    }
}

fn client_for(binary: &Path, timeout: Duration) -> Client {
    Client::with_config("fake", test_config())
        .with_binary(binary)
        .with_timeout(timeout)
}

/// True once `pid` no longer names a live process.
fn is_gone(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid), None) {
        Err(nix::errno::Errno::ESRCH) => true,
        _ => {
            // Killed but not yet reaped by its new parent
            fs::read_to_string(format!("/proc/{}/stat", pid))
                .map(|stat| {
                    stat.rsplit_once(") ")
                        .map(|(_, rest)| rest.starts_with('Z'))
                        .unwrap_or(false)
                })
                .unwrap_or(false)
        }
    }
}

async fn wait_gone(pid: i32) -> bool {
    for _ in 0..50 {
        if is_gone(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(40)).await;
    }
    false
}

fn read_pid(path: &Path) -> i32 {
    fs::read_to_string(path).unwrap().trim().parse().unwrap()
}

#[tokio::test]
async fn test_version_is_trimmed() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(
        &dir,
        "versioned",
        r#"if [ "$1" = "version" ]; then echo "  fake 1.2.3  "; else exit 9; fi"#,
    );
    let client = client_for(&tool, Duration::from_secs(5));
    assert_eq!(client.version().await.unwrap(), "fake 1.2.3");
}

#[tokio::test]
async fn test_call_passes_args_and_stdin() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let echo_args = fake_tool(&dir, "args", r#"echo "$@""#);
    let cat = fake_tool(&dir, "cat", "cat");

    let client = client_for(&echo_args, Duration::from_secs(5));
    assert_eq!(client.call(&["a", "b c"], None).await.unwrap(), "a b c\n");

    let client = client_for(&cat, Duration::from_secs(5));
    assert_eq!(client.call(&[], Some("hello\nworld")).await.unwrap(), "hello\nworld");
    // No input means an immediately closed stdin, not a hang
    assert_eq!(client.call(&[], None).await.unwrap(), "");
}

#[tokio::test]
async fn test_nonzero_exit_reports_stderr() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let loud = fake_tool(&dir, "loud", "echo 'something broke' >&2\nexit 3");
    let quiet = fake_tool(&dir, "quiet", "exit 4");

    let err = client_for(&loud, Duration::from_secs(5))
        .call(&[], None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "something broke");
    assert!(matches!(err, MistError::NonZeroExit { code: Some(3), .. }));

    let err = client_for(&quiet, Duration::from_secs(5))
        .send("health.ping", Payload::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NonZeroExit);
    assert_eq!(err.to_string(), "exit code 4");
}

#[tokio::test]
async fn test_missing_binary() {
    let _guard = serial();
    let client = client_for(Path::new("/nonexistent/dir/mist-tool"), Duration::from_secs(5));
    let err = client.version().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BinaryNotFound);
    assert!(err.to_string().contains("/nonexistent/dir/mist-tool"));

    let err = client
        .send("health.ping", Payload::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BinaryNotFound);
}

#[tokio::test]
async fn test_timeout_kills_and_reaps_tool() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let pidfile = dir.path().join("pid");
    let tool = fake_tool(
        &dir,
        "sleeper",
        &format!("echo $$ > '{}'\nexec sleep 10", pidfile.display()),
    );

    let start = Instant::now();
    let err = client_for(&tool, Duration::from_millis(300))
        .send("health.ping", Payload::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.to_string(), "timeout after 0.3s");
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(wait_gone(read_pid(&pidfile)).await);
}

#[tokio::test]
async fn test_timeout_covers_grandchild_holding_stdout() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let pidfile = dir.path().join("pid");
    let tool = fake_tool(
        &dir,
        "forker",
        &format!(
            "cat > /dev/null\nsleep 10 &\necho $! > '{}'\necho '{{}}'\nexit 0",
            pidfile.display()
        ),
    );

    let start = Instant::now();
    let err = client_for(&tool, Duration::from_millis(300))
        .send("health.ping", Payload::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(wait_gone(read_pid(&pidfile)).await);
}

#[tokio::test]
async fn test_timeout_with_sigterm_grace() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "stubborn", "trap '' TERM\nsleep 10");
    let config = Config {
        kill_grace_ms: 100,
        ..test_config()
    };
    let client = Client::with_config("stubborn", config)
        .with_binary(&tool)
        .with_timeout(Duration::from_millis(100));

    let start = Instant::now();
    let err = client.call(&[], None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_empty_output_yields_default_message() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "silent", "cat > /dev/null\necho '   '");
    let response = client_for(&tool, Duration::from_secs(5))
        .send("health.ping", Payload::new(), None)
        .await
        .unwrap();
    assert_eq!(response, Message::default());
}

#[tokio::test]
async fn test_last_envelope_line_wins() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(
        &dir,
        "chatty",
        r#"cat > /dev/null
echo "starting up"
echo '{"id":"first"}'
echo '{"id":"second","type":"eval.result","payload":{"score":0.5}}'
echo "done in 12ms""#,
    );
    let response = client_for(&tool, Duration::from_secs(5))
        .send("eval.run", Payload::new(), None)
        .await
        .unwrap();
    assert_eq!(response.id, "second");
    assert_eq!(response.message_type, "eval.result");
    assert_eq!(response.payload["score"], json!(0.5));
}

#[tokio::test]
async fn test_noise_only_output_is_malformed() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "noisy", "cat > /dev/null\necho 'no json here'");
    let err = client_for(&tool, Duration::from_secs(5))
        .send("health.ping", Payload::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);
}

#[tokio::test]
async fn test_tool_receives_transport_flag() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(
        &dir,
        "argdump",
        r#"cat > /dev/null
printf '{"payload":{"args":"%s"}}\n' "$*""#,
    );
    let response = client_for(&tool, Duration::from_secs(5))
        .send("health.ping", Payload::new(), None)
        .await
        .unwrap();
    assert_eq!(response.payload["args"], json!("--transport stdio"));
}

#[tokio::test]
async fn test_large_envelope_through_echo_tool() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "echo", "cat");

    let mut payload = Payload::new();
    payload.insert("blob".into(), json!("A".repeat(1024 * 1024)));
    payload.insert("n".into(), json!(9999999999999i64));
    let request = Message::new("rust", "data.entities", payload);

    let response = client_for(&tool, Duration::from_secs(10))
        .send_message(&request)
        .await
        .unwrap();
    assert_eq!(response, request);
}

#[tokio::test]
async fn test_tool_that_ignores_stdin() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "deaf", r#"echo '{"type":"health.pong"}'"#);

    let mut payload = Payload::new();
    payload.insert("blob".into(), json!("B".repeat(1024 * 1024)));
    let response = client_for(&tool, Duration::from_secs(5))
        .send("data.entities", payload, None)
        .await
        .unwrap();
    assert_eq!(response.message_type, "health.pong");
}

#[tokio::test]
async fn test_send_stamps_envelope_and_uses_source() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "echo", "cat");
    let client = client_for(&tool, Duration::from_secs(5));

    let response = client
        .send("health.ping", Payload::new(), Some("billing"))
        .await
        .unwrap();
    assert_eq!(response.source, "billing");
    assert_eq!(response.id.len(), 32);
    assert!(response.timestamp_ns > 0);

    let response = client.send("health.ping", Payload::new(), None).await.unwrap();
    assert_eq!(response.source, "rust");

    let unstamped = Client::with_config(
        "echo",
        Config {
            stamp_envelopes: false,
            ..test_config()
        },
    )
    .with_binary(&tool)
    .send("health.ping", Payload::new(), None)
    .await
    .unwrap();
    assert_eq!(unstamped.id, "");
    assert_eq!(unstamped.timestamp_ns, 0);
}

#[tokio::test]
async fn test_send_payload_typed() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "echo", "cat");
    let ping = mist::protocol::payload::HealthPing {
        from: "rust".into(),
    };
    let response = client_for(&tool, Duration::from_secs(5))
        .send_payload("health.ping", &ping, None)
        .await
        .unwrap();
    assert_eq!(response.payload["from"], json!("rust"));

    let err = client_for(&tool, Duration::from_secs(5))
        .send_payload("health.ping", &vec![1, 2], None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn test_concurrent_sends_are_independent() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "echo", "cat");
    let client = client_for(&tool, Duration::from_secs(10));

    let requests: Vec<Message> = (0..8)
        .map(|i| {
            let mut payload = Payload::new();
            payload.insert("i".into(), json!(i));
            Message::new("rust", "eval.run", payload).with_id(format!("req-{}", i))
        })
        .collect();

    let responses =
        futures::future::join_all(requests.iter().map(|req| client.send_message(req))).await;
    for (request, response) in requests.iter().zip(responses) {
        let response = response.unwrap();
        assert_eq!(response.id, request.id);
        assert_eq!(response.payload, request.payload);
    }
}

#[test]
fn test_blocking_client() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "echo", r#"if [ "$1" = "version" ]; then echo v9; else cat; fi"#);
    let client = BlockingClient::from_client(client_for(&tool, Duration::from_secs(5))).unwrap();

    assert_eq!(client.version().unwrap(), "v9");
    let response = client
        .send("health.ping", Payload::new(), Some("sync"))
        .unwrap();
    assert_eq!(response.source, "sync");
    assert_eq!(response.message_type, "health.ping");
}
