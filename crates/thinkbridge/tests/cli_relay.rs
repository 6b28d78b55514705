#![cfg(unix)]

use std::io::{self, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thinkbridge::frame::MAX_PAYLOAD;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/tb-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

fn split_frames(mut wire: &[u8]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    while !wire.is_empty() {
        let len = u32::from_le_bytes(wire[..4].try_into().unwrap()) as usize;
        frames.push(wire[4..4 + len].to_vec());
        wire = &wire[4 + len..];
    }
    frames
}

fn error_of(payload: &[u8]) -> (i64, String) {
    let value: serde_json::Value =
        serde_json::from_slice(payload).expect("error frame should be JSON");
    assert!(value["id"].is_null());
    (
        value["error"]["code"].as_i64().expect("code should be an integer"),
        value["error"]["message"]
            .as_str()
            .expect("message should be a string")
            .to_string(),
    )
}

fn thinkbridge(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_thinkbridge"));
    cmd.env("HOME", home)
        .env_remove("THINKBRIDGE_SOCKET")
        .env_remove("THINKBRIDGE_LOG_LEVEL")
        .env_remove("THINKBRIDGE_LOG_FORMAT");
    cmd
}

/// Launch the bridge the way a browser does and feed it `input` on stdin.
fn run_bridge(mut cmd: Command, input: Vec<u8>) -> Output {
    let mut child = cmd
        .arg("chrome-extension://knldjmfmopnpolahpmmgbagdohdnhkik/")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("bridge should start");

    let mut stdin = child.stdin.take().expect("stdin should be piped");
    let writer = thread::spawn(move || {
        let _ = stdin.write_all(&input);
    });

    let output = child.wait_with_output().expect("bridge should exit");
    writer.join().expect("stdin writer should finish");
    output
}

fn backend_listener(home: &Path) -> UnixListener {
    let dir = home.join(".think");
    std::fs::create_dir_all(&dir).expect("socket dir should be creatable");
    UnixListener::bind(dir.join("native.sock")).expect("backend should bind")
}

fn read_request(stream: &mut UnixStream) -> Option<Vec<u8>> {
    let mut len = [0u8; 4];
    stream.read_exact(&mut len).ok()?;
    let mut payload = vec![0u8; u32::from_le_bytes(len) as usize];
    stream.read_exact(&mut payload).ok()?;
    Some(payload)
}

fn spawn_echo_backend(listener: UnixListener) -> thread::JoinHandle<usize> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("bridge should connect");
        let mut served = 0;
        while let Some(payload) = read_request(&mut stream) {
            stream.write_all(&frame(&payload)).expect("reply should send");
            served += 1;
        }
        served
    })
}

fn wait_for_connect(path: &Path, timeout: Duration) -> io::Result<UnixStream> {
    let start = Instant::now();
    loop {
        match UnixStream::connect(path) {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                if start.elapsed() >= timeout {
                    return Err(io::Error::other(format!("connect timeout: {err}")));
                }
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

#[test]
fn relays_hello_and_returns_bye() {
    let home = unique_temp_dir("hello");
    let listener = backend_listener(&home);
    let backend = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("bridge should connect");
        let request = read_request(&mut stream).expect("request should arrive");
        stream.write_all(&frame(b"bye")).expect("reply should send");
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
        request
    });

    let output = run_bridge(thinkbridge(&home), frame(b"hello"));

    assert_eq!(backend.join().unwrap(), b"hello");
    assert_eq!(output.stdout, b"\x03\x00\x00\x00bye");
    assert_eq!(output.status.code(), Some(0));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn missing_socket_reports_app_not_running() {
    let home = unique_temp_dir("missing");

    let output = run_bridge(thinkbridge(&home), frame(b"hello"));

    let frames = split_frames(&output.stdout);
    assert_eq!(frames.len(), 1);
    assert_eq!(
        error_of(&frames[0]),
        (
            -32001,
            "Think app is not running. Please open the Think app first.".to_string()
        )
    );
    assert_eq!(output.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn relative_home_reports_unresolvable_endpoint() {
    let home = unique_temp_dir("relhome");
    let mut cmd = thinkbridge(&home);
    cmd.env("HOME", "relative/home");

    let output = run_bridge(cmd, Vec::new());

    let frames = split_frames(&output.stdout);
    assert_eq!(frames.len(), 1);
    assert_eq!(
        error_of(&frames[0]),
        (-32001, "Cannot determine home directory".to_string())
    );
    assert_eq!(output.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn browser_closing_immediately_exits_cleanly() {
    let home = unique_temp_dir("close");
    let backend = spawn_echo_backend(backend_listener(&home));

    let output = run_bridge(thinkbridge(&home), Vec::new());

    assert_eq!(backend.join().unwrap(), 0);
    assert!(output.stdout.is_empty());
    assert_eq!(output.status.code(), Some(0));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn backend_hangup_mid_reply_reports_connection_lost() {
    let home = unique_temp_dir("hangup");
    let listener = backend_listener(&home);
    let backend = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("bridge should connect");
        read_request(&mut stream).expect("request should arrive");
        stream.write_all(b"\x10\x00").expect("partial prefix should send");
    });

    let output = run_bridge(thinkbridge(&home), frame(b"ping"));
    backend.join().unwrap();

    let frames = split_frames(&output.stdout);
    assert_eq!(frames.len(), 1);
    assert_eq!(
        error_of(&frames[0]),
        (-32003, "Backend connection lost".to_string())
    );
    assert_eq!(output.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn oversized_request_is_rejected_and_session_continues() {
    let home = unique_temp_dir("oversize");
    let backend = spawn_echo_backend(backend_listener(&home));

    let declared = MAX_PAYLOAD + 1;
    let mut input = (declared as u32).to_le_bytes().to_vec();
    input.resize(4 + declared, 0xAB);
    input.extend_from_slice(&frame(b"still here"));

    let output = run_bridge(thinkbridge(&home), input);

    assert_eq!(backend.join().unwrap(), 1);
    let frames = split_frames(&output.stdout);
    assert_eq!(frames.len(), 2);
    assert_eq!(
        error_of(&frames[0]),
        (-32000, "Message too large".to_string())
    );
    assert_eq!(frames[1], b"still here");
    assert_eq!(output.status.code(), Some(0));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn socket_env_overrides_home_location() {
    let dir = unique_temp_dir("override");
    let sock = dir.join("custom.sock");
    let backend = spawn_echo_backend(UnixListener::bind(&sock).expect("backend should bind"));

    let mut cmd = thinkbridge(&dir.join("no-such-home"));
    cmd.env("THINKBRIDGE_SOCKET", &sock);
    let output = run_bridge(cmd, [frame(b"a"), frame(b"")].concat());

    assert_eq!(backend.join().unwrap(), 2);
    assert_eq!(output.stdout, [frame(b"a"), frame(b"")].concat());
    assert_eq!(output.status.code(), Some(0));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn resolve_reports_socket_under_home_as_json() {
    let home = unique_temp_dir("resolve");

    let output = thinkbridge(&home)
        .args(["--format", "json", "resolve"])
        .output()
        .expect("resolve should run");

    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("resolve output should be JSON");
    let expected = home.join(".think").join("native.sock");
    assert_eq!(value["socket_path"], expected.display().to_string());
    assert_eq!(value["source"], "home");
    assert_eq!(value["exists"], false);
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn doctor_fails_when_app_is_not_running() {
    let home = unique_temp_dir("doctor");

    let output = thinkbridge(&home)
        .args(["--format", "json", "doctor"])
        .output()
        .expect("doctor should run");

    assert_eq!(output.status.code(), Some(30));
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("doctor output should be JSON");
    assert_eq!(value["overall"], "fail");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn echo_subcommand_serves_the_relay() {
    let dir = unique_temp_dir("echo");
    let sock = dir.join("echo.sock");

    let mut server = thinkbridge(&dir)
        .arg("--log-level")
        .arg("error")
        .arg("--socket")
        .arg(&sock)
        .args(["echo", "--clients", "2"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("echo server should start");

    // First client: readiness check.
    drop(wait_for_connect(&sock, Duration::from_secs(3)).expect("echo server should listen"));

    let mut cmd = thinkbridge(&dir);
    cmd.env("THINKBRIDGE_SOCKET", &sock);
    let input = [frame(b"hello"), frame(&[0u8, 1, 2, 255])].concat();
    let output = run_bridge(cmd, input.clone());

    assert_eq!(output.stdout, input);
    assert_eq!(output.status.code(), Some(0));

    let status = server.wait().expect("echo server should exit");
    assert!(status.success());
    let _ = std::fs::remove_dir_all(&dir);
}
