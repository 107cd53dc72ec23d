#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tempfile::TempDir;

pub const CNAME: &str = "web01.example.com";
pub const DATE: &str = "1700000000";

pub struct TestEnv {
    tmp: TempDir,
    pub home: PathBuf,
    pub root: PathBuf,
    pub settings: PathBuf,
}

impl TestEnv {
    /// Tier directories under a temp root, `cat` as the decompressor and
    /// uploads pointed at `foreman_url`.
    pub fn new(foreman_url: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).expect("create isolated home");
        let root = tmp.path().join("openscap");
        let settings = tmp.path().join("settings.toml");

        let env = Self {
            tmp,
            home,
            root,
            settings,
        };
        env.write_settings(foreman_url, "");
        env
    }

    pub fn write_settings(&self, foreman_url: &str, extra: &str) {
        let toml = format!(
            r#"reportsdir = "{root}/reports"
spooldir = "{root}/spool"
failed_dir = "{root}/failed"
corrupted_dir = "{root}/corrupted"
foreman_url = "{foreman_url}"
timeout = 5
registered_proxy_name = "proxy.example.com"
registered_proxy_url = "https://proxy.example.com:9090"
decompress_command = ["cat"]
{extra}
"#,
            root = self.root.display(),
        );
        fs::write(&self.settings, toml).expect("write settings");
    }

    pub fn tier(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn stored(&self, tier: &str, id: &str, data: &[u8]) -> PathBuf {
        self.tier(tier)
            .join("arf")
            .join(CNAME)
            .join(id)
            .join(DATE)
            .join(sha256_hex(data))
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("scap-relay");
        cmd.env("HOME", &self.home)
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.settings);
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn submit_arf(&self, archive: &Path, policy: &str) -> Value {
        self.run_json(&[
            "submit-arf",
            archive.to_str().unwrap(),
            "--cname",
            CNAME,
            "--policy",
            policy,
            "--date",
            DATE,
        ])
    }

    pub fn write_archive(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.tmp.path().join(name);
        fs::write(&path, data).expect("write archive");
        path
    }
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// A request as seen by [`StubForeman`].
pub struct Captured {
    pub request_line: String,
    pub headers: String,
    pub body: String,
}

/// Loop-back HTTP server answering every request with the same reply.
pub struct StubForeman {
    pub url: String,
    requests: mpsc::Receiver<Captured>,
}

impl StubForeman {
    pub fn start(status: &'static str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
        let url = format!("http://{}", listener.local_addr().expect("stub addr"));
        let (tx, requests) = mpsc::channel();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let captured = read_request(&mut stream);
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(reply.as_bytes());
                if tx.send(captured).is_err() {
                    break;
                }
            }
        });
        Self { url, requests }
    }

    pub fn next_request(&self) -> Captured {
        self.requests
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("stub received a request")
    }

    pub fn received_nothing(&self) -> bool {
        self.requests.try_recv().is_err()
    }
}

/// A base URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let port = listener.local_addr().expect("probe addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn read_request(stream: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let head_end = loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let length = content_length(&head);
            while buf.len() < end + 4 + length {
                let n = stream.read(&mut chunk).unwrap_or(0);
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            break Some(end);
        }
    };

    let text = String::from_utf8_lossy(&buf).to_string();
    let (head, body) = match head_end {
        Some(end) => (text[..end].to_string(), text[end + 4..].to_string()),
        None => (text, String::new()),
    };
    let (request_line, headers) = head.split_once("\r\n").unwrap_or((head.as_str(), ""));
    Captured {
        request_line: request_line.to_string(),
        headers: headers.to_string(),
        body,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}
