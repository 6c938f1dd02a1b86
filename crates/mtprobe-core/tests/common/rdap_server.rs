//! Minimal HTTP/1.1 server that answers RDAP help queries for integration tests.
//!
//! GET on any path ending in `/help` returns an RDAP help document when the
//! Accept header names an RDAP or JSON media type, and 406 otherwise. The
//! first `throttle_first` help requests can be answered with 429 instead.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

pub const HELP_BODY: &str =
    r#"{"rdapConformance":["rdap_level_0"],"notices":[{"title":"Help","description":["test server"]}]}"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct RdapServerOptions {
    /// Number of help requests answered with 429 before normal service.
    pub throttle_first: usize,
}

pub struct RdapServer {
    /// Base URL with trailing slash, e.g. "http://127.0.0.1:12345/rdap/".
    pub base: String,
    hits: Arc<AtomicUsize>,
}

impl RdapServer {
    /// Help requests received so far, throttled ones included.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn start() -> RdapServer {
    start_with_options(RdapServerOptions::default())
}

pub fn start_with_options(opts: RdapServerOptions) -> RdapServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &counter, opts));
        }
    });
    RdapServer {
        base: format!("http://127.0.0.1:{}/rdap/", port),
        hits,
    }
}

/// Serve `body` as JSON on every GET. Returns the URL of `/dns.json`.
pub fn start_static(body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || {
                let mut buf = [0u8; 8192];
                if matches!(stream.read(&mut buf), Ok(n) if n > 0) {
                    respond(&mut stream, "200 OK", "application/json", body.as_bytes());
                }
            });
        }
    });
    format!("http://127.0.0.1:{}/dns.json", port)
}

fn handle(mut stream: std::net::TcpStream, hits: &AtomicUsize, opts: RdapServerOptions) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, accept) = parse_request(request);
    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", "text/plain", b"");
        return;
    }
    if !path.ends_with("/help") {
        respond(&mut stream, "404 Not Found", "text/plain", b"not found");
        return;
    }
    let seen = hits.fetch_add(1, Ordering::SeqCst);
    if seen < opts.throttle_first {
        respond(
            &mut stream,
            "429 Too Many Requests",
            "application/json",
            br#"{"errorCode":429,"title":"slow down"}"#,
        );
        return;
    }
    let accept = accept.to_ascii_lowercase();
    if accept.contains("application/rdap+json") || accept.contains("application/json") || accept.contains("*/*") {
        respond(&mut stream, "200 OK", "application/rdap+json", HELP_BODY.as_bytes());
    } else {
        respond(
            &mut stream,
            "406 Not Acceptable",
            "text/html",
            b"<html><body>not acceptable</body></html>",
        );
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Returns (method, path, Accept header value).
fn parse_request(request: &str) -> (&str, &str, &str) {
    let mut method = "";
    let mut path = "";
    let mut accept = "";
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("accept") {
                accept = value.trim();
            }
        }
    }
    (method, path, accept)
}
