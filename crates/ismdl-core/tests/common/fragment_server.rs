//! Minimal HTTP/1.1 server for integration tests: serves a Smooth Streaming
//! manifest and deterministic fragment bodies, counts requests, and can fail
//! selected fragment identifiers with HTTP 500 or stall them mid-body.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Body served for fragment `id`.
pub fn fragment_body(id: u64) -> Vec<u8> {
    format!("FRAG-{:012}|", id).repeat(256).into_bytes()
}

struct State {
    manifest: String,
    failing: Mutex<HashSet<u64>>,
    stalled: Mutex<HashSet<u64>>,
    manifest_requests: AtomicUsize,
    fragment_requests: AtomicUsize,
}

#[derive(Clone)]
pub struct FragmentServer {
    /// Server manifest URL, e.g. `http://127.0.0.1:1234/media/video.ism`.
    pub ism_url: String,
    state: Arc<State>,
}

impl FragmentServer {
    pub fn fragment_requests(&self) -> usize {
        self.state.fragment_requests.load(Ordering::SeqCst)
    }

    pub fn manifest_requests(&self) -> usize {
        self.state.manifest_requests.load(Ordering::SeqCst)
    }

    /// Makes fragment `id` answer HTTP 500 until `heal` is called.
    pub fn fail(&self, id: u64) {
        self.state.failing.lock().unwrap().insert(id);
    }

    /// Makes fragment `id` send its headers and then trickle one byte every
    /// 100ms, never completing, until the client hangs up.
    pub fn stall(&self, id: u64) {
        self.state.stalled.lock().unwrap().insert(id);
    }

    pub fn heal(&self) {
        self.state.failing.lock().unwrap().clear();
        self.state.stalled.lock().unwrap().clear();
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(manifest: String) -> FragmentServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(State {
        manifest,
        failing: Mutex::new(HashSet::new()),
        stalled: Mutex::new(HashSet::new()),
        manifest_requests: AtomicUsize::new(0),
        fragment_requests: AtomicUsize::new(0),
    });
    let server_state = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&server_state);
            thread::spawn(move || handle(stream, &state));
        }
    });
    FragmentServer {
        ism_url: format!("http://127.0.0.1:{}/media/video.ism", port),
        state,
    }
}

fn handle(mut stream: std::net::TcpStream, state: &State) {
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
    let path = request
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("");

    if path.contains("/Manifest(") {
        state.manifest_requests.fetch_add(1, Ordering::SeqCst);
        respond(&mut stream, "200 OK", state.manifest.as_bytes());
        return;
    }
    if let Some(id) = fragment_id(path) {
        state.fragment_requests.fetch_add(1, Ordering::SeqCst);
        if state.stalled.lock().unwrap().contains(&id) {
            trickle(&mut stream);
        } else if state.failing.lock().unwrap().contains(&id) {
            respond(&mut stream, "500 Internal Server Error", b"boom");
        } else {
            respond(&mut stream, "200 OK", &fragment_body(id));
        }
        return;
    }
    respond(&mut stream, "404 Not Found", b"");
}

fn respond(stream: &mut std::net::TcpStream, status: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Announces a large body and sends it one byte at a time. Returns when the
/// client disconnects or after 60s.
fn trickle(stream: &mut std::net::TcpStream) {
    let head = "HTTP/1.1 200 OK\r\nContent-Length: 1048576\r\nConnection: close\r\n\r\n";
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    for _ in 0..600 {
        if stream.write_all(b"x").and_then(|_| stream.flush()).is_err() {
            return;
        }
        thread::sleep(std::time::Duration::from_millis(100));
    }
}

/// Parses `Fragments(video=<id>,` out of a request path.
fn fragment_id(path: &str) -> Option<u64> {
    let rest = path.split("Fragments(video=").nth(1)?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
