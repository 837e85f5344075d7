//! Mock MPD server for testing sync behavior over a real TCP connection
//!
//! Provides a [`MockMpdServer`] that simulates enough of the MPD control
//! protocol for sync tests: a versioned play queue (so `plchanges` returns
//! genuine diffs), transport and mixer state, a scriptable `idle` event
//! queue, and failure controls for exercising reconnect paths.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};

/// Queue and player state behind one mock server
#[derive(Debug)]
struct MockState {
    queue: Vec<String>,
    /// Revision at which each queue position last changed, parallel to `queue`
    changed_at: Vec<u32>,
    version: u32,
    play_state: &'static str,
    song: Option<u32>,
    elapsed: Option<u64>,
    duration: u64,
    volume: i32,
    commands: Vec<String>,
    fail_next: usize,
    idle_events: VecDeque<Vec<String>>,
}

impl MockState {
    fn new() -> Self {
        Self {
            queue: Vec::new(),
            changed_at: Vec::new(),
            version: 1,
            play_state: "stop",
            song: None,
            elapsed: None,
            duration: 300,
            volume: 100,
            commands: Vec::new(),
            fail_next: 0,
            idle_events: VecDeque::new(),
        }
    }

    fn bump_version(&mut self) -> u32 {
        self.version += 1;
        self.version
    }
}

struct Shared {
    state: Mutex<MockState>,
    idle_signal: Notify,
    refuse: AtomicBool,
    password: Option<String>,
}

/// Mock MPD server for sync and protocol-client tests
///
/// Start one per simulated peer; control its state through the handle and
/// assert on the state and command log afterwards.
pub struct MockMpdServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockMpdServer {
    /// Start a mock server without a password
    pub async fn start() -> Self {
        Self::start_inner(None).await
    }

    /// Start a mock server that requires the given password
    pub async fn start_with_password(password: &str) -> Self {
        Self::start_inner(Some(password.to_string())).await
    }

    async fn start_inner(password: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock MPD listener");
        let addr = listener.local_addr().expect("mock MPD listener address");

        let shared = Arc::new(Shared {
            state: Mutex::new(MockState::new()),
            idle_signal: Notify::new(),
            refuse: AtomicBool::new(false),
            password,
        });

        let accept_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let connection_shared = Arc::clone(&accept_shared);
                tokio::spawn(async move {
                    handle_connection(connection_shared, stream).await;
                });
            }
        });

        Self { addr, shared }
    }

    /// Hostname clients should connect to
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Port clients should connect to
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    // ===== state control =====

    /// Replace the queue, bumping the revision and marking every entry changed
    pub async fn set_queue(&self, uris: &[&str]) {
        let mut state = self.shared.state.lock().await;
        let version = state.bump_version();
        state.queue = uris.iter().map(|u| u.to_string()).collect();
        state.changed_at = vec![version; state.queue.len()];
    }

    /// Append one entry, like a client `add`
    pub async fn push_queue(&self, uri: &str) {
        let mut state = self.shared.state.lock().await;
        let version = state.bump_version();
        state.queue.push(uri.to_string());
        state.changed_at.push(version);
    }

    /// Drop entries from the tail without touching the survivors' revisions
    ///
    /// Produces a shrink-only diff: `plchanges` since the pre-truncate
    /// revision reports nothing, only the length differs.
    pub async fn truncate_queue(&self, len: usize) {
        let mut state = self.shared.state.lock().await;
        state.bump_version();
        state.queue.truncate(len);
        state.changed_at.truncate(len);
    }

    /// Set transport state (`"play"`, `"pause"`, or `"stop"`), song, and elapsed seconds
    pub async fn set_player(&self, play_state: &str, song: Option<u32>, elapsed: Option<u64>) {
        let mut state = self.shared.state.lock().await;
        state.play_state = match play_state {
            "play" => "play",
            "pause" => "pause",
            _ => "stop",
        };
        state.song = song;
        state.elapsed = elapsed;
    }

    /// Set the mixer volume
    pub async fn set_volume(&self, volume: i32) {
        self.shared.state.lock().await.volume = volume;
    }

    /// Queue an `idle` event; a client blocked in `idle` is answered with it
    pub async fn signal_change(&self, subsystems: &[&str]) {
        let mut state = self.shared.state.lock().await;
        state
            .idle_events
            .push_back(subsystems.iter().map(|s| s.to_string()).collect());
        drop(state);
        self.shared.idle_signal.notify_one();
    }

    /// Close the connection instead of answering the next `count` commands
    pub async fn fail_next_commands(&self, count: usize) {
        self.shared.state.lock().await.fail_next = count;
    }

    /// Drop new connections immediately (before the greeting) while `refuse` is set
    pub async fn refuse_connections(&self, refuse: bool) {
        self.shared.refuse.store(refuse, Ordering::SeqCst);
    }

    // ===== state inspection =====

    /// Current queue contents in order
    pub async fn queue(&self) -> Vec<String> {
        self.shared.state.lock().await.queue.clone()
    }

    /// Current queue revision
    pub async fn playlist_version(&self) -> u32 {
        self.shared.state.lock().await.version
    }

    /// Current transport state as reported in `status`
    pub async fn play_state(&self) -> String {
        self.shared.state.lock().await.play_state.to_string()
    }

    /// Current song index
    pub async fn current_song(&self) -> Option<u32> {
        self.shared.state.lock().await.song
    }

    /// Elapsed seconds of the current song
    pub async fn elapsed(&self) -> Option<u64> {
        self.shared.state.lock().await.elapsed
    }

    /// Current mixer volume
    pub async fn volume(&self) -> i32 {
        self.shared.state.lock().await.volume
    }

    /// Every command received so far, in order
    pub async fn commands(&self) -> Vec<String> {
        self.shared.state.lock().await.commands.clone()
    }

    /// Number of received commands whose first token matches `name`
    pub async fn command_count(&self, name: &str) -> usize {
        self.shared
            .state
            .lock()
            .await
            .commands
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(name))
            .count()
    }
}

async fn handle_connection(shared: Arc<Shared>, stream: TcpStream) {
    if shared.refuse.load(Ordering::SeqCst) {
        return;
    }

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    if write_half.write_all(b"OK MPD 0.23.5\n").await.is_err() {
        return;
    }

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        {
            let mut state = shared.state.lock().await;
            state.commands.push(command.to_string());
            if state.fail_next > 0 {
                state.fail_next -= 1;
                return;
            }
        }

        if command == "close" {
            return;
        }

        if command == "idle" {
            let subsystems = wait_for_idle_event(&shared).await;
            let mut response = String::new();
            for subsystem in &subsystems {
                response.push_str(&format!("changed: {}\n", subsystem));
            }
            response.push_str("OK\n");
            if write_half.write_all(response.as_bytes()).await.is_err() {
                return;
            }
            continue;
        }

        let response = {
            let mut state = shared.state.lock().await;
            execute(&shared, &mut state, command)
        };
        if !respond(&mut write_half, &response).await {
            return;
        }
    }
}

async fn respond(write_half: &mut OwnedWriteHalf, response: &str) -> bool {
    write_half.write_all(response.as_bytes()).await.is_ok()
}

async fn wait_for_idle_event(shared: &Shared) -> Vec<String> {
    loop {
        let notified = shared.idle_signal.notified();
        {
            let mut state = shared.state.lock().await;
            if let Some(event) = state.idle_events.pop_front() {
                return event;
            }
        }
        notified.await;
    }
}

fn execute(shared: &Shared, state: &mut MockState, command: &str) -> String {
    let tokens = tokenize(command);
    let name = tokens.first().map(String::as_str).unwrap_or("");

    match name {
        "password" => match (&shared.password, tokens.get(1)) {
            (Some(expected), Some(given)) if expected == given => ok(),
            (Some(_), _) => ack(3, "password", "incorrect password"),
            (None, _) => ok(),
        },
        "ping" => ok(),
        "status" => {
            let mut response = String::new();
            response.push_str(&format!("volume: {}\n", state.volume));
            response.push_str(&format!("state: {}\n", state.play_state));
            if let Some(song) = state.song {
                response.push_str(&format!("song: {}\n", song));
            }
            if let Some(elapsed) = state.elapsed {
                response.push_str(&format!("time: {}:{}\n", elapsed, state.duration));
            }
            response.push_str(&format!("playlist: {}\n", state.version));
            response.push_str(&format!("playlistlength: {}\n", state.queue.len()));
            response.push_str("OK\n");
            response
        }
        "playlist" => {
            let mut response = String::new();
            for (position, uri) in state.queue.iter().enumerate() {
                response.push_str(&format!("{}:file: {}\n", position, uri));
            }
            response.push_str("OK\n");
            response
        }
        "plchanges" => {
            let Some(since) = tokens.get(1).and_then(|t| t.parse::<u32>().ok()) else {
                return ack(2, "plchanges", "need a playlist version");
            };
            let mut response = String::new();
            for (position, uri) in state.queue.iter().enumerate() {
                if state.changed_at[position] > since {
                    response.push_str(&format!("file: {}\n", uri));
                    response.push_str(&format!("Pos: {}\n", position));
                    response.push_str(&format!("Id: {}\n", position));
                }
            }
            response.push_str("OK\n");
            response
        }
        "addid" => {
            let (Some(uri), Some(position)) = (
                tokens.get(1),
                tokens.get(2).and_then(|t| t.parse::<usize>().ok()),
            ) else {
                return ack(2, "addid", "need a URI and position");
            };
            if position > state.queue.len() {
                return ack(2, "addid", "Bad song index");
            }
            let version = state.bump_version();
            let uri = uri.clone();
            state.queue.insert(position, uri);
            state.changed_at.insert(position, version);
            for changed in state.changed_at.iter_mut().skip(position + 1) {
                *changed = version;
            }
            format!("Id: {}\nOK\n", position)
        }
        "add" => {
            let Some(uri) = tokens.get(1) else {
                return ack(2, "add", "need a URI");
            };
            let version = state.bump_version();
            let uri = uri.clone();
            state.queue.push(uri);
            state.changed_at.push(version);
            ok()
        }
        "delete" => {
            let Some(position) = tokens.get(1).and_then(|t| t.parse::<usize>().ok()) else {
                return ack(2, "delete", "need a position");
            };
            if position >= state.queue.len() {
                return ack(2, "delete", "Bad song index");
            }
            let version = state.bump_version();
            state.queue.remove(position);
            state.changed_at.remove(position);
            for changed in state.changed_at.iter_mut().skip(position) {
                *changed = version;
            }
            ok()
        }
        "clear" => {
            state.bump_version();
            state.queue.clear();
            state.changed_at.clear();
            ok()
        }
        "seek" => {
            let (Some(song), Some(seconds)) = (
                tokens.get(1).and_then(|t| t.parse::<u32>().ok()),
                tokens.get(2).and_then(|t| t.parse::<u64>().ok()),
            ) else {
                return ack(2, "seek", "need a song position and time");
            };
            state.song = Some(song);
            state.elapsed = Some(seconds);
            ok()
        }
        "play" => {
            state.play_state = "play";
            if state.song.is_none() && !state.queue.is_empty() {
                state.song = Some(0);
            }
            ok()
        }
        "pause" => {
            state.play_state = match state.play_state {
                "play" => "pause",
                "pause" => "play",
                other => other,
            };
            ok()
        }
        "stop" => {
            state.play_state = "stop";
            ok()
        }
        other => ack(5, other, "unknown command"),
    }
}

fn ok() -> String {
    "OK\n".to_string()
}

fn ack(code: u32, command: &str, message: &str) -> String {
    format!("ACK [{}@0] {{{}}} {}\n", code, command, message)
}

/// Split a command line into tokens, honoring double quotes and backslash escapes
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            token.push(escaped);
                        }
                    }
                    '"' => break,
                    other => token.push(other),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    tokens
}
