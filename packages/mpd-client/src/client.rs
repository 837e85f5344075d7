//! Async client for the MPD line protocol

use std::collections::HashMap;
use std::fmt;
use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::{MpdError, MpdResult};
use crate::models::{QueueChange, Status, Subsystem};

/// MPD control-protocol client over TCP
///
/// Commands are plain text lines; responses are `key: value` lines closed by
/// a bare `OK`, or a single `ACK` line on error. The client drops its
/// connection state on transport failure so the caller can decide whether to
/// reconnect via [`MpdError::is_connection_error`].
pub struct MpdClient {
    host: String,
    port: u16,
    password: Option<String>,
    connection: Option<Connection>,
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl fmt::Debug for MpdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpdClient")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl MpdClient {
    /// Create a client for the given server; does not connect yet
    pub fn new(host: impl Into<String>, port: u16, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password,
            connection: None,
        }
    }

    /// Hostname this client talks to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port this client talks to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether a connection is currently established
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Establish a fresh connection, dropping any stale one first
    ///
    /// Reads the `OK MPD <version>` greeting and authenticates with the
    /// configured password when one is set.
    ///
    /// # Errors
    /// - `MpdError::Io` if the TCP connection cannot be established
    /// - `MpdError::Protocol` if the greeting is not an MPD greeting
    /// - `MpdError::Auth` if the server rejects the password
    pub async fn connect(&mut self) -> MpdResult<()> {
        self.disconnect().await;

        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut greeting = String::new();
        let n = reader.read_line(&mut greeting).await?;
        if n == 0 {
            return Err(MpdError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection during greeting",
            )));
        }
        let greeting = greeting.trim_end();
        let version = greeting
            .strip_prefix("OK MPD ")
            .ok_or_else(|| MpdError::Protocol(format!("unexpected greeting '{}'", greeting)))?
            .to_string();

        self.connection = Some(Connection {
            reader,
            writer: write_half,
        });
        debug!(host = %self.host, port = self.port, version = %version, "connected to MPD");

        if let Some(password) = self.password.clone() {
            match self.command(&format!("password {}", quote(&password))).await {
                Ok(_) => {}
                Err(MpdError::Server { .. }) => {
                    self.disconnect().await;
                    return Err(MpdError::Auth);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Drop the connection, telling the server first when possible
    pub async fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            let _ = connection.writer.write_all(b"close\n").await;
        }
    }

    /// Lightweight no-op round-trip
    pub async fn ping(&mut self) -> MpdResult<()> {
        self.command("ping").await.map(|_| ())
    }

    /// Block until the server reports one or more changed subsystems
    ///
    /// Suspends indefinitely between events; the only abnormal way out is
    /// connection loss, surfaced as a connection error.
    pub async fn idle(&mut self) -> MpdResult<Vec<Subsystem>> {
        let lines = self.command("idle").await?;
        let mut changed = Vec::with_capacity(lines.len());
        for line in &lines {
            let (key, value) = split_pair(line)?;
            if key != "changed" {
                return Err(MpdError::Protocol(format!(
                    "unexpected idle line '{}'",
                    line
                )));
            }
            changed.push(Subsystem::from(value));
        }
        Ok(changed)
    }

    /// Query current server status
    pub async fn status(&mut self) -> MpdResult<Status> {
        let lines = self.command("status").await?;
        let mut fields = HashMap::with_capacity(lines.len());
        for line in &lines {
            let (key, value) = split_pair(line)?;
            fields.insert(key.to_string(), value.to_string());
        }
        Status::from_fields(&fields)
    }

    /// Query the play queue as an ordered list of media references
    pub async fn queue(&mut self) -> MpdResult<Vec<String>> {
        let lines = self.command("playlist").await?;
        lines.iter().map(|line| parse_queue_line(line)).collect()
    }

    /// Query queue changes since the given revision, in server order
    pub async fn queue_changes(&mut self, since: u32) -> MpdResult<Vec<QueueChange>> {
        let lines = self.command(&format!("plchanges {}", since)).await?;
        parse_queue_changes(&lines)
    }

    /// Insert a media reference at a queue position
    pub async fn insert_at(&mut self, uri: &str, position: u32) -> MpdResult<()> {
        self.command(&format!("addid {} {}", quote(uri), position))
            .await
            .map(|_| ())
    }

    /// Delete the entry at a queue position
    pub async fn delete_at(&mut self, position: u32) -> MpdResult<()> {
        self.command(&format!("delete {}", position)).await.map(|_| ())
    }

    /// Remove every entry from the queue
    pub async fn clear(&mut self) -> MpdResult<()> {
        self.command("clear").await.map(|_| ())
    }

    /// Append a media reference to the end of the queue
    pub async fn append(&mut self, uri: &str) -> MpdResult<()> {
        self.command(&format!("add {}", quote(uri))).await.map(|_| ())
    }

    /// Seek to a position within a queue entry
    pub async fn seek(&mut self, song: u32, seconds: u64) -> MpdResult<()> {
        self.command(&format!("seek {} {}", song, seconds))
            .await
            .map(|_| ())
    }

    /// Start or resume playback
    pub async fn play(&mut self) -> MpdResult<()> {
        self.command("play").await.map(|_| ())
    }

    /// Toggle between playing and paused
    pub async fn pause_toggle(&mut self) -> MpdResult<()> {
        self.command("pause").await.map(|_| ())
    }

    /// Stop playback
    pub async fn stop(&mut self) -> MpdResult<()> {
        self.command("stop").await.map(|_| ())
    }

    /// Send one command and collect the response lines up to `OK`
    async fn command(&mut self, command: &str) -> MpdResult<Vec<String>> {
        let result = self.try_command(command).await;
        if let Err(e) = &result {
            if e.is_connection_error() {
                // A broken stream cannot carry further commands.
                self.connection = None;
                warn!(
                    host = %self.host,
                    port = self.port,
                    error = %e,
                    "MPD connection lost"
                );
            }
        }
        result
    }

    async fn try_command(&mut self, command: &str) -> MpdResult<Vec<String>> {
        let connection = self.connection.as_mut().ok_or(MpdError::NotConnected)?;

        connection
            .writer
            .write_all(format!("{}\n", command).as_bytes())
            .await?;

        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let n = connection.reader.read_line(&mut line).await?;
            if n == 0 {
                return Err(MpdError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "server closed the connection",
                )));
            }
            let line = line.trim_end();
            if line == "OK" {
                return Ok(lines);
            }
            if let Some(rest) = line.strip_prefix("ACK ") {
                return Err(parse_ack(rest));
            }
            lines.push(line.to_string());
        }
    }
}

/// Split a `key: value` response line
fn split_pair(line: &str) -> MpdResult<(&str, &str)> {
    line.split_once(": ")
        .ok_or_else(|| MpdError::Protocol(format!("unexpected response line '{}'", line)))
}

/// Extract the media reference from a `playlist` response line
///
/// Lines look like `0:file: some/track.flac`; some servers omit the
/// position prefix.
fn parse_queue_line(line: &str) -> MpdResult<String> {
    if let Some((_, uri)) = line.split_once(":file: ") {
        return Ok(uri.to_string());
    }
    line.strip_prefix("file: ")
        .map(str::to_string)
        .ok_or_else(|| MpdError::Protocol(format!("unexpected playlist line '{}'", line)))
}

/// Group `plchanges` response lines into per-entry changes
///
/// Each entry starts with a `file:` line; the `Pos:` line that follows gives
/// its queue position. Any other metadata lines are ignored.
fn parse_queue_changes(lines: &[String]) -> MpdResult<Vec<QueueChange>> {
    let mut changes: Vec<QueueChange> = Vec::new();
    let mut current: Option<(String, Option<u32>)> = None;

    for line in lines {
        let (key, value) = split_pair(line)?;
        match key {
            "file" => {
                if let Some(entry) = current.take() {
                    changes.push(finish_change(entry)?);
                }
                current = Some((value.to_string(), None));
            }
            "Pos" => {
                let position = value.parse().map_err(|_| {
                    MpdError::Protocol(format!("unparseable 'Pos' value '{}'", value))
                })?;
                if let Some((_, pos)) = current.as_mut() {
                    *pos = Some(position);
                }
            }
            _ => {}
        }
    }
    if let Some(entry) = current.take() {
        changes.push(finish_change(entry)?);
    }
    Ok(changes)
}

fn finish_change((uri, position): (String, Option<u32>)) -> MpdResult<QueueChange> {
    let position = position
        .ok_or_else(|| MpdError::Protocol(format!("plchanges entry '{}' missing 'Pos'", uri)))?;
    Ok(QueueChange { position, uri })
}

/// Parse the remainder of an `ACK [code@index] {command} message` line
fn parse_ack(rest: &str) -> MpdError {
    let parsed = (|| {
        let rest = rest.strip_prefix('[')?;
        let (code, rest) = rest.split_once('@')?;
        let (_, rest) = rest.split_once("] {")?;
        let (command, message) = rest.split_once('}')?;
        Some((code.parse().ok()?, command.to_string(), message.trim().to_string()))
    })();

    match parsed {
        Some((code, command, message)) => MpdError::Server {
            code,
            command,
            message,
        },
        None => MpdError::Protocol(format!("malformed ACK line 'ACK {}'", rest)),
    }
}

/// Quote a command argument, escaping backslashes and double quotes
fn quote(argument: &str) -> String {
    let mut quoted = String::with_capacity(argument.len() + 2);
    quoted.push('"');
    for c in argument.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_quote_plain_argument() {
        assert_eq!(quote("some/track.flac"), "\"some/track.flac\"");
    }

    #[test]
    fn test_quote_escapes_quotes_and_backslashes() {
        assert_eq!(quote(r#"a "b" c"#), r#""a \"b\" c""#);
        assert_eq!(quote(r"a\b"), r#""a\\b""#);
    }

    #[test]
    fn test_parse_ack_full_line() {
        let err = parse_ack("[50@0] {play} song doesn't exist");
        assert_matches!(
            err,
            MpdError::Server { code: 50, ref command, ref message }
                if command == "play" && message == "song doesn't exist"
        );
    }

    #[test]
    fn test_parse_ack_empty_message() {
        let err = parse_ack("[5@0] {} ");
        assert_matches!(
            err,
            MpdError::Server { code: 5, ref command, ref message }
                if command.is_empty() && message.is_empty()
        );
    }

    #[test]
    fn test_parse_ack_garbage_is_protocol_error() {
        assert_matches!(parse_ack("no brackets here"), MpdError::Protocol(_));
    }

    #[test]
    fn test_parse_queue_line_with_position_prefix() {
        assert_eq!(
            parse_queue_line("0:file: albums/ok.flac").unwrap(),
            "albums/ok.flac"
        );
    }

    #[test]
    fn test_parse_queue_line_without_position_prefix() {
        assert_eq!(
            parse_queue_line("file: albums/ok.flac").unwrap(),
            "albums/ok.flac"
        );
    }

    #[test]
    fn test_parse_queue_changes_groups_entries() {
        let lines: Vec<String> = [
            "file: a.flac",
            "Pos: 3",
            "Id: 27",
            "file: b.flac",
            "Title: Something",
            "Pos: 4",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let changes = parse_queue_changes(&lines).unwrap();
        assert_eq!(
            changes,
            vec![
                QueueChange {
                    position: 3,
                    uri: "a.flac".to_string()
                },
                QueueChange {
                    position: 4,
                    uri: "b.flac".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_queue_changes_missing_pos_is_protocol_error() {
        let lines = vec!["file: a.flac".to_string()];
        assert_matches!(parse_queue_changes(&lines), Err(MpdError::Protocol(_)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let client = MpdClient::new("localhost", 6600, Some("hunter2".to_string()));
        let debug = format!("{:?}", client);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
