//! STOMP 1.2 frame model and codec
//!
//! Frames are `COMMAND`, a header block, a blank line, a body, and a NUL
//! terminator. Header values are escaped per STOMP 1.2 (`\n`, `\r`, `:`
//! and `\` itself); CONNECT and CONNECTED frames are exempt from escaping
//! for backwards compatibility with STOMP 1.0 servers.

use std::fmt;

use thiserror::Error;

/// Frame commands in the subset of STOMP 1.2 the broker speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // Client frames
    Connect,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Disconnect,
    // Server frames
    Connected,
    Message,
    Receipt,
    Error,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Disconnect => "DISCONNECT",
            Command::Connected => "CONNECTED",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }

    fn parse(input: &str) -> Result<Self, FrameError> {
        match input {
            "CONNECT" => Ok(Command::Connect),
            "SEND" => Ok(Command::Send),
            "SUBSCRIBE" => Ok(Command::Subscribe),
            "UNSUBSCRIBE" => Ok(Command::Unsubscribe),
            "ACK" => Ok(Command::Ack),
            "NACK" => Ok(Command::Nack),
            "DISCONNECT" => Ok(Command::Disconnect),
            "CONNECTED" => Ok(Command::Connected),
            "MESSAGE" => Ok(Command::Message),
            "RECEIPT" => Ok(Command::Receipt),
            "ERROR" => Ok(Command::Error),
            other => Err(FrameError::UnknownCommand(other.to_string())),
        }
    }

    /// CONNECT/CONNECTED header values pass through unescaped
    fn escapes_headers(&self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription acknowledgement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    #[default]
    Auto,
    Client,
    ClientIndividual,
}

impl AckMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::ClientIndividual => "client-individual",
        }
    }
}

/// Error type for frame encoding and parsing
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    #[error("invalid escape sequence in header: {0}")]
    InvalidEscape(String),

    #[error("frame body is not valid JSON: {0}")]
    BadBody(#[from] serde_json::Error),
}

/// A single STOMP frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header, per the STOMP repeated-header rule
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    // -------------------------------------------------------------------------
    // Client frame constructors
    // -------------------------------------------------------------------------

    pub fn connect(host: &str) -> Self {
        Frame::new(Command::Connect)
            .with_header("accept-version", "1.2")
            .with_header("host", host)
            .with_header("heart-beat", "0,0")
    }

    pub fn subscribe(id: &str, destination: &str, ack: AckMode) -> Self {
        let frame = Frame::new(Command::Subscribe)
            .with_header("id", id)
            .with_header("destination", destination);
        match ack {
            AckMode::Auto => frame,
            mode => frame.with_header("ack", mode.as_str()),
        }
    }

    /// SEND with an already-serialized JSON body
    pub fn send_text(destination: &str, body: String) -> Self {
        let mut frame = Frame::new(Command::Send)
            .with_header("destination", destination)
            .with_header("content-type", "application/json")
            .with_header("content-length", body.len().to_string());
        frame.body = body;
        frame
    }

    /// SEND with a serializable JSON body
    pub fn send_json<T: serde::Serialize>(
        destination: &str,
        body: &T,
    ) -> Result<Self, FrameError> {
        Ok(Frame::send_text(destination, serde_json::to_string(body)?))
    }

    pub fn ack(id: &str) -> Self {
        Frame::new(Command::Ack).with_header("id", id)
    }

    pub fn disconnect(receipt: &str) -> Self {
        Frame::new(Command::Disconnect).with_header("receipt", receipt)
    }

    // -------------------------------------------------------------------------
    // Codec
    // -------------------------------------------------------------------------

    /// Encode to the wire form, NUL terminator included
    pub fn encode(&self) -> String {
        let escape_headers = self.command.escapes_headers();
        let mut out = String::with_capacity(self.body.len() + 64);
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape_headers {
                out.push_str(&escape(name));
                out.push(':');
                out.push_str(&escape(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse one frame from a complete WebSocket text payload
    pub fn parse(input: &str) -> Result<Self, FrameError> {
        // Servers may pad frames with leading EOLs (heart-beats)
        let input = input.trim_start_matches(['\r', '\n']);
        if input.is_empty() {
            return Err(FrameError::Empty);
        }

        let (head, body) = match split_blank_line(input) {
            Some(parts) => parts,
            None => (input, ""),
        };

        let mut lines = head.lines();
        let command_line = lines.next().ok_or(FrameError::Empty)?;
        let command = Command::parse(command_line.trim_end_matches('\r'))?;

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
            if command.escapes_headers() {
                headers.push((unescape(name)?, unescape(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let body = body.trim_end_matches('\0').to_string();
        Ok(Frame {
            command,
            headers,
            body,
        })
    }
}

/// Split at the blank line separating the header block from the body.
/// STOMP 1.2 allows CRLF as well as LF line endings, so the blank line is
/// either `\n\n` or `\r\n\r\n` (a trailing `\r` on the last header line is
/// stripped with the other header line endings).
fn split_blank_line(input: &str) -> Option<(&str, &str)> {
    let mut from = 0;
    while let Some(nl) = input[from..].find('\n') {
        let nl = from + nl;
        let rest = &input[nl + 1..];
        if let Some(body) = rest.strip_prefix("\r\n") {
            return Some((&input[..nl], body));
        }
        if let Some(body) = rest.strip_prefix('\n') {
            return Some((&input[..nl], body));
        }
        from = nl + 1;
    }
    None
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(input: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            other => {
                return Err(FrameError::InvalidEscape(format!(
                    "\\{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]  // Allow unwrap() in tests for cleaner test code
mod tests {
    use super::*;

    #[test]
    fn test_encode_connect() {
        let encoded = Frame::connect("localhost").encode();
        assert!(encoded.starts_with("CONNECT\n"));
        assert!(encoded.contains("accept-version:1.2\n"));
        assert!(encoded.contains("heart-beat:0,0\n"));
        assert!(encoded.ends_with("\n\n\0"));
    }

    #[test]
    fn test_encode_send_sets_content_length() {
        let frame = Frame::send_text("/app/chat.sendMessage", r#"{"a":1}"#.to_string());
        let encoded = frame.encode();
        assert!(encoded.contains("content-length:7\n"));
        assert!(encoded.ends_with("{\"a\":1}\0"));
    }

    #[test]
    fn test_parse_message_frame() {
        let raw = "MESSAGE\ndestination:/topic/t1.customer_message\nmessage-id:007\nsubscription:sub-0\nack:ack-41\n\n{\"sender\":\"c1\"}\0";
        let frame = Frame::parse(raw).unwrap();
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.header("destination"), Some("/topic/t1.customer_message"));
        assert_eq!(frame.header("ack"), Some("ack-41"));
        assert_eq!(frame.body, r#"{"sender":"c1"}"#);
    }

    #[test]
    fn test_parse_crlf_line_endings_keep_body() {
        let raw = "MESSAGE\r\ndestination:/topic/t1.customer_waiting\r\nsubscription:sub-1\r\nack:ack-3\r\n\r\n{\"customer_id\":\"c1\",\"tenant_id\":\"t1\"}\0";
        let frame = Frame::parse(raw).unwrap();
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.header("destination"), Some("/topic/t1.customer_waiting"));
        assert_eq!(frame.header("ack"), Some("ack-3"));
        assert_eq!(frame.body, r#"{"customer_id":"c1","tenant_id":"t1"}"#);
    }

    #[test]
    fn test_parse_error_frame_without_body() {
        let frame = Frame::parse("ERROR\nmessage:malformed frame\n\n\0").unwrap();
        assert_eq!(frame.command, Command::Error);
        assert_eq!(frame.header("message"), Some("malformed frame"));
        assert!(frame.body.is_empty());
    }

    #[test]
    fn test_header_escaping_round_trip() {
        let frame = Frame::new(Command::Send)
            .with_header("destination", "/queue/a")
            .with_header("note", "colon: and\nnewline \\ slash");
        let parsed = Frame::parse(&frame.encode()).unwrap();
        assert_eq!(parsed.header("note"), Some("colon: and\nnewline \\ slash"));
    }

    #[test]
    fn test_connected_headers_not_unescaped() {
        // STOMP 1.0 compatibility: CONNECTED values are taken verbatim
        let frame = Frame::parse("CONNECTED\nversion:1.2\nserver:broker\\v2\n\n\0").unwrap();
        assert_eq!(frame.header("server"), Some("broker\\v2"));
    }

    #[test]
    fn test_invalid_escape_rejected() {
        assert!(matches!(
            Frame::parse("MESSAGE\nbad:\\x\n\n\0"),
            Err(FrameError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_heartbeat_is_empty_frame() {
        assert!(matches!(Frame::parse("\n"), Err(FrameError::Empty)));
    }

    #[test]
    fn test_subscribe_omits_auto_ack_header() {
        let auto = Frame::subscribe("sub-0", "/topic/t1.new_customer", AckMode::Auto);
        assert!(auto.header("ack").is_none());

        let manual = Frame::subscribe("sub-1", "/topic/t1.customer_waiting", AckMode::ClientIndividual);
        assert_eq!(manual.header("ack"), Some("client-individual"));
    }

    #[test]
    fn test_repeated_header_uses_first_value() {
        let frame = Frame::parse("MESSAGE\nfoo:one\nfoo:two\n\n\0").unwrap();
        assert_eq!(frame.header("foo"), Some("one"));
    }
}
