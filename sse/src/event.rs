use std::borrow::Cow;
use std::fmt::{self, Write as _};

/// Sent once per subscription, before any replayed or live event.
pub const OPEN_NOTICE: &str = "event: open\n\n";

/// A bare comment line. Keeps idle connections alive without touching the
/// client's last-event-id.
pub const KEEP_ALIVE: &str = ":\n\n";

/// One record of the event stream.
///
/// Events are immutable once built. `Display` renders the wire format, so
/// `event.to_string()` is exactly what a transport writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    id: Option<String>,
    event: Option<String>,
    data: String,
    retry: Option<u64>,
}

impl Event {
    /// An event carrying only a data payload.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The event name (the `event:` field).
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Reconnection delay hint for the client, in milliseconds.
    pub fn retry(&self) -> Option<u64> {
        self.retry
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // `id` goes first; some client parsers expect it there.
        if let Some(id) = &self.id {
            writeln!(f, "id: {}", single_line(id))?;
        }
        if let Some(event) = &self.event {
            writeln!(f, "event: {}", single_line(event))?;
        }
        for line in data_lines(&self.data) {
            writeln!(f, "data: {line}")?;
        }
        if let Some(retry) = self.retry {
            writeln!(f, "retry: {retry}")?;
        }
        f.write_char('\n')
    }
}

/// Builder for [`Event`].
#[derive(Debug, Default)]
pub struct EventBuilder {
    id: Option<String>,
    event: Option<String>,
    data: String,
    retry: Option<u64>,
}

impl EventBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    pub fn retry(mut self, retry: u64) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn build(self) -> Event {
        Event {
            id: self.id,
            event: self.event,
            data: self.data,
            retry: self.retry,
        }
    }
}

/// Splits a payload on every line terminator the event-stream grammar knows:
/// `\r\n`, `\r` and `\n`. An empty payload still yields one (empty) line.
fn data_lines(data: &str) -> Vec<&str> {
    let bytes = data.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&data[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&data[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&data[start..]);
    lines
}

/// `id` and `event` values must stay on one wire line.
fn single_line(value: &str) -> Cow<'_, str> {
    if value.contains(['\r', '\n']) {
        Cow::Owned(value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect())
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal event-stream parser following the client-side dispatch rules,
    /// enough to check what a browser would reconstruct.
    fn parse(wire: &str) -> Vec<Event> {
        let mut events = Vec::new();
        let mut builder = Event::builder();
        let mut data: Option<String> = None;

        for line in wire.split('\n') {
            if line.is_empty() {
                if let Some(data) = data.take() {
                    events.push(std::mem::take(&mut builder).data(data).build());
                }
                builder = Event::builder();
                continue;
            }
            if line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            builder = match field {
                "id" => builder.id(value),
                "event" => builder.event(value),
                "retry" => builder.retry(value.parse().unwrap()),
                "data" => {
                    match data.as_mut() {
                        Some(buffer) => {
                            buffer.push('\n');
                            buffer.push_str(value);
                        }
                        None => data = Some(value.to_string()),
                    }
                    builder
                }
                _ => builder,
            };
        }
        events
    }

    #[test]
    fn test_serialize_orders_fields_id_event_data_retry() {
        let event = Event::builder()
            .retry(3000)
            .data("hello")
            .event("greeting")
            .id("7")
            .build();

        assert_eq!(
            event.to_string(),
            "id: 7\nevent: greeting\ndata: hello\nretry: 3000\n\n"
        );
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        assert_eq!(Event::new("only data").to_string(), "data: only data\n\n");
    }

    #[test]
    fn test_serialize_splits_multiline_data_into_repeated_data_lines() {
        let event = Event::new("first\nsecond\r\nthird\rfourth");

        assert_eq!(
            event.to_string(),
            "data: first\ndata: second\ndata: third\ndata: fourth\n\n"
        );
    }

    #[test]
    fn test_serialize_keeps_trailing_and_empty_lines() {
        assert_eq!(Event::new("").to_string(), "data: \n\n");
        assert_eq!(Event::new("a\n\n").to_string(), "data: a\ndata: \ndata: \n\n");
    }

    #[test]
    fn test_line_breaks_are_stripped_from_id_and_event() {
        let event = Event::builder()
            .id("1\n2")
            .event("bad\r\nname")
            .data("x")
            .build();

        assert_eq!(event.to_string(), "id: 12\nevent: badname\ndata: x\n\n");
    }

    #[test]
    fn test_client_reconstructs_fields_from_wire() {
        let original = Event::builder()
            .id("42")
            .event("update")
            .data("line one\nline two\n  indented\n")
            .retry(1500)
            .build();

        let parsed = parse(&original.to_string());

        assert_eq!(parsed, vec![original]);
    }

    #[test]
    fn test_data_with_leading_space_survives_parsing() {
        let original = Event::new(" padded");

        assert_eq!(parse(&original.to_string()), vec![original]);
    }

    #[test]
    fn test_open_notice_and_keep_alive_dispatch_nothing() {
        assert!(parse(OPEN_NOTICE).is_empty());
        assert!(parse(KEEP_ALIVE).is_empty());
    }
}
