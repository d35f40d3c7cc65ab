//! Line reassembly and envelope decoding for the CLI's output stream.

use tether_types::AgentEvent;

/// Reassembles arbitrary-sized chunks into complete newline-terminated
/// lines, holding back the incomplete tail until its newline arrives.
///
/// Invariant: the emitted lines (each plus `\n`) concatenated with the
/// current tail reproduce exactly the bytes pushed so far.
#[derive(Debug, Default)]
pub struct LineBuffer {
    tail: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete line, in receipt order.
    /// A line is only emitted once its terminating newline has been seen.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.tail.push_str(chunk);
        let mut lines = Vec::new();

        while let Some(newline_pos) = self.tail.find('\n') {
            let line = self.tail[..newline_pos].to_string();
            self.tail = self.tail[newline_pos + 1..].to_string();
            lines.push(line);
        }

        lines
    }

    /// The currently buffered unterminated tail.
    pub fn tail(&self) -> &str {
        &self.tail
    }
}

/// Attempt a strict structured decode of one line (newline stripped).
///
/// Returns `None` for empty/whitespace-only lines and for lines that are
/// not valid envelopes; the caller takes the plain-text fallback path for
/// the latter. Decode failure is never fatal.
pub fn parse_envelope(line: &str) -> Option<AgentEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<AgentEvent>(trimmed) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(target: "tether::parser", "Line is not a structured envelope: {}: {}", e, trimmed);
            None
        }
    }
}
