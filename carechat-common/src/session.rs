use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ============================================================================
// JSONL turn logger
// ============================================================================

#[derive(Serialize)]
struct LogEntry<'a> {
    ts: u64,
    request_id: &'a str,
    event: &'a str,
    turn: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Append-only JSONL logger shared across requests.
/// If the file cannot be opened (or no path was given), log() is a no-op.
pub struct JsonlLogger {
    file: Option<Mutex<fs::File>>,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(|e| {
                tracing::warn!(path = %path.as_ref().display(), error = %e, "transcript log disabled");
            })
            .ok()
            .map(Mutex::new);
        Self { file }
    }

    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn from_optional_path(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::new(p),
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    /// Write one JSONL entry. No-op if the logger has no file.
    pub fn log(&self, request_id: &str, event: &str, turn: usize, data: Option<Value>) {
        let Some(ref file_mutex) = self.file else {
            return;
        };
        let entry = LogEntry {
            ts: now_millis(),
            request_id,
            event,
            turn,
            data,
        };
        let Ok(mut line) = serde_json::to_string(&entry) else {
            return;
        };
        line.push('\n');

        if let Ok(mut f) = file_mutex.lock() {
            let _ = f.write_all(line.as_bytes());
        }
    }
}

/// Truncate to `max_chars` characters for log previews.
pub fn summarize(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
