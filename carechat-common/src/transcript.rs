use std::fmt;

pub const PATIENT: &str = "patient";
pub const ANALYZER: &str = "analyzer";
pub const RECOMMENDER: &str = "recommender";

/// Who produced a transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Speaker {
    Patient,
    Analyzer,
    Recommender,
    Other(String),
}

impl Speaker {
    pub fn from_label(label: &str) -> Self {
        match label {
            PATIENT => Speaker::Patient,
            ANALYZER => Speaker::Analyzer,
            RECOMMENDER => Speaker::Recommender,
            other => Speaker::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Speaker::Patient => PATIENT,
            Speaker::Analyzer => ANALYZER,
            Speaker::Recommender => RECOMMENDER,
            Speaker::Other(name) => name,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub content: String,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, content: impl Into<String>) -> Self {
        Self {
            speaker,
            content: content.into(),
        }
    }
}

/// Chronological record of one request's turns.
///
/// Owned by a single request: created empty, filled by the scheduler, then
/// handed to the selector. Never shared between requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }
}

impl From<Vec<TranscriptEntry>> for Transcript {
    fn from(entries: Vec<TranscriptEntry>) -> Self {
        Self { entries }
    }
}
