//! Mutable conversation state owned by one controller.
//!
//! The transcript is append-only. The update cursor never moves backwards.
//! The seen-id set only grows, and it is not persisted: after a reload an
//! agent message from before the cursor existed may be shown once more.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};

use embedchat_types::transcript::TranscriptEntry;
use embedchat_types::wire::UpdateItem;

/// Append-only list of displayed entries.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ids of agent messages already appended to the transcript.
#[derive(Debug, Clone, Default)]
pub struct SeenAgentIds {
    ids: HashSet<String>,
}

impl SeenAgentIds {
    /// Record an id. Returns false if it was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Timestamp of the most recently consumed update.
#[derive(Debug, Clone, Default)]
pub struct UpdateCursor {
    since_iso: Option<String>,
}

impl UpdateCursor {
    pub fn since_iso(&self) -> Option<&str> {
        self.since_iso.as_deref()
    }

    /// Move the cursor to `candidate` unless that would move it backwards.
    ///
    /// Returns whether the cursor changed.
    pub fn advance(&mut self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return false;
        }
        if let Some(current) = &self.since_iso {
            if compare_timestamps(candidate, current) != Ordering::Greater {
                return false;
            }
        }
        self.since_iso = Some(candidate.to_string());
        true
    }

    pub fn reset(&mut self) {
        self.since_iso = None;
    }
}

/// Order two ISO-8601 timestamps.
///
/// Offsets are honoured; timestamps without an offset are read as UTC.
/// Anything unparseable falls back to lexicographic order.
fn compare_timestamps(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Everything a controller tracks about its conversation.
#[derive(Debug, Default)]
pub struct ConversationState {
    pub transcript: Transcript,
    pub conversation_id: Option<String>,
    pub cursor: UpdateCursor,
    pub seen: SeenAgentIds,
}

impl ConversationState {
    pub fn new(conversation_id: Option<String>) -> Self {
        Self {
            conversation_id,
            ..Self::default()
        }
    }

    /// Merge one update batch and return the entries that were appended.
    ///
    /// Only agent items are considered. Items whose id was already seen are
    /// skipped; items without an id are always appended. The cursor moves to
    /// the `created_at` of the last item in the batch that carries one.
    pub fn merge_updates(&mut self, items: Vec<UpdateItem>) -> Vec<TranscriptEntry> {
        let last_created_at = items
            .iter()
            .rev()
            .find_map(|item| item.created_at.clone().filter(|ts| !ts.trim().is_empty()));

        let mut appended = Vec::new();
        for item in items.into_iter().filter(UpdateItem::is_agent) {
            if let Some(id) = &item.id {
                if !self.seen.insert(id) {
                    continue;
                }
            }
            let entry = TranscriptEntry::agent(item.id, item.content);
            self.transcript.push(entry.clone());
            appended.push(entry);
        }

        if let Some(created_at) = last_created_at {
            self.cursor.advance(&created_at);
        }
        appended
    }
}
