use chrono::{DateTime, Utc};
use serde::Serialize;

/// Published after every successful cart write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    /// The list was rewritten; `lines` is the new line count (the badge number).
    Updated { lines: usize, at: DateTime<Utc> },
    /// The cart key was removed (after checkout, or an explicit clear).
    Cleared { at: DateTime<Utc> },
}

impl CartEvent {
    pub fn updated(lines: usize) -> Self { CartEvent::Updated { lines, at: Utc::now() } }
    pub fn cleared() -> Self { CartEvent::Cleared { at: Utc::now() } }

    pub fn lines(&self) -> usize {
        match self {
            CartEvent::Updated { lines, .. } => *lines,
            CartEvent::Cleared { .. } => 0,
        }
    }
}
