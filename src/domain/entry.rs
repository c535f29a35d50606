//! Diary entry model and date labels

use chrono::NaiveDate;

/// Label format for entry dates, e.g. "Monday, 1 January"
pub const DATE_FORMAT: &str = "%A, %-d %B";

/// One diary record, keyed by its calendar-day label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub date: String,
    pub content: String,
}

impl Entry {
    pub fn new(date: impl Into<String>, content: impl Into<String>) -> Self {
        Entry {
            date: date.into(),
            content: content.into(),
        }
    }

    /// Empty placeholder for a day that has not been written yet
    pub fn placeholder(date: impl Into<String>) -> Self {
        Entry::new(date, "")
    }
}

/// How the presentation layer should show an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Today's entry with no content: show an input field
    AwaitingInput,
    /// Anything else: show the text
    Recorded,
}

/// Classify an entry relative to today's date label.
pub fn classify(entry: &Entry, today: &str) -> EntryState {
    if entry.content.is_empty() && entry.date == today {
        EntryState::AwaitingInput
    } else {
        EntryState::Recorded
    }
}

/// Render a date as an entry label
pub fn date_label(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
