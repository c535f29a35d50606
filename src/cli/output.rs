//! Terminal rendering of entries and notices

use crate::application::{Notification, Presenter};
use crate::domain::{classify, Entry, EntryState};

const AWAITING_INPUT: &str = "(not written yet - use 'aidiary write <TEXT>')";

/// Format the entry list for display
pub fn format_entry_list(entries: &[Entry], today: &str) -> String {
    if entries.is_empty() {
        return "No entries found".to_string();
    }

    entries
        .iter()
        .map(|entry| format_entry(entry, today))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one entry as a heading plus its text
pub fn format_entry(entry: &Entry, today: &str) -> String {
    let body = match classify(entry, today) {
        EntryState::AwaitingInput => AWAITING_INPUT,
        EntryState::Recorded => entry.content.as_str(),
    };
    format!("{}\n  {}\n", entry.date, body)
}

/// Presenter that prints to stdout, and notices to stderr
pub struct TerminalPresenter {
    today: String,
}

impl TerminalPresenter {
    pub fn new(today: impl Into<String>) -> Self {
        TerminalPresenter {
            today: today.into(),
        }
    }
}

impl Presenter for TerminalPresenter {
    fn show_all(&mut self, entries: &[Entry]) {
        println!("{}", format_entry_list(entries, &self.today));
    }

    fn refresh(&mut self, _index: usize, entry: &Entry) {
        print!("{}", format_entry(entry, &self.today));
    }

    fn notify(&mut self, notification: &Notification) {
        eprintln!("{}", notification);
    }
}

/// Presenter for commands that render nothing until a change arrives
pub struct QuietPresenter {
    inner: TerminalPresenter,
}

impl QuietPresenter {
    pub fn new(today: impl Into<String>) -> Self {
        QuietPresenter {
            inner: TerminalPresenter::new(today),
        }
    }
}

impl Presenter for QuietPresenter {
    fn show_all(&mut self, _entries: &[Entry]) {}

    fn refresh(&mut self, index: usize, entry: &Entry) {
        self.inner.refresh(index, entry);
    }

    fn notify(&mut self, notification: &Notification) {
        self.inner.notify(notification);
    }
}
