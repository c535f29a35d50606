//! Domain layer - Diary entries and their display classification

pub mod entry;

pub use entry::{classify, date_label, Entry, EntryState, DATE_FORMAT};
