//! Application layer - Use cases and orchestration

pub mod controller;
pub mod init;
pub mod manage_config;
pub mod repository;

pub use controller::{DiaryController, EntryPhase, Notification, Presenter, SubmissionOutcome};
pub use manage_config::ConfigService;
pub use repository::EntryRepository;
