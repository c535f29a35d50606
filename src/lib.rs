//! aidiary - A diary rewritten by a remote text service
//!
//! One entry per calendar day. Each day's entry starts empty, takes one piece
//! of free text, and is replaced by the transformed text once the remote
//! service answers.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::DiaryError;
