//! Infrastructure layer - Storage, configuration and the remote client

pub mod config;
pub mod store;
pub mod transform;
pub mod workspace;

pub use config::{Config, Timeouts, TransformConfig};
pub use store::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, PersistentEntryStore, WriteBatch,
};
pub use transform::{TransformationClient, Transformer};
pub use workspace::DiaryWorkspace;
