pub mod config;
pub mod logger;
pub mod persistence;

pub use persistence::{JsonFileSnapshot, SnapshotStore};
