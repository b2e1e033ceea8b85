//! Task persistence.

pub mod store;

pub use store::{JsonFileStore, MemoryStore, TaskMap, TaskStore};
