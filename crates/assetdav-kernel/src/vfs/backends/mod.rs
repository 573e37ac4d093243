//! Repository implementations.

pub mod memory;

pub use memory::{MemoryRepository, RepositorySnapshot, SnapshotEntry};
