//! Storage backends implementing the EntityStore trait

pub mod memory;

pub use memory::MemoryStore;
