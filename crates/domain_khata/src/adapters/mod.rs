//! Adapters for the khata port

pub mod memory;

pub use memory::InMemoryKhataStore;
