//! Transport adapters.

pub mod memory_window;

pub use memory_window::MemoryWindow;
