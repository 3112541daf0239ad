//! State management for processes.
//!
//! This module provides:
//! - The `StateProvider` persistence boundary and its bundled backends
//! - Process run-state transitions
//! - Event fan-out to subscribers

pub mod events;
pub mod file;
pub mod memory;
pub mod process;
pub mod provider;

pub use events::EventBus;
pub use file::{JsonFileStateProvider, StateEntry};
pub use memory::InMemoryStateProvider;
pub use process::RunState;
pub use provider::{ProviderError, ProviderResult, StateKey, StateProvider};
