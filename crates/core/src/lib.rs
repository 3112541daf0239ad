//! # seq-core
//!
//! Resumable, dependency-aware step execution engine.
//!
//! This crate provides:
//! - The step abstraction and its outcome state machine
//! - The process engine that validates, resolves dependencies and runs steps
//! - State providers that persist step outcomes between runs
//! - Configuration loading from the `.sequencer/` directory
//!
//! ## Modules
//!
//! - [`steps`]: Step trait, step state machine and configuration-driven steps
//! - [`engine`]: Process execution engine
//! - [`state`]: Processing-state transitions, events and state providers
//! - [`config`]: Configuration loading and management

pub mod config;
pub mod engine;
pub mod state;
pub mod steps;

pub use engine::{Process, ProcessError, ProcessResult};
pub use state::{InMemoryStateProvider, JsonFileStateProvider, ProviderError, StateProvider};
pub use steps::{Step, StepBase, StepContext, StepError, StepKind};
