//! # seq-protocol
//!
//! Shared data models for the step sequencer.
//!
//! This crate defines every structure that crosses a boundary of the engine:
//! - Step state records exchanged with state providers
//! - Process lifecycle states
//! - Lifecycle events delivered to listeners
//! - Step and process declarations read from configuration files
//!
//! ## Modules
//!
//! - [`record_models`]: Persisted step outcomes and resolved dependency states
//! - [`process_models`]: Process lifecycle state
//! - [`step_models`]: Dependency references and step/process declarations
//! - [`config_models`]: Global configuration from `config.toml`
//! - [`ipc`]: Lifecycle events emitted by a running process
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, serde_json and ts-rs
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other sequencer crates

pub mod config_models;
pub mod ipc;
pub mod process_models;
pub mod record_models;
pub mod step_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use process_models::*;
pub use record_models::*;
pub use step_models::*;
