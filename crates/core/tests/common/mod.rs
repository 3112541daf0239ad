//! Common test utilities and helpers for process tests.
//!
//! This module provides shared functionality across the integration tests:
//! - Test fixtures (step lists, providers, sample configuration)
//! - Custom assertions over emitted events
//! - Scripted steps with deterministic outcomes

pub mod assertions;
pub mod fixtures;
pub mod scripted_steps;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use scripted_steps::*;
