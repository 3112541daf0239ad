//! Step abstraction and step implementations.
//!
//! This module provides the `Step` trait, the `StepBase` state machine every
//! step embeds, and a configuration-driven step with its factory.

pub mod base;
pub mod declared;
pub mod factory;
pub mod step_state;

pub use base::{Step, StepContext, StepError};
pub use declared::{DeclaredOutcome, DeclaredStep};
pub use factory::StepFactory;
pub use step_state::{DependencyStates, StepBase, StepKind};
