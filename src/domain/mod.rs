//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine trait)
//! - `subscription` - Subscription lifecycle: access policy, transitions, renewal notices

pub mod foundation;
pub mod subscription;
