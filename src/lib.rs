//! Subscription lifecycle engine
//!
//! Tracks each tenant subscription through its billing states, answers
//! access questions, expires lapsed subscriptions and sends renewal notices
//! once per billing cycle.
//!
//! - [`domain`] - status machine, transition rules, access policy
//! - [`ports`] - repository, notification and clock seams
//! - [`adapters`] - PostgreSQL, file, in-memory and logging implementations
//! - [`application`] - billing/admin handlers and the batch jobs
//! - [`config`] - environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
