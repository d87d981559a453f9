//! Storage Adapters
//!
//! - **FileSubscriptionRepository** - Subscriptions kept in a YAML state file
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::FileSubscriptionRepository;
//!
//! let repo = FileSubscriptionRepository::new("./data/subscriptions.yaml");
//! ```

mod file_subscription_repository;

pub use file_subscription_repository::FileSubscriptionRepository;
