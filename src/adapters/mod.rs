//! Adapters - Implementations of port interfaces.
//!
//! - `clock` - System and fixed clocks
//! - `memory` - In-memory repository for tests and single-process runs
//! - `notification` - Renewal notice dispatchers (log, recording)
//! - `postgres` - Versioned PostgreSQL repository and pool setup
//! - `storage` - YAML state file repository for the CLI

pub mod clock;
pub mod memory;
pub mod notification;
pub mod postgres;
pub mod storage;

pub use clock::{FixedClock, SystemClock};
pub use memory::InMemorySubscriptionRepository;
pub use notification::{LogNotificationDispatcher, RecordingNotificationDispatcher};
pub use postgres::PostgresSubscriptionRepository;
pub use storage::FileSubscriptionRepository;
