//! File-backed SubscriptionRepository.
//!
//! Keeps every subscription in one YAML file so the admin CLI can be used
//! across invocations without a database. Each call loads the file, applies
//! the operation with in-memory semantics and writes the file back.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::adapters::memory::InMemorySubscriptionRepository;
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId};
use crate::domain::subscription::{SubscriptionState, SubscriptionStatus};
use crate::ports::{SubscriptionFilter, SubscriptionRepository};

#[derive(Debug)]
pub struct FileSubscriptionRepository {
    path: PathBuf,
    /// Serializes load-modify-store cycles within this process.
    lock: Mutex<()>,
}

impl FileSubscriptionRepository {
    /// Use `path` as the state file. It is created on first write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<InMemorySubscriptionRepository, DomainError> {
        if !fs::try_exists(&self.path).await.map_err(io_error)? {
            return Ok(InMemorySubscriptionRepository::new());
        }

        let yaml = fs::read_to_string(&self.path).await.map_err(io_error)?;
        if yaml.trim().is_empty() {
            return Ok(InMemorySubscriptionRepository::new());
        }
        let states: Vec<SubscriptionState> = serde_yaml::from_str(&yaml).map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid state file {}: {}", self.path.display(), e),
            )
        })?;
        Ok(InMemorySubscriptionRepository::with_subscriptions(states))
    }

    async fn store(&self, records: &InMemorySubscriptionRepository) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let yaml = serde_yaml::to_string(&records.all().await).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize subscriptions: {}", e),
            )
        })?;
        fs::write(&self.path, yaml).await.map_err(io_error)
    }
}

fn io_error(err: std::io::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("State file I/O failed: {}", err))
}

#[async_trait]
impl SubscriptionRepository for FileSubscriptionRepository {
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<SubscriptionState>, DomainError> {
        let _guard = self.lock.lock().await;
        self.load().await?.find_by_id(id).await
    }

    async fn insert(&self, state: &SubscriptionState) -> Result<(), DomainError> {
        let _guard = self.lock.lock().await;
        let records = self.load().await?;
        records.insert(state).await?;
        self.store(&records).await
    }

    async fn update(
        &self,
        state: &SubscriptionState,
        expected_version: i64,
    ) -> Result<SubscriptionState, DomainError> {
        let _guard = self.lock.lock().await;
        let records = self.load().await?;
        let saved = records.update(state, expected_version).await?;
        self.store(&records).await?;
        Ok(saved)
    }

    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
        filter: SubscriptionFilter,
    ) -> Result<Vec<SubscriptionState>, DomainError> {
        let _guard = self.lock.lock().await;
        self.load().await?.find_by_status(status, filter).await
    }
}
