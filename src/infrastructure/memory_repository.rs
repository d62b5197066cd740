// In-memory repository - process-local reading store
use crate::application::reading_repository::{ReadingRepository, StoreError};
use crate::domain::reading::{Reading, StoredTime, LATEST_KEY};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::BoxStream;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Readings kept in process memory; lost on restart.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    latest: Option<Reading>,
    history: Vec<Reading>,
    unavailable: bool,
}

impl MemoryState {
    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("in-memory store is offline".to_string()));
        }
        Ok(())
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_history(history: Vec<Reading>) -> Self {
        let state = MemoryState {
            history,
            ..Default::default()
        };
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Make every call fail with `StoreError::Unavailable`
    #[cfg(test)]
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().await.unavailable = unavailable;
    }
}

#[async_trait]
impl ReadingRepository for MemoryRepository {
    async fn get_latest(&self) -> Result<Option<Reading>, StoreError> {
        let state = self.inner.read().await;
        state.check()?;
        Ok(state.latest.clone())
    }

    async fn set_latest(&self, value: f64) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        state.check()?;
        state.latest = Some(Reading::new(LATEST_KEY, value, StoredTime::Instant(Utc::now())));
        Ok(())
    }

    async fn append(&self, value: f64) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        state.check()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        state
            .history
            .push(Reading::new(id, value, StoredTime::Instant(Utc::now())));
        Ok(())
    }

    fn stream_all(&self) -> BoxStream<'_, Result<Reading, StoreError>> {
        Box::pin(async_stream::stream! {
            let snapshot = {
                let state = self.inner.read().await;
                state.check().map(|_| state.history.clone())
            };

            match snapshot {
                Ok(history) => {
                    for reading in history {
                        yield Ok(reading);
                    }
                }
                Err(err) => yield Err(err),
            }
        })
    }

    /// Both writes happen under one lock, so readers never see them apart
    async fn record(&self, value: f64) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        state.check()?;
        let now = StoredTime::Instant(Utc::now());
        let id = uuid::Uuid::new_v4().simple().to_string();
        state.latest = Some(Reading::new(LATEST_KEY, value, now.clone()));
        state.history.push(Reading::new(id, value, now));
        Ok(())
    }
}
