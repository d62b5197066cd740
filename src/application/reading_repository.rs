// Repository trait for temperature readings
use crate::domain::reading::Reading;
use async_trait::async_trait;
use futures::stream::{BoxStream, TryStreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reading store unavailable: {0}")]
    Unavailable(String),
    #[error("reading store rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed reading store response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ReadingRepository: Send + Sync {
    /// Read the latest slot, `None` if it was never written
    async fn get_latest(&self) -> Result<Option<Reading>, StoreError>;

    /// Overwrite the latest slot; the store stamps the time
    async fn set_latest(&self, value: f64) -> Result<(), StoreError>;

    /// Add a history record under a store-generated id; the store stamps the time
    async fn append(&self, value: f64) -> Result<(), StoreError>;

    /// Every history record, unordered. The latest slot is not included.
    fn stream_all(&self) -> BoxStream<'_, Result<Reading, StoreError>>;

    /// Update the latest slot and append to history.
    ///
    /// The default issues two independent writes: if `append` fails the latest
    /// slot is already updated.
    async fn record(&self, value: f64) -> Result<(), StoreError> {
        self.set_latest(value).await?;
        self.append(value).await
    }

    /// The `limit` chronologically-latest history records, oldest first.
    ///
    /// Records whose time cannot be parsed are never windowed away; they are
    /// returned ahead of the timed ones so the caller sees the bad value.
    async fn recent(&self, limit: usize) -> Result<Vec<Reading>, StoreError> {
        let readings: Vec<Reading> = self.stream_all().try_collect().await?;
        let (mut timed, mut untimed): (Vec<Reading>, Vec<Reading>) = readings
            .into_iter()
            .partition(|reading| reading.time.instant().is_some());

        timed.sort_by_key(|reading| reading.time.instant());
        let excess = timed.len().saturating_sub(limit);
        untimed.extend(timed.split_off(excess));
        Ok(untimed)
    }
}
