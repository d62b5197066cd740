// Ingest service - Use case for recording posted temperatures
use crate::application::reading_repository::{ReadingRepository, StoreError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub const TEMPERATURE_FIELD: &str = "temperature";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct IngestService {
    repository: Arc<dyn ReadingRepository>,
}

impl IngestService {
    pub fn new(repository: Arc<dyn ReadingRepository>) -> Self {
        Self { repository }
    }

    /// Validate `payload` and persist its temperature
    pub async fn record(&self, payload: &Value) -> Result<f64, IngestError> {
        let temperature = parse_temperature(payload)?;
        self.repository.record(temperature).await?;
        tracing::info!(temperature, "temperature recorded");
        Ok(temperature)
    }
}

/// Pull a required, finite `temperature` number out of a JSON body
pub fn parse_temperature(payload: &Value) -> Result<f64, IngestError> {
    let object = payload
        .as_object()
        .ok_or_else(|| IngestError::Validation("request body must be a JSON object".to_string()))?;

    let field = object
        .get(TEMPERATURE_FIELD)
        .ok_or_else(|| IngestError::Validation(format!("'{TEMPERATURE_FIELD}' is required")))?;

    field
        .as_f64()
        .filter(|value| value.is_finite())
        .ok_or_else(|| IngestError::Validation(format!("'{TEMPERATURE_FIELD}' must be a number, got {field}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_repository::MemoryRepository;
    use futures::TryStreamExt;
    use serde_json::json;

    #[test]
    fn test_parse_temperature() {
        assert_eq!(parse_temperature(&json!({"temperature": 25.5})).unwrap(), 25.5);
        assert_eq!(parse_temperature(&json!({"temperature": 25})).unwrap(), 25.0);
        assert_eq!(parse_temperature(&json!({"temperature": -4.75, "unit": "C"})).unwrap(), -4.75);
    }

    #[test]
    fn test_parse_temperature_rejects_bad_payloads() {
        for payload in [
            json!({}),
            json!({"temperature": null}),
            json!({"temperature": "25.5"}),
            json!({"temperature": [25.5]}),
            json!([25.5]),
            json!(25.5),
        ] {
            let err = parse_temperature(&payload).unwrap_err();
            assert!(matches!(err, IngestError::Validation(_)), "accepted {payload}");
        }
    }

    #[tokio::test]
    async fn test_record_writes_latest_and_history() {
        let repository = MemoryRepository::new();
        let service = IngestService::new(Arc::new(repository.clone()));

        service.record(&json!({"temperature": 23.25})).await.unwrap();

        let latest = repository.get_latest().await.unwrap().unwrap();
        assert_eq!(latest.value, 23.25);
        let history: Vec<_> = repository.stream_all().try_collect().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, 23.25);
    }

    #[tokio::test]
    async fn test_invalid_payload_writes_nothing() {
        let repository = MemoryRepository::new();
        let service = IngestService::new(Arc::new(repository.clone()));

        assert!(service.record(&json!({"temp": 1.0})).await.is_err());
        assert!(repository.get_latest().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let repository = MemoryRepository::new();
        repository.set_unavailable(true).await;
        let service = IngestService::new(Arc::new(repository));

        let err = service.record(&json!({"temperature": 1.0})).await.unwrap_err();
        assert!(matches!(err, IngestError::Store(StoreError::Unavailable(_))));
    }
}
