// Dashboard service - Use case for building the dashboard
use crate::application::reading_repository::{ReadingRepository, StoreError};
use crate::domain::dashboard::{Dashboard, DisplaySeries};
use crate::domain::telemetry::TimeSeriesPoint;
use crate::domain::timestamp::{normalize, TimestampError};
use crate::infrastructure::config::DisplaySettings;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn ReadingRepository>,
    display: DisplaySettings,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn ReadingRepository>, display: DisplaySettings) -> Self {
        Self {
            repository,
            display,
        }
    }

    pub async fn get_dashboard(&self) -> Result<Dashboard, DashboardError> {
        let readings = self.repository.recent(self.display.window).await?;
        let series = DisplaySeries::from_readings(readings, self.display.timezone, self.display.window)?;

        tracing::debug!(points = series.points.len(), "dashboard series prepared");

        Ok(Dashboard::new(series))
    }

    /// The latest slot, normalized to the display timezone
    pub async fn latest(&self) -> Result<Option<TimeSeriesPoint>, DashboardError> {
        let Some(reading) = self.repository.get_latest().await? else {
            return Ok(None);
        };
        let time = normalize(&reading.time, self.display.timezone)?;
        Ok(Some(TimeSeriesPoint::new(time, reading.value)))
    }
}
