// Telemetry data domain models
use chrono::DateTime;
use chrono_tz::Tz;

pub const CHART_TITLE: &str = "Temperature";
pub const X_LABEL: &str = "Time";
pub const Y_LABEL: &str = "Temperature (°C)";

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub time: DateTime<Tz>,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time: DateTime<Tz>, value: f64) -> Self {
        Self { time, value }
    }

    pub fn time_ms(&self) -> i64 {
        self.time.timestamp_millis()
    }
}

/// Line chart with a marker on every point.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<TimeSeriesPoint>,
}

impl ChartData {
    pub fn new(title: String, x_label: String, y_label: String, points: Vec<TimeSeriesPoint>) -> Self {
        Self {
            title,
            x_label,
            y_label,
            points,
        }
    }

    pub fn temperature(points: Vec<TimeSeriesPoint>) -> Self {
        Self::new(
            CHART_TITLE.to_string(),
            X_LABEL.to_string(),
            Y_LABEL.to_string(),
            points,
        )
    }
}
