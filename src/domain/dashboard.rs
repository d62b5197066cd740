// Dashboard domain model
use chrono_tz::Tz;

use super::reading::Reading;
use super::telemetry::{ChartData, TimeSeriesPoint};
use super::timestamp::{format_display, normalize, TimestampError};

/// Number of readings the dashboard keeps.
pub const DEFAULT_WINDOW: usize = 100;

/// Placeholder shown when there is nothing to report.
pub const NO_DATA: &str = "No data";

#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub value: String,
    pub time: String,
}

impl Headline {
    pub fn from_point(point: &TimeSeriesPoint) -> Self {
        Self {
            value: format_value(point.value),
            time: format_display(&point.time),
        }
    }

    pub fn no_data() -> Self {
        Self {
            value: NO_DATA.to_string(),
            time: NO_DATA.to_string(),
        }
    }
}

/// Chronologically ascending view of the most recent readings.
#[derive(Debug, Clone)]
pub struct DisplaySeries {
    pub points: Vec<TimeSeriesPoint>,
}

impl DisplaySeries {
    /// Normalize, sort and window `readings`.
    ///
    /// The sort is stable, so readings sharing a timestamp keep the order
    /// they were read in.
    pub fn from_readings<I>(readings: I, tz: Tz, window: usize) -> Result<Self, TimestampError>
    where
        I: IntoIterator<Item = Reading>,
    {
        let mut points = readings
            .into_iter()
            .map(|reading| Ok(TimeSeriesPoint::new(normalize(&reading.time, tz)?, reading.value)))
            .collect::<Result<Vec<_>, TimestampError>>()?;

        points.sort_by(|a, b| a.time.cmp(&b.time));

        let excess = points.len().saturating_sub(window);
        points.drain(..excess);

        Ok(Self { points })
    }

    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }

    pub fn headline(&self) -> Headline {
        self.latest()
            .map(Headline::from_point)
            .unwrap_or_else(Headline::no_data)
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub headline: Headline,
    pub chart: ChartData,
}

impl Dashboard {
    pub fn new(series: DisplaySeries) -> Self {
        let headline = series.headline();
        Self {
            headline,
            chart: ChartData::temperature(series.points),
        }
    }
}

/// Whole numbers keep one decimal so `20.0` does not read as `20`.
pub fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::StoredTime;
    use chrono::{Duration, TimeZone, Utc};
    use chrono_tz::Asia::Seoul;

    fn reading_at(minutes: i64, value: f64) -> Reading {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Reading::new(
            format!("r{minutes}"),
            value,
            StoredTime::Instant(base + Duration::minutes(minutes)),
        )
    }

    #[test]
    fn test_series_is_sorted_ascending() {
        let readings = vec![reading_at(5, 22.0), reading_at(1, 20.0), reading_at(3, 21.0)];
        let series = DisplaySeries::from_readings(readings, Seoul, DEFAULT_WINDOW).unwrap();

        let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![20.0, 21.0, 22.0]);
        assert_eq!(series.headline().value, "22.0");
        assert_eq!(series.headline().time, "2024-01-01 09:05:00");
    }

    #[test]
    fn test_series_keeps_latest_window() {
        let readings: Vec<Reading> = (0..250).rev().map(|i| reading_at(i, i as f64)).collect();
        let series = DisplaySeries::from_readings(readings, Seoul, DEFAULT_WINDOW).unwrap();

        assert_eq!(series.points.len(), 100);
        assert_eq!(series.points.first().unwrap().value, 150.0);
        assert_eq!(series.latest().unwrap().value, 249.0);
    }

    #[test]
    fn test_equal_timestamps_keep_read_order() {
        let readings = vec![reading_at(2, 1.0), reading_at(2, 2.0), reading_at(1, 0.5)];
        let series = DisplaySeries::from_readings(readings, Seoul, DEFAULT_WINDOW).unwrap();

        let values: Vec<f64> = series.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_mixed_time_representations() {
        let readings = vec![
            Reading::new("a", 19.5, StoredTime::Text("2024-01-01 00:10:00".to_string())),
            reading_at(0, 18.0),
        ];
        let series = DisplaySeries::from_readings(readings, Seoul, DEFAULT_WINDOW).unwrap();
        assert_eq!(series.headline().time, "2024-01-01 09:10:00");
    }

    #[test]
    fn test_malformed_time_fails_the_series() {
        let readings = vec![Reading::new("a", 1.0, StoredTime::Text("soon".to_string()))];
        assert!(DisplaySeries::from_readings(readings, Seoul, DEFAULT_WINDOW).is_err());
    }

    #[test]
    fn test_empty_series_has_no_data_headline() {
        let series = DisplaySeries::from_readings(Vec::new(), Seoul, DEFAULT_WINDOW).unwrap();
        assert_eq!(series.headline(), Headline::no_data());

        let dashboard = Dashboard::new(series);
        assert!(dashboard.chart.points.is_empty());
        assert_eq!(dashboard.headline.value, NO_DATA);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(20.0), "20.0");
        assert_eq!(format_value(21.5), "21.5");
        assert_eq!(format_value(-3.25), "-3.25");
    }
}
