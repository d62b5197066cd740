// Domain layer - Readings, display series and chart models
pub mod dashboard;
pub mod reading;
pub mod telemetry;
pub mod timestamp;
