// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod firestore_repository;
pub mod gcp_auth;
pub mod memory_repository;
pub mod svg_chart;
