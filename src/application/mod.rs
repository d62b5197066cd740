// Application layer - Use cases and repository contracts
pub mod dashboard_service;
pub mod ingest_service;
pub mod reading_repository;
