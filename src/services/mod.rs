/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Live match use cases.
pub mod match_service;
/// Long-poll handling.
pub mod poll_service;
/// Background question supply with bounded retries.
pub mod question_supplier;
/// Per-match phase scheduler.
pub mod scheduler;
/// Waiting room use cases.
pub mod staging_service;
