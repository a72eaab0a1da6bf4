/// In-memory question supplier backed by an activity file.
pub mod activity_bank;
/// Persisted player records.
pub mod models;
/// Durable score storage collaborator.
pub mod player_store;
/// Question supplier collaborator.
pub mod question_source;
/// Storage error shared by the collaborators.
pub mod storage;
