//! Library crate for quizzz-back: multiplayer quiz matches kept in sync over long-polling.

/// Runtime configuration.
pub mod config;
/// Collaborators: question source and player store.
pub mod dao;
/// Wire types of the REST API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum routers.
pub mod routes;
/// Use cases and background tasks.
pub mod services;
/// In-memory domain and shared state.
pub mod state;
