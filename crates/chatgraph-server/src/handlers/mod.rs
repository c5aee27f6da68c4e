//! HTTP handler modules. Handlers are thin: lock the connector, delegate,
//! map errors to [`ApiError`](crate::error::ApiError).

pub mod events;
pub mod health;
pub mod jobs;
pub mod suggestions;
pub mod sync;
