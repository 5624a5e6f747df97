//! REST client for the recruitment backend
//!
//! Shared by the digital-human gateway and the answer API. Every backend route
//! answers with the same `{ success, data, message, error }` envelope.

mod client;

pub use client::{ApiResponse, BackendClient, BackendError};
