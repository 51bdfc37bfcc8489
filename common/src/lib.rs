//! Types shared between the karaoke backend and its web frontend.
//!
//! Everything in here crosses the HTTP boundary as JSON, so every type is
//! `serde`-friendly and free of backend-only dependencies.

pub mod jobs;
pub mod model;
pub mod requests;
