//! HTTP API handlers.

pub mod callback;
