//! HTTP API: routing, credential middleware and error mapping.

pub mod app;
pub mod context;
pub mod middleware;
