//! HTTP surface: router, health and WebSocket endpoints

pub mod routes;

pub use routes::build_router;
