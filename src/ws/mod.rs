//! WebSocket transport: wire protocol, per-connection queues, socket tasks

pub mod connections;
pub mod handler;
pub mod protocol;
