pub mod api;
pub mod config;
pub mod event;
pub mod payload;
pub mod prometheus;
pub mod router;
pub mod server;
pub mod sinks;
pub mod webhook;
