pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod inventory;
pub mod mock;
pub mod render;
pub mod session;
pub mod store;
pub mod telemetry;
