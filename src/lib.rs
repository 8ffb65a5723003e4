pub mod agent;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod failure;
pub mod handlers;
pub mod limiter;
pub mod middleware;
pub mod store;

pub use app::{app, AppState};
