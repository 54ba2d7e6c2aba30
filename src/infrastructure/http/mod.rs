//! HTTP Infrastructure - 对外 HTTP 接口

pub mod conditional;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{build_app, HttpServer};
pub use state::AppState;
