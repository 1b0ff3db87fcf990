pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod profile;
pub mod services;
pub mod types;
