pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod observer;
pub mod query;
pub mod services;
pub mod store;
pub mod types;
pub mod views;
