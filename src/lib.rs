pub mod config;
pub mod error;
pub mod language;
pub mod message;
pub mod routes;
pub mod services;
pub mod state;
