pub mod api;
pub mod auth;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod state;
pub mod types;
pub mod ws;
