pub mod config;
mod gamification_routes;
mod http_layers;
mod library_routes;
mod profile_routes;
pub mod server;
mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
#[allow(unused_imports)] // Used by main.rs
pub use server::run_server;
