mod handlers;
mod models;
mod service;
mod state;

pub use handlers::run_server;
