pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod fsio;
pub mod repository;
pub mod server;
pub mod vault;
