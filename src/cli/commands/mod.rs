//! One module per `vault` subcommand.

pub mod completions;
pub mod config;
pub mod create;
pub mod delete;
pub mod export;
pub mod info;
pub mod init;
pub mod list;
pub mod server;
pub mod show;
pub mod version;
pub mod write;
