//! User settings (`~/.vaultrc`).

pub mod settings;

pub use settings::Settings;
