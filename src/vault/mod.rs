//! Client-side vaults.
//!
//! This module provides:
//! - The pluggable `Store` trait, descriptors and factory (`store`)
//! - Local-file and remote-registry stores (`file_store`, `remote_store`)
//! - The `Vault` codec pairing a store with a key pair (`codec`)
//! - The user's list of known vaults (`local`)

pub mod codec;
pub mod file_store;
pub mod local;
pub mod remote_store;
pub mod store;

// Re-export the most commonly used items.
pub use codec::Vault;
pub use file_store::FileStore;
pub use local::{LocalVaultList, VaultEntry};
pub use remote_store::RemoteStore;
pub use store::{open_store, open_store_value, Store, StoreDescriptor};
