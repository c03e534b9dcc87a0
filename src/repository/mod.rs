//! Server-side registry storage.
//!
//! - `id`: record identifiers
//! - `registry`: the persisted record
//! - `query`: filter and mutation expressions
//! - `db`: the file-per-record store
//! - `service`: sign-gated publish/read/update/delete/list

pub mod db;
pub mod id;
pub mod query;
pub mod registry;
pub mod service;

pub use db::RegistryStore;
pub use id::Id;
pub use query::{Comparator, Field, Filter, Mutation, Query};
pub use registry::Registry;
pub use service::{ListOptions, ListPage, PublishOptions, Published, VaultRepository};
