//! Export of key-value secret mounts into a local file tree.
//!
//! The store is reached through the [`SecretStore`] trait; `kvdump-vault`
//! provides the HTTP implementation and tests use an in-memory one.

pub mod error;
pub mod exporter;
pub mod lister;
pub mod mounts;
pub mod output;
pub mod reader;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ExportError, Result};
pub use exporter::{export_all, export_secrets, ExportOptions, ExportStats, ROOT_NAMESPACE_DIR};
pub use lister::list_paths;
pub use mounts::{list_kv_mounts, list_namespaces};
pub use output::JsonStyle;
pub use reader::{read_secret, Secret};
pub use store::{
    KvVersion, ListData, ListResponse, Mount, MountEntry, MountsResponse, SecretStore, StoreError,
};
