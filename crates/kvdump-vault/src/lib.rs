//! HTTP implementation of [`kvdump_core::SecretStore`] for the Vault API.

mod client;
mod http;

pub use client::{VaultClient, NAMESPACE_HEADER, TOKEN_HEADER};
