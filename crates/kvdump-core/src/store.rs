use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failures reported by a [`SecretStore`].
///
/// `InvalidPath` is the store's "no such path" answer. Callers decide whether
/// it means an expected absence or a hard error; every other variant is fatal
/// to an export.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no such path: {path}")]
    InvalidPath { path: String },
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
    #[error("permission denied: {message}")]
    Forbidden { message: String },
    #[error("store sealed or unavailable: {message}")]
    Sealed { message: String },
    #[error("unexpected response {status}: {message}")]
    Unexpected { status: u16, message: String },
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("malformed response: {message}")]
    Decode { message: String },
}

impl StoreError {
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    pub fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KvVersion {
    V1,
    V2,
}

impl KvVersion {
    /// Parses the `version` option of a kv mount. An empty value is how
    /// engines mounted without options report themselves and means v1.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "1" => Some(Self::V1),
            "2" => Some(Self::V2),
            _ => None,
        }
    }
}

impl fmt::Display for KvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("1"),
            Self::V2 => f.write_str("2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub name: String,
    pub version: KvVersion,
}

impl Mount {
    pub fn new(name: impl Into<String>, version: KvVersion) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResponse {
    pub data: ListData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListData {
    #[serde(default)]
    pub keys: Vec<String>,
}

impl ListResponse {
    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            data: ListData {
                keys: keys.into_iter().map(Into::into).collect(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MountsResponse {
    pub data: BTreeMap<String, MountEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountEntry {
    #[serde(rename = "type")]
    pub engine_type: String,
    #[serde(default)]
    pub options: Option<BTreeMap<String, serde_json::Value>>,
}

impl MountEntry {
    /// Raw `version` option, if the engine declares one.
    pub fn version_option(&self) -> Option<String> {
        let value = self.options.as_ref()?.get("version")?;
        match value {
            serde_json::Value::String(version) => Some(version.clone()),
            serde_json::Value::Number(version) => Some(version.to_string()),
            _ => None,
        }
    }
}

/// Capability interface over a hierarchical secret store.
///
/// Every call is addressed relative to the namespace the store is bound to.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Namespace this store is bound to; `None` for the root namespace.
    fn namespace(&self) -> Option<&str>;

    /// Returns a store bound to `namespace`, resolved relative to this
    /// store's own namespace. An empty name yields a store bound to the same
    /// namespace as `self`.
    fn for_namespace(&self, namespace: &str) -> Self
    where
        Self: Sized;

    /// Lists the immediate children of `path` within `mount`. Folder names
    /// carry a trailing `/`.
    async fn list_secrets(&self, mount: &Mount, path: &str) -> Result<ListResponse, StoreError>;

    /// Reads the raw response body for the secret at `path`, using the read
    /// endpoint that matches the mount's kv version.
    async fn read_secret(
        &self,
        mount: &Mount,
        path: &str,
    ) -> Result<serde_json::Value, StoreError>;

    async fn list_mounted_engines(&self) -> Result<MountsResponse, StoreError>;

    async fn list_namespaces(&self) -> Result<ListResponse, StoreError>;
}
