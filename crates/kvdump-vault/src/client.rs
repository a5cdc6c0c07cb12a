use std::fmt;

use async_trait::async_trait;
use kvdump_core::{KvVersion, ListResponse, Mount, MountsResponse, SecretStore, StoreError};

use crate::http::{encode_path, send_json};

pub const TOKEN_HEADER: &str = "X-Vault-Token";
pub const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Vault API client bound to one namespace.
#[derive(Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    addr: String,
    token: String,
    namespace: Option<String>,
}

impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("addr", &self.addr)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    pub fn new(http: reqwest::Client, addr: &str, token: impl Into<String>) -> Self {
        Self {
            http,
            addr: addr.trim_end_matches('/').to_string(),
            token: token.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: Option<&str>) -> Self {
        self.namespace = namespace
            .map(|name| name.trim_matches('/'))
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn url(&self, api_path: &str) -> String {
        format!("{}/v1/{}", self.addr, api_path)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.get(url).header(TOKEN_HEADER, &self.token);
        match &self.namespace {
            Some(namespace) => builder.header(NAMESPACE_HEADER, namespace),
            None => builder,
        }
    }

    fn kv_path(mount: &Mount, kv2_segment: &str, path: &str) -> String {
        match mount.version {
            KvVersion::V1 => format!("{}/{}", encode_path(&mount.name), encode_path(path)),
            KvVersion::V2 => format!(
                "{}/{}/{}",
                encode_path(&mount.name),
                kv2_segment,
                encode_path(path)
            ),
        }
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn for_namespace(&self, namespace: &str) -> Self {
        let child = namespace.trim_matches('/');
        let namespace = match (self.namespace.as_deref(), child) {
            (base, "") => base.map(str::to_string),
            (None, child) => Some(child.to_string()),
            (Some(base), child) => Some(format!("{base}/{child}")),
        };
        Self {
            namespace,
            ..self.clone()
        }
    }

    async fn list_secrets(&self, mount: &Mount, path: &str) -> Result<ListResponse, StoreError> {
        let url = format!("{}?list=true", self.url(&Self::kv_path(mount, "metadata", path)));
        send_json(self.get(&url), &url, path).await
    }

    async fn read_secret(
        &self,
        mount: &Mount,
        path: &str,
    ) -> Result<serde_json::Value, StoreError> {
        let url = self.url(&Self::kv_path(mount, "data", path));
        send_json(self.get(&url), &url, path).await
    }

    async fn list_mounted_engines(&self) -> Result<MountsResponse, StoreError> {
        let url = self.url("sys/mounts");
        send_json(self.get(&url), &url, "sys/mounts").await
    }

    async fn list_namespaces(&self) -> Result<ListResponse, StoreError> {
        let url = format!("{}?list=true", self.url("sys/namespaces"));
        send_json(self.get(&url), &url, "sys/namespaces").await
    }
}
