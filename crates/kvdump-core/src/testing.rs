use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::store::{
    KvVersion, ListResponse, Mount, MountEntry, MountsResponse, SecretStore, StoreError,
};

#[derive(Clone, Default)]
struct FakeTree {
    namespaces: Option<Vec<String>>,
    mounts: BTreeMap<String, BTreeMap<String, MountEntry>>,
    secrets: BTreeMap<(String, String), BTreeMap<String, serde_json::Value>>,
    vanished_listings: BTreeSet<String>,
    vanished_reads: BTreeSet<String>,
    denied_reads: BTreeSet<String>,
}

/// In-memory store keyed by namespace, mount and secret path.
#[derive(Clone, Default)]
pub(crate) struct FakeStore {
    namespace: String,
    tree: Arc<FakeTree>,
    visits: Arc<Mutex<Vec<String>>>,
}

impl FakeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_namespaces(mut self, names: &[&str]) -> Self {
        Arc::make_mut(&mut self.tree).namespaces =
            Some(names.iter().map(|name| name.to_string()).collect());
        self
    }

    pub(crate) fn with_engine(
        mut self,
        namespace: &str,
        path: &str,
        entry: serde_json::Value,
    ) -> Self {
        let entry: MountEntry = serde_json::from_value(entry).expect("mount entry");
        Arc::make_mut(&mut self.tree)
            .mounts
            .entry(namespace.to_string())
            .or_default()
            .insert(path.to_string(), entry);
        self
    }

    pub(crate) fn with_kv_mount(self, namespace: &str, name: &str, version: &str) -> Self {
        self.with_engine(
            namespace,
            &format!("{name}/"),
            json!({"type": "kv", "options": {"version": version}}),
        )
    }

    pub(crate) fn with_secret(
        mut self,
        namespace: &str,
        mount: &str,
        path: &str,
        secret: serde_json::Value,
    ) -> Self {
        Arc::make_mut(&mut self.tree)
            .secrets
            .entry((namespace.to_string(), mount.to_string()))
            .or_default()
            .insert(path.to_string(), secret);
        self
    }

    pub(crate) fn vanish_listing(mut self, path: &str) -> Self {
        Arc::make_mut(&mut self.tree)
            .vanished_listings
            .insert(path.to_string());
        self
    }

    pub(crate) fn vanish_read(mut self, path: &str) -> Self {
        Arc::make_mut(&mut self.tree)
            .vanished_reads
            .insert(path.to_string());
        self
    }

    pub(crate) fn deny_read(mut self, path: &str) -> Self {
        Arc::make_mut(&mut self.tree)
            .denied_reads
            .insert(path.to_string());
        self
    }

    /// Namespaces whose mounts were enumerated, in call order.
    pub(crate) fn visits(&self) -> Vec<String> {
        self.visits.lock().expect("visits lock").clone()
    }

    fn secrets_in(&self, mount: &Mount) -> Option<&BTreeMap<String, serde_json::Value>> {
        self.tree
            .secrets
            .get(&(self.namespace.clone(), mount.name.clone()))
    }
}

#[async_trait]
impl SecretStore for FakeStore {
    fn namespace(&self) -> Option<&str> {
        if self.namespace.is_empty() {
            None
        } else {
            Some(&self.namespace)
        }
    }

    fn for_namespace(&self, namespace: &str) -> Self {
        let namespace = match (self.namespace.as_str(), namespace) {
            (base, "") => base.to_string(),
            ("", child) => child.to_string(),
            (base, child) => format!("{base}/{child}"),
        };
        Self {
            namespace,
            tree: self.tree.clone(),
            visits: self.visits.clone(),
        }
    }

    async fn list_secrets(&self, mount: &Mount, path: &str) -> Result<ListResponse, StoreError> {
        if self.tree.vanished_listings.contains(path) {
            return Err(StoreError::invalid_path(path));
        }
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut keys = BTreeSet::new();
        for leaf in self.secrets_in(mount).into_iter().flat_map(|map| map.keys()) {
            let Some(rest) = leaf.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((folder, _)) => keys.insert(format!("{folder}/")),
                None => keys.insert(rest.to_string()),
            };
        }
        if keys.is_empty() {
            return Err(StoreError::invalid_path(path));
        }
        Ok(ListResponse::from_keys(keys))
    }

    async fn read_secret(
        &self,
        mount: &Mount,
        path: &str,
    ) -> Result<serde_json::Value, StoreError> {
        if self.tree.vanished_reads.contains(path) {
            return Err(StoreError::invalid_path(path));
        }
        if self.tree.denied_reads.contains(path) {
            return Err(StoreError::Forbidden {
                message: "1 error occurred: permission denied".to_string(),
            });
        }
        let secret = self
            .secrets_in(mount)
            .and_then(|map| map.get(path))
            .cloned()
            .ok_or_else(|| StoreError::invalid_path(path))?;
        Ok(match mount.version {
            KvVersion::V1 => json!({"data": secret, "lease_duration": 2764800}),
            KvVersion::V2 => json!({
                "data": {
                    "data": secret,
                    "metadata": {"version": 1, "deletion_time": "", "destroyed": false}
                }
            }),
        })
    }

    async fn list_mounted_engines(&self) -> Result<MountsResponse, StoreError> {
        self.visits
            .lock()
            .expect("visits lock")
            .push(self.namespace.clone());
        Ok(MountsResponse {
            data: self
                .tree
                .mounts
                .get(&self.namespace)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn list_namespaces(&self) -> Result<ListResponse, StoreError> {
        match &self.tree.namespaces {
            Some(names) => Ok(ListResponse::from_keys(
                names.iter().map(|name| format!("{name}/")),
            )),
            None => Err(StoreError::invalid_path("sys/namespaces")),
        }
    }
}
