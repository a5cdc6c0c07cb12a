use tracing::{debug, info};

use crate::error::{ExportError, Result};
use crate::store::{Mount, SecretStore, StoreError};

/// Recursively lists every leaf secret under `path` in `mount`, sorted.
///
/// A missing root means the mount holds no secrets yet; a missing folder
/// anywhere below it is reported as [`ExportError::VanishedPath`].
pub async fn list_paths<S>(store: &S, path: &str, mount: &Mount) -> Result<Vec<String>>
where
    S: SecretStore + ?Sized,
{
    let mut output = Vec::new();
    let mut pending = vec![path.to_string()];
    while let Some(current) = pending.pop() {
        debug!(
            namespace = store.namespace().unwrap_or(""),
            mount = %mount.name,
            version = %mount.version,
            path = %current,
            "listing secrets"
        );
        let listing = match store.list_secrets(mount, &current).await {
            Ok(listing) => listing,
            Err(StoreError::InvalidPath { .. }) if current.is_empty() => {
                info!(mount = %mount.name, "no secrets found");
                continue;
            }
            Err(StoreError::InvalidPath { .. }) => {
                return Err(ExportError::VanishedPath {
                    mount: mount.name.clone(),
                    path: current,
                });
            }
            Err(err) => return Err(err.into()),
        };
        for key in listing.data.keys {
            let joined = join_path(&current, &key);
            match joined.strip_suffix('/') {
                Some(folder) => pending.push(folder.to_string()),
                None => output.push(joined),
            }
        }
    }
    output.sort();
    Ok(output)
}

fn join_path(path: &str, key: &str) -> String {
    let joined = format!("{path}/{key}");
    match joined.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::{join_path, list_paths};
    use crate::error::ExportError;
    use crate::store::{KvVersion, Mount, StoreError};
    use crate::testing::FakeStore;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn mount() -> Mount {
        Mount::new("secret", KvVersion::V1)
    }

    #[test]
    fn join_path_drops_leading_separator_at_root() {
        assert_eq!(join_path("", "a/"), "a/");
        assert_eq!(join_path("a", "x"), "a/x");
        assert_eq!(join_path("a/b", "c/"), "a/b/c/");
    }

    #[tokio::test]
    async fn empty_mount_lists_nothing() {
        let store = FakeStore::new();
        let paths = list_paths(&store, "", &mount()).await.expect("list");
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn folders_are_expanded_into_leaves() {
        let store = FakeStore::new()
            .with_secret("", "secret", "b", json!({"k": "v"}))
            .with_secret("", "secret", "a/x", json!({"k": "v"}));
        let paths = list_paths(&store, "", &mount()).await.expect("list");
        assert_eq!(paths, vec!["a/x".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn leaf_and_folder_may_share_a_name() {
        let store = FakeStore::new()
            .with_secret("", "secret", "app", json!({"k": "v"}))
            .with_secret("", "secret", "app/db", json!({"k": "v"}))
            .with_secret("", "secret", "app/cache/redis", json!({"k": "v"}));
        let paths = list_paths(&store, "", &mount()).await.expect("list");
        assert_eq!(paths, vec!["app", "app/cache/redis", "app/db"]);
    }

    #[tokio::test]
    async fn vanished_folder_is_an_error() {
        let store = FakeStore::new()
            .with_secret("", "secret", "a/x", json!({"k": "v"}))
            .vanish_listing("a");
        let err = list_paths(&store, "", &mount()).await.unwrap_err();
        match err {
            ExportError::VanishedPath { mount, path } => {
                assert_eq!(mount, "secret");
                assert_eq!(path, "a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_subpath_start_is_an_error() {
        let store = FakeStore::new().with_secret("", "secret", "a/x", json!({"k": "v"}));
        let err = list_paths(&store, "nope", &mount()).await.unwrap_err();
        assert!(matches!(err, ExportError::VanishedPath { .. }));
    }

    #[tokio::test]
    async fn other_store_errors_propagate() {
        struct Denied;

        #[async_trait::async_trait]
        impl crate::store::SecretStore for Denied {
            fn namespace(&self) -> Option<&str> {
                None
            }

            fn for_namespace(&self, _namespace: &str) -> Self {
                Denied
            }

            async fn list_secrets(
                &self,
                _mount: &Mount,
                _path: &str,
            ) -> Result<crate::store::ListResponse, StoreError> {
                Err(StoreError::Forbidden {
                    message: "permission denied".to_string(),
                })
            }

            async fn read_secret(
                &self,
                _mount: &Mount,
                path: &str,
            ) -> Result<serde_json::Value, StoreError> {
                Err(StoreError::invalid_path(path))
            }

            async fn list_mounted_engines(
                &self,
            ) -> Result<crate::store::MountsResponse, StoreError> {
                Ok(Default::default())
            }

            async fn list_namespaces(&self) -> Result<crate::store::ListResponse, StoreError> {
                Err(StoreError::invalid_path("sys/namespaces"))
            }
        }

        let err = list_paths(&Denied, "", &mount()).await.unwrap_err();
        assert!(matches!(err, ExportError::Store(StoreError::Forbidden { .. })));
    }

    fn leaf_paths() -> impl Strategy<Value = BTreeSet<String>> {
        let segment = "[a-z]{1,3}";
        let path = prop::collection::vec(segment, 1..4).prop_map(|parts| parts.join("/"));
        prop::collection::btree_set(path, 0..24)
    }

    proptest! {
        #[test]
        fn listing_returns_sorted_leaf_set(leaves in leaf_paths()) {
            let store = leaves.iter().fold(FakeStore::new(), |store, leaf| {
                store.with_secret("", "secret", leaf, json!({"k": "v"}))
            });
            let runtime = tokio::runtime::Runtime::new().expect("runtime");
            let paths = runtime
                .block_on(list_paths(&store, "", &mount()))
                .expect("list");
            let expected: Vec<String> = leaves.into_iter().collect();
            prop_assert_eq!(paths, expected);
        }
    }
}
