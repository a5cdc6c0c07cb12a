use tracing::debug;

use crate::error::{ExportError, Result};
use crate::store::{KvVersion, Mount, SecretStore, StoreError};

const KV_ENGINE: &str = "kv";

/// Lists the kv engines mounted in the store's namespace, sorted by name.
pub async fn list_kv_mounts<S>(store: &S) -> Result<Vec<Mount>>
where
    S: SecretStore + ?Sized,
{
    let response = store.list_mounted_engines().await?;
    let mut mounts = Vec::new();
    for (path, entry) in response.data {
        if entry.engine_type != KV_ENGINE {
            continue;
        }
        let name = strip_separator(path);
        let raw_version = entry.version_option().unwrap_or_default();
        let version =
            KvVersion::parse(&raw_version).ok_or_else(|| ExportError::UnsupportedKvVersion {
                mount: name.clone(),
                version: raw_version.clone(),
            })?;
        mounts.push(Mount { name, version });
    }
    mounts.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(mounts)
}

/// Lists the child namespaces of the store's namespace, sorted.
///
/// Stores without namespace support answer with "no such path", which is
/// reported as an empty list.
pub async fn list_namespaces<S>(store: &S) -> Result<Vec<String>>
where
    S: SecretStore + ?Sized,
{
    let response = match store.list_namespaces().await {
        Ok(response) => response,
        Err(StoreError::InvalidPath { .. }) => {
            debug!("namespaces not supported; exporting root only");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err.into()),
    };
    let mut names: Vec<String> = response
        .data
        .keys
        .into_iter()
        .map(strip_separator)
        .collect();
    names.sort();
    Ok(names)
}

fn strip_separator(name: String) -> String {
    match name.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}
