use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::store::{KvVersion, Mount, SecretStore, StoreError};

/// Key-value payload of a single secret. Keys stay sorted so the serialized
/// form is stable across runs.
pub type Secret = BTreeMap<String, Value>;

/// Reads the secret at `path`, returning `None` when it no longer exists.
///
/// v1 mounts keep the payload under `data`; v2 mounts nest it one level
/// deeper under `data.data`. A v2 version that was destroyed reports a null
/// payload and is treated as absent too.
pub async fn read_secret<S>(store: &S, path: &str, mount: &Mount) -> Result<Option<Secret>>
where
    S: SecretStore + ?Sized,
{
    let mut body = match store.read_secret(mount, path).await {
        Ok(body) => body,
        Err(StoreError::InvalidPath { .. }) => {
            debug!(mount = %mount.name, path = %path, "secret vanished before read");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let pointer = match mount.version {
        KvVersion::V1 => "/data",
        KvVersion::V2 => "/data/data",
    };
    let malformed = |message: &str| ExportError::Malformed {
        mount: mount.name.clone(),
        path: path.to_string(),
        message: message.to_string(),
    };
    match body.pointer_mut(pointer).map(Value::take) {
        Some(Value::Object(map)) => Ok(Some(map.into_iter().collect())),
        Some(Value::Null) => {
            debug!(mount = %mount.name, path = %path, "secret version has no data");
            Ok(None)
        }
        Some(_) => Err(malformed("payload is not an object")),
        None => Err(malformed("payload missing")),
    }
}
