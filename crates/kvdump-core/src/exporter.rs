use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ExportError, Result};
use crate::lister::list_paths;
use crate::mounts::{list_kv_mounts, list_namespaces};
use crate::output::{
    create_private_dir_all, normalize_relative, render_secret, secret_target, write_secret_file,
    JsonStyle, WriteOutcome,
};
use crate::reader::read_secret;
use crate::store::SecretStore;

/// Directory name used for the root namespace.
pub const ROOT_NAMESPACE_DIR: &str = "<root>";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub style: JsonStyle,
    /// Write through a temporary file and rename it over the target.
    pub atomic: bool,
    /// Leave files whose contents already match untouched.
    pub skip_unchanged: bool,
    /// Descend into the child namespaces of the starting namespace.
    pub include_namespaces: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            style: JsonStyle::Inline,
            atomic: true,
            skip_unchanged: false,
            include_namespaces: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub namespaces: usize,
    pub mounts: usize,
    pub written: usize,
    pub unchanged: usize,
    /// Secrets that were listed but absent or empty when read.
    pub skipped: usize,
}

impl AddAssign for ExportStats {
    fn add_assign(&mut self, other: Self) {
        self.namespaces += other.namespaces;
        self.mounts += other.mounts;
        self.written += other.written;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
    }
}

/// Exports every kv mount visible through `store` into
/// `<destination>/<namespace>/<mount>/<path>.json`.
pub async fn export_secrets<S>(
    store: &S,
    namespace: &str,
    destination: &Path,
    options: &ExportOptions,
) -> Result<ExportStats>
where
    S: SecretStore + ?Sized,
{
    let namespace_dir = destination.join(namespace_dir(namespace)?);
    create_private_dir_all(&namespace_dir)?;
    let mut stats = ExportStats {
        namespaces: 1,
        ..ExportStats::default()
    };

    for mount in list_kv_mounts(store).await? {
        info!(mount = %mount.name, version = %mount.version, "found kv mount");
        stats.mounts += 1;
        let base_dir = namespace_dir.join(normalize_relative(&mount.name)?);
        let paths = list_paths(store, "", &mount).await?;
        let targets = plan_targets(&base_dir, &paths)?;
        for (path, target) in paths.into_iter().zip(targets) {
            let secret = match read_secret(store, &path, &mount).await? {
                Some(secret) if !secret.is_empty() => secret,
                _ => {
                    debug!(mount = %mount.name, path = %path, "skipping empty secret");
                    stats.skipped += 1;
                    continue;
                }
            };
            if let Some(parent) = target.parent() {
                create_private_dir_all(parent)?;
            }
            let contents = render_secret(&secret, options.style)?;
            match write_secret_file(&target, &contents, options.atomic, options.skip_unchanged)? {
                WriteOutcome::Written => {
                    stats.written += 1;
                    info!(target = %target.display(), "wrote secret");
                }
                WriteOutcome::Unchanged => {
                    stats.unchanged += 1;
                    debug!(target = %target.display(), "secret unchanged");
                }
            }
        }
    }
    Ok(stats)
}

/// Exports the store's own namespace first, then each child namespace in
/// sorted order. The first fatal error aborts the remaining export.
pub async fn export_all<S>(
    store: &S,
    destination: &Path,
    options: &ExportOptions,
) -> Result<ExportStats>
where
    S: SecretStore,
{
    let mut namespaces = vec![String::new()];
    if options.include_namespaces {
        namespaces.extend(list_namespaces(store).await?);
    }
    let mut stats = ExportStats::default();
    for namespace in namespaces {
        info!(namespace = %namespace, "entering namespace");
        let scoped = store.for_namespace(&namespace);
        stats += export_secrets(&scoped, &namespace, destination, options).await?;
    }
    Ok(stats)
}

/// Maps every secret path of a mount onto its output file, failing when one
/// secret's file would sit where another secret needs a directory
/// (`app` -> `app.json` next to `app.json/x`).
fn plan_targets(base_dir: &Path, paths: &[String]) -> Result<Vec<PathBuf>> {
    let mut owners: BTreeMap<PathBuf, &str> = BTreeMap::new();
    let mut targets = Vec::with_capacity(paths.len());
    for path in paths {
        let target = secret_target(base_dir, path)?;
        owners.insert(target.clone(), path);
        targets.push(target);
    }
    for (target, path) in targets.iter().zip(paths) {
        for ancestor in target.ancestors().skip(1) {
            if ancestor == base_dir {
                break;
            }
            if let Some(owner) = owners.get(ancestor) {
                return Err(ExportError::OutputCollision {
                    path: ancestor.to_path_buf(),
                    file: owner.to_string(),
                    folder: path.clone(),
                });
            }
        }
    }
    Ok(targets)
}

fn namespace_dir(namespace: &str) -> Result<PathBuf> {
    if namespace.is_empty() {
        return Ok(PathBuf::from(ROOT_NAMESPACE_DIR));
    }
    normalize_relative(namespace)
}
