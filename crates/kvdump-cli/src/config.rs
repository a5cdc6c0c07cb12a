use std::fs;
use std::path::{Path, PathBuf};

use kvdump_core::{ExportOptions, JsonStyle};

use crate::cli_args::Cli;

pub(crate) const DEFAULT_ADDR: &str = "https://127.0.0.1:8200";
const TOKEN_FILE_NAME: &str = ".vault-token";

pub(crate) struct Settings {
    pub addr: String,
    pub token: String,
    pub namespace: Option<String>,
    pub destination: PathBuf,
    pub insecure: bool,
    pub options: ExportOptions,
}

pub(crate) fn resolve_settings(cli: Cli) -> anyhow::Result<Settings> {
    let addr = cli.addr.unwrap_or_else(|| DEFAULT_ADDR.to_string());
    ensure_secure_addr(&addr, cli.insecure)?;
    let token = resolve_token(cli.token, cli.token_file.as_deref(), default_token_path())?;
    let style = if cli.pretty {
        JsonStyle::Pretty
    } else {
        JsonStyle::Inline
    };
    Ok(Settings {
        addr,
        token,
        namespace: cli.namespace.filter(|name| !name.trim().is_empty()),
        destination: cli.out,
        insecure: cli.insecure,
        options: ExportOptions {
            style,
            atomic: !cli.no_atomic,
            skip_unchanged: cli.skip_unchanged,
            include_namespaces: !cli.root_only,
        },
    })
}

/// Token from the flag, then the given token file, then the default token
/// file if it exists.
pub(crate) fn resolve_token(
    token: Option<String>,
    token_file: Option<&Path>,
    default_file: Option<PathBuf>,
) -> anyhow::Result<String> {
    if token.is_some() && token_file.is_some() {
        anyhow::bail!("use --token or --token-file, not both");
    }
    if let Some(token) = token {
        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("token is empty");
        }
        return Ok(token.to_string());
    }
    if let Some(path) = token_file {
        return read_token_file(path);
    }
    match default_file {
        Some(path) if path.is_file() => read_token_file(&path),
        _ => anyhow::bail!("no token: set VAULT_TOKEN, --token or --token-file"),
    }
}

fn read_token_file(path: &Path) -> anyhow::Result<String> {
    let contents = fs::read_to_string(path)?;
    let token = contents.trim();
    if token.is_empty() {
        anyhow::bail!("token file is empty: {}", path.display());
    }
    Ok(token.to_string())
}

fn default_token_path() -> Option<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()?;
    Some(Path::new(&home).join(TOKEN_FILE_NAME))
}

pub(crate) fn ensure_secure_addr(addr: &str, allow_insecure: bool) -> anyhow::Result<()> {
    if addr.starts_with("http://") && !allow_insecure {
        anyhow::bail!("refusing to use http:// without --insecure");
    }
    Ok(())
}
