use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

use crate::error::{ExportError, Result};
use crate::reader::Secret;

/// Mode for every directory the export creates.
pub const DIR_MODE: u32 = 0o750;

/// Mode for every secret file, matching the group access of [`DIR_MODE`].
pub const FILE_MODE: u32 = 0o640;

const SECRET_EXTENSION: &str = ".json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonStyle {
    /// Single line, `{"a": "1", "b": "2"}`.
    #[default]
    Inline,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

struct InlineFormatter;

impl Formatter for InlineFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }
}

pub fn render_secret(secret: &Secret, style: JsonStyle) -> Result<Vec<u8>> {
    match style {
        JsonStyle::Inline => {
            let mut buffer = Vec::new();
            let mut serializer = Serializer::with_formatter(&mut buffer, InlineFormatter);
            secret.serialize(&mut serializer)?;
            Ok(buffer)
        }
        JsonStyle::Pretty => Ok(serde_json::to_vec_pretty(secret)?),
    }
}

/// Turns a remote path into a relative local one, rejecting anything that
/// could escape the destination directory.
pub fn normalize_relative(path: &str) -> Result<PathBuf> {
    let unsafe_path = || ExportError::UnsafePath {
        path: path.to_string(),
    };
    if path.is_empty()
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(unsafe_path());
    }
    let rel = Path::new(path);
    for component in rel.components() {
        match component {
            Component::Normal(_) => {}
            _ => return Err(unsafe_path()),
        }
    }
    Ok(rel.to_path_buf())
}

/// `<base>/<path>.json` for the secret at `path`.
pub fn secret_target(base: &Path, path: &str) -> Result<PathBuf> {
    let rel = normalize_relative(path)?;
    let target = base.join(&rel);
    let mut file_name: OsString = target
        .file_name()
        .map(OsString::from)
        .ok_or_else(|| ExportError::UnsafePath {
            path: path.to_string(),
        })?;
    file_name.push(SECRET_EXTENSION);
    Ok(target.with_file_name(file_name))
}

pub fn create_private_dir_all(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
        .create(path)
        .map_err(|err| ExportError::io(path, err))
}

pub fn write_secret_file(
    path: &Path,
    contents: &[u8],
    atomic: bool,
    skip_unchanged: bool,
) -> Result<WriteOutcome> {
    if skip_unchanged && is_same_contents(path, contents)? {
        return Ok(WriteOutcome::Unchanged);
    }
    if atomic {
        write_atomic(path, contents)?;
    } else {
        write_private(path, contents)?;
    }
    Ok(WriteOutcome::Written)
}

fn is_same_contents(path: &Path, contents: &[u8]) -> Result<bool> {
    let existing = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(ExportError::io(path, err)),
    };
    Ok(existing == contents)
}

/// Writes `contents` and leaves the file at [`FILE_MODE`], including when it
/// already existed with a wider mode.
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    let mut file = options.open(path).map_err(|err| ExportError::io(path, err))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(FILE_MODE))
            .map_err(|err| ExportError::io(path, err))?;
    }
    file.write_all(contents)
        .map_err(|err| ExportError::io(path, err))
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let invalid = || ExportError::UnsafePath {
        path: path.display().to_string(),
    };
    let parent = path.parent().ok_or_else(invalid)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(invalid)?;
    let tmp_path = parent.join(format!("{}.tmp.{}", file_name, rand::random::<u64>()));
    write_private(&tmp_path, contents)?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(ExportError::io(path, err));
    }
    Ok(())
}
