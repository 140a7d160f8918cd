//! Atomic I/O operations

use std::fs::{self, File, OpenOptions};
use std::io::{self as stdio, Read, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Temp path used while a write to `path` is in flight.
///
/// Lives in the same directory as the target so the final rename never
/// crosses filesystems.
fn temp_path_for(path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    write_atomic_from(path, &mut stdio::Cursor::new(content)).map(|_| ())
}

/// Stream `reader` into `path` atomically, returning the number of bytes written.
///
/// The target only appears once the whole stream has been written and
/// flushed. On failure the temp file is removed and the target is untouched.
pub fn write_atomic_from(path: &Path, reader: &mut dyn Read) -> Result<u64> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let result: Result<u64> = (|| {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;

        let written = stdio::copy(reader, &mut temp_file).map_err(|e| Error::io(&temp_path, e))?;
        temp_file.flush().map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
        Ok(written)
    })();

    match result {
        Ok(written) => {
            fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
            Ok(written)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                tracing::debug!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "Failed to remove temp file after aborted write"
                );
            }
            Err(e)
        }
    }
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Open a file for reading, mapping the error to include the path.
pub fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::io(path, e))
}
