use std::fs;
use std::io;
use std::path::Path;

/// Copies `src` to `dst` unless `dst` already exists. Returns whether a copy
/// happened. Existing destinations are left untouched, never overwritten.
pub fn copy_file_if_absent(src: &Path, dst: &Path) -> io::Result<bool> {
    if dst.exists() {
        return Ok(false);
    }
    fs::copy(src, dst)?;
    Ok(true)
}
