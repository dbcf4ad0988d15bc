//! Filesystem utilities

use std::fs;
use std::path::Path;

/// Create a directory and all parent directories if they don't exist
///
/// Returns `true` when the directory was created by this call.
pub fn create_dir_all(path: &str) -> std::io::Result<bool> {
    let path = Path::new(path);
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)?;
    Ok(true)
}

/// Check if a path exists
pub fn path_exists(path: &str) -> bool {
    Path::new(path).exists()
}
