//! Directory listing helpers

use std::io;
use std::path::{Path, PathBuf};

/// Regular files directly inside `dir` whose extension is exactly `extension`
///
/// Sorted by file name. Hidden files are ignored, matching shell globbing
/// (`*.sql` never matches `.sql`). A missing directory yields an empty list.
pub fn files_with_extension(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(true, |name| name.starts_with('.'));
        if hidden || !path.is_file() {
            continue;
        }

        if path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
