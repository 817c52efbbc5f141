// ABOUTME: Crash-safe whole-file replacement used for definition files and compiled programs.
// ABOUTME: Writes to a sibling .tmp file, fsyncs, then renames over the target.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Replace the contents of `path` atomically. Creates the parent directory
/// if it does not exist. Readers see either the old or the new contents,
/// never a partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = File::create(&tmp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;

    // Best-effort: the rename already happened, this only makes it durable.
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}
