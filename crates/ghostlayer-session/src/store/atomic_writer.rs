//! Crash-safe replacement of the rule store file

use ghostlayer_core::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `data` next to `path` and rename it into place
///
/// Readers see either the previous document or the new one, never a torn
/// write. Missing parent directories are created.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let staging = Staging::new(path);
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&staging.path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&staging.path, path)?;
    staging.disarm();
    Ok(())
}

/// Staging file that is removed unless the rename went through
struct Staging {
    path: PathBuf,
    armed: bool,
}

impl Staging {
    fn new(target: &Path) -> Self {
        let mut name = target.as_os_str().to_owned();
        name.push(".tmp");
        Self {
            path: PathBuf::from(name),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}
