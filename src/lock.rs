//! Single-run guard for the shared history file.
//!
//! Two runs against the same history would both read, both post, and the last
//! writer would drop the other's entries. The lock file is created exclusively at
//! startup and removed on drop. It records the pid and start time; a lock older
//! than the configured maximum age is taken over (left behind by a killed run).

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: impl AsRef<Path>, max_age: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating lock dir {}", dir.display()))?;
        }
        match Self::create(&path) {
            Ok(lock) => return Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(e).with_context(|| format!("creating lock {}", path.display()))
            }
        }

        let holder = fs::read_to_string(&path).unwrap_or_default();
        match lock_age(&path, &holder) {
            Some(age) if age > max_age => {
                warn!(
                    path = %path.display(),
                    holder = %holder.trim(),
                    age_mins = age.num_minutes(),
                    "stale run lock taken over"
                );
                fs::remove_file(&path)
                    .with_context(|| format!("removing stale lock {}", path.display()))?;
                Self::create(&path).with_context(|| format!("creating lock {}", path.display()))
            }
            _ => Err(anyhow!(
                "another run holds {} ({}); delete the file if no run is active",
                path.display(),
                holder.trim()
            )),
        }
    }

    fn create(path: &Path) -> io::Result<Self> {
        let mut f = OpenOptions::new().write(true).create_new(true).open(path)?;
        if let Err(e) = writeln!(
            f,
            "pid={} started={}",
            std::process::id(),
            Utc::now().to_rfc3339()
        ) {
            warn!(path = %path.display(), "lock content not written: {e:#}");
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// From the `started=` stamp, else from the file's mtime.
fn lock_age(path: &Path, holder: &str) -> Option<Duration> {
    let started = holder
        .split_whitespace()
        .find_map(|t| t.strip_prefix("started="))
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .or_else(|| {
            fs::metadata(path)
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from)
        })?;
    Some(Utc::now() - started)
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "lock release: {e:#}");
        }
    }
}
