//! PID file management

use std::path::Path;

use anyhow::{bail, Context, Result};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::{getpid, Pid};
use tracing::{debug, warn};

/// Write the current process ID to `path`.
///
/// Refuses to overwrite a pidfile that names another live process. A stale
/// or unreadable pidfile is replaced.
pub fn write(path: &Path) -> Result<()> {
    if let Some(pid) = read(path) {
        if pid != getpid() && is_alive(pid) {
            bail!(
                "pid file {} found, ensure trapd is not running (pid {})",
                path.display(),
                pid
            );
        }
        warn!(?path, %pid, "replacing stale pid file");
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create pid file directory")?;
    }

    std::fs::write(path, getpid().to_string())
        .with_context(|| format!("failed to write pid file {}", path.display()))?;
    debug!(?path, "pid file written");
    Ok(())
}

/// Remove the pidfile at `path`, if present
pub fn remove(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(?path, "pid file removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove pid file {}", path.display())),
    }
}

/// Parse the PID stored at `path`
pub fn read(path: &Path) -> Option<Pid> {
    let contents = std::fs::read_to_string(path).ok()?;
    contents.trim().parse::<i32>().ok().filter(|pid| *pid > 0).map(Pid::from_raw)
}

fn is_alive(pid: Pid) -> bool {
    // EPERM means the process exists but belongs to someone else
    matches!(kill(pid, None), Ok(()) | Err(Errno::EPERM))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run").join("trapd.pid");

        write(&path).unwrap();
        assert_eq!(read(&path), Some(getpid()));

        remove(&path).unwrap();
        assert!(!path.exists());
        // Removing again is not an error
        remove(&path).unwrap();
    }

    #[test]
    fn test_refuses_live_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trapd.pid");
        std::fs::write(&path, "1").unwrap();

        let err = write(&path).unwrap_err();
        assert!(err.to_string().contains("not running"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1");
    }

    #[test]
    fn test_replaces_stale_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trapd.pid");
        // Above any possible pid_max
        std::fs::write(&path, "999999999").unwrap();

        write(&path).unwrap();
        assert_eq!(read(&path), Some(getpid()));
    }

    #[test]
    fn test_replaces_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trapd.pid");
        std::fs::write(&path, "not a pid\n").unwrap();

        assert_eq!(read(&path), None);
        write(&path).unwrap();
        assert_eq!(read(&path), Some(getpid()));
    }
}
