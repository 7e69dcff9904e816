//! Platform abstraction layer
//!
//! Unix gets real PID probing and systemd readiness notification; Windows
//! gets a plain lock file and treats service-manager notification as a no-op.

use std::path::Path;

use crate::errors::Result;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::*;
#[cfg(windows)]
pub use windows::*;

/// Platform operations trait
pub trait PlatformOps {
    /// Claim the PID file, refusing to start when a live process owns it.
    fn acquire_pid_file(path: &Path) -> Result<()>;

    /// Remove the PID file on shutdown
    fn release_pid_file(path: &Path);

    /// Send a state string (`READY=1`, `STOPPING=1`) to the service manager.
    ///
    /// Returns `Ok(false)` when no service manager is listening.
    fn notify_service_manager(state: &str) -> Result<bool>;
}

/// Get the platform name for logging/debugging
pub fn platform_name() -> &'static str {
    #[cfg(unix)]
    return "Unix/Linux";
    #[cfg(windows)]
    return "Windows";
}

/// Owns the PID file for the lifetime of the worker
#[derive(Debug)]
pub struct PidFileGuard {
    path: std::path::PathBuf,
}

impl PidFileGuard {
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        acquire_pid_file(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFileGuard {
    fn drop(&mut self) {
        release_pid_file(&self.path);
    }
}
