//! Windows platform implementation
//!
//! Lock file only; there is no portable process probe and no systemd.

use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

use crate::errors::{Result, ServiceError};

use super::PlatformOps;

/// Windows platform operations implementation
pub struct WindowsPlatform;

impl PlatformOps for WindowsPlatform {
    fn acquire_pid_file(path: &Path) -> Result<()> {
        if path.exists() {
            warn!("Lock file {} exists, assuming stale", path.display());
            let _ = fs::remove_file(path);
        }

        fs::write(path, std::process::id().to_string()).map_err(|e| {
            error!("Failed to create lock file: {}", e);
            ServiceError::file_operation(format!(
                "Failed to create lock file {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn release_pid_file(path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            error!("Failed to delete lock file: {}", e);
        } else {
            info!("Lock file cleaned: {}", path.display());
        }
    }

    fn notify_service_manager(_state: &str) -> Result<bool> {
        Ok(false)
    }
}

pub fn acquire_pid_file(path: &Path) -> Result<()> {
    WindowsPlatform::acquire_pid_file(path)
}

pub fn release_pid_file(path: &Path) {
    WindowsPlatform::release_pid_file(path)
}

pub fn notify_service_manager(state: &str) -> Result<bool> {
    WindowsPlatform::notify_service_manager(state)
}
