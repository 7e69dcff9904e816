//! Unix/Linux platform implementation
//!
//! - PID file management with process liveness checking
//! - systemd notification over `$NOTIFY_SOCKET`

use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, ServiceError};

use super::PlatformOps;

/// Unix platform operations implementation
pub struct UnixPlatform;

impl PlatformOps for UnixPlatform {
    fn acquire_pid_file(path: &Path) -> Result<()> {
        use nix::sys::signal;
        use nix::unistd::Pid;
        use std::process;

        if path.exists() {
            match fs::read_to_string(path) {
                Ok(old_pid_str) => {
                    if let Ok(old_pid) = old_pid_str.trim().parse::<u32>() {
                        let current_pid = process::id();

                        // Docker container restart: both PIDs are 1
                        if current_pid == 1 && old_pid == 1 {
                            info!("Container restart detected, removing old PID file");
                            let _ = fs::remove_file(path);
                        } else if old_pid != current_pid
                            && signal::kill(Pid::from_raw(old_pid as i32), None).is_ok()
                        {
                            error!("Worker already running (PID: {})", old_pid);
                            return Err(ServiceError::file_operation(format!(
                                "PID file {} is held by running process {}",
                                path.display(),
                                old_pid
                            )));
                        } else {
                            info!("Stale PID file detected, cleaning up...");
                            let _ = fs::remove_file(path);
                        }
                    } else {
                        warn!("Corrupted PID file {}, removing", path.display());
                        let _ = fs::remove_file(path);
                    }
                }
                Err(_) => {
                    let _ = fs::remove_file(path);
                }
            }
        }

        let pid = process::id();
        fs::write(path, pid.to_string()).map_err(|e| {
            error!("Failed to write PID file: {}", e);
            ServiceError::file_operation(format!(
                "Failed to write PID file {}: {}",
                path.display(),
                e
            ))
        })?;
        debug!("Worker PID: {}", pid);

        Ok(())
    }

    fn release_pid_file(path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            error!("Failed to delete PID file: {}", e);
        } else {
            info!("PID file cleaned: {}", path.display());
        }
    }

    fn notify_service_manager(state: &str) -> Result<bool> {
        let Some(socket_path) = std::env::var_os("NOTIFY_SOCKET") else {
            return Ok(false);
        };
        send_notify(&socket_path, state)?;
        debug!("Service manager notified: {}", state);
        Ok(true)
    }
}

/// Write one notification datagram to `socket_path` (`@name` = abstract socket)
fn send_notify(socket_path: &std::ffi::OsStr, state: &str) -> Result<()> {
    use std::os::unix::net::UnixDatagram;

    let socket = UnixDatagram::unbound().map_err(|e| {
        ServiceError::signal_operation(format!("Failed to create notify socket: {}", e))
    })?;

    let bytes = socket_path.as_encoded_bytes();
    let sent = if let Some(abstract_name) = bytes.strip_prefix(b"@") {
        send_abstract(&socket, abstract_name, state)
    } else {
        socket.send_to(state.as_bytes(), Path::new(socket_path))
    };

    sent.map(|_| ()).map_err(|e| {
        ServiceError::signal_operation(format!("Failed to notify service manager: {}", e))
    })
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn send_abstract(
    socket: &std::os::unix::net::UnixDatagram,
    name: &[u8],
    state: &str,
) -> std::io::Result<usize> {
    #[cfg(target_os = "android")]
    use std::os::android::net::SocketAddrExt;
    #[cfg(target_os = "linux")]
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::SocketAddr;

    let addr = SocketAddr::from_abstract_name(name)?;
    socket.send_to_addr(state.as_bytes(), &addr)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn send_abstract(
    _socket: &std::os::unix::net::UnixDatagram,
    _name: &[u8],
    _state: &str,
) -> std::io::Result<usize> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "abstract notify sockets are Linux-only",
    ))
}

/// Claim the PID file
pub fn acquire_pid_file(path: &Path) -> Result<()> {
    UnixPlatform::acquire_pid_file(path)
}

/// Remove the PID file
pub fn release_pid_file(path: &Path) {
    UnixPlatform::release_pid_file(path)
}

/// Notify systemd (no-op when `NOTIFY_SOCKET` is unset)
pub fn notify_service_manager(state: &str) -> Result<bool> {
    UnixPlatform::notify_service_manager(state)
}
