//! Installation of the daemon as a system service.

#[cfg(target_os = "linux")]
pub mod systemd;

use std::io;

use thiserror::Error as ThisError;

/// Returns `true` if the current process is running as superuser (root).
#[cfg(unix)]
#[must_use]
pub fn is_superuser() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Failure while installing or starting the service.
#[derive(Debug, ThisError)]
pub enum ServiceInstallError {
    #[error("You must run this command as root or with sudo.")]
    NotSuperuser,
    #[error("{action}: {source}")]
    Io {
        action: String,
        #[source]
        source: io::Error,
    },
    #[error("`systemctl {args}` failed: {stderr}")]
    Systemctl { args: String, stderr: String },
}

pub(crate) trait IoContext<T> {
    fn io_context(self, action: impl FnOnce() -> String) -> Result<T, ServiceInstallError>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context(self, action: impl FnOnce() -> String) -> Result<T, ServiceInstallError> {
        self.map_err(|source| ServiceInstallError::Io {
            action: action(),
            source,
        })
    }
}
