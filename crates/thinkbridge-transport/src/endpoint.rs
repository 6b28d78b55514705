//! Backend socket location.
//!
//! The Think application listens on `<home>/.think/native.sock`. Which home
//! directory that is comes from a [`HomeDir`] capability handed in by the
//! caller, so tests can fabricate one instead of reading process state.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TransportError};

/// Directory under the user's home that holds the application's runtime files.
pub const APP_DIR: &str = ".think";

/// File name of the backend's listening socket inside [`APP_DIR`].
pub const SOCKET_NAME: &str = "native.sock";

/// The Think app's pipe on Windows, where no home-relative socket exists.
pub const PIPE_NAME: &str = r"\\.\pipe\think-native";

/// Source of the current user's home directory.
pub trait HomeDir {
    /// The home directory, or `None` when it cannot be determined.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Home directory of the account running this process.
///
/// `HOME` wins when set and non-empty; otherwise the account database entry
/// for the real uid is consulted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountHome;

impl HomeDir for AccountHome {
    fn home_dir(&self) -> Option<PathBuf> {
        home_from(std::env::var_os("HOME"), from_account_database)
    }
}

/// A fixed, caller-chosen home directory.
#[derive(Debug, Clone)]
pub struct FixedHome(pub PathBuf);

impl HomeDir for FixedHome {
    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

fn home_from(env: Option<OsString>, fallback: impl FnOnce() -> Option<PathBuf>) -> Option<PathBuf> {
    match env {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => fallback(),
    }
}

/// Look up the home directory of the real uid in the account database.
#[cfg(unix)]
pub fn from_account_database() -> Option<PathBuf> {
    use std::ffi::{CStr, OsStr};
    use std::os::unix::ffi::OsStrExt;

    const MAX_BUFFER: usize = 1024 * 1024;

    // SAFETY: getuid has no preconditions and cannot fail.
    let uid = unsafe { libc::getuid() };
    // SAFETY: sysconf only reads a configuration value.
    let suggested = unsafe { libc::sysconf(libc::_SC_GETPW_R_SIZE_MAX) };
    let mut buf_len = if suggested > 0 { suggested as usize } else { 1024 };

    loop {
        let mut buf: Vec<libc::c_char> = vec![0; buf_len];
        // SAFETY: passwd is a plain C struct; all-zero is a valid bit pattern.
        let mut entry: libc::passwd = unsafe { std::mem::zeroed() };
        let mut found: *mut libc::passwd = std::ptr::null_mut();

        // SAFETY: every pointer refers to live, writable storage of the stated
        // size, and `entry` only borrows from `buf`, which outlives its use.
        let rc = unsafe {
            libc::getpwuid_r(uid, &mut entry, buf.as_mut_ptr(), buf.len(), &mut found)
        };

        if rc == libc::ERANGE && buf_len < MAX_BUFFER {
            buf_len *= 2;
            continue;
        }
        if rc != 0 || found.is_null() || entry.pw_dir.is_null() {
            return None;
        }

        // SAFETY: pw_dir is a NUL-terminated string inside `buf`.
        let dir = unsafe { CStr::from_ptr(entry.pw_dir) };
        if dir.to_bytes().is_empty() {
            return None;
        }
        return Some(PathBuf::from(OsStr::from_bytes(dir.to_bytes())));
    }
}

/// Look up the home directory of the real uid in the account database.
#[cfg(not(unix))]
pub fn from_account_database() -> Option<PathBuf> {
    None
}

/// Where the backend socket is expected.
#[derive(Debug, Clone)]
pub enum Endpoint<H = AccountHome> {
    /// A path supplied by configuration; home resolution is skipped.
    Explicit(PathBuf),
    /// `<home>/.think/native.sock` for the home directory `H` reports.
    Home(H),
}

impl Default for Endpoint<AccountHome> {
    #[cfg(not(windows))]
    fn default() -> Self {
        Self::Home(AccountHome)
    }

    #[cfg(windows)]
    fn default() -> Self {
        Self::Explicit(PathBuf::from(PIPE_NAME))
    }
}

impl<H: HomeDir> Endpoint<H> {
    /// Produce the absolute socket path.
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            Self::Explicit(path) => Ok(path.clone()),
            Self::Home(home) => {
                let home = home
                    .home_dir()
                    .ok_or_else(|| TransportError::EndpointUnavailable {
                        reason: "cannot determine home directory".to_string(),
                    })?;
                let path = socket_path_in(&home)?;
                debug!(?path, "resolved backend socket path");
                Ok(path)
            }
        }
    }
}

/// `<home>/.think/native.sock`, provided `home` is absolute.
pub fn socket_path_in(home: &Path) -> Result<PathBuf> {
    if !home.is_absolute() {
        return Err(TransportError::EndpointUnavailable {
            reason: format!("home directory is not absolute: {}", home.display()),
        });
    }
    Ok(home.join(APP_DIR).join(SOCKET_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoHome;

    impl HomeDir for NoHome {
        fn home_dir(&self) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    #[cfg(unix)]
    fn resolves_under_fixed_home() {
        let endpoint = Endpoint::Home(FixedHome(PathBuf::from("/home/ada")));
        let path = endpoint.resolve().unwrap();
        assert_eq!(path, PathBuf::from("/home/ada/.think/native.sock"));
    }

    #[test]
    fn explicit_path_skips_home_lookup() {
        let endpoint: Endpoint<NoHome> = Endpoint::Explicit(PathBuf::from("/run/think.sock"));
        assert_eq!(endpoint.resolve().unwrap(), PathBuf::from("/run/think.sock"));
    }

    #[test]
    fn missing_home_is_endpoint_unavailable() {
        let err = Endpoint::Home(NoHome).resolve().unwrap_err();
        assert!(matches!(err, TransportError::EndpointUnavailable { .. }));
    }

    #[test]
    fn relative_home_is_rejected() {
        let err = Endpoint::Home(FixedHome(PathBuf::from("relative/home")))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, TransportError::EndpointUnavailable { .. }));
    }

    #[test]
    fn env_home_wins_when_non_empty() {
        let home = home_from(Some(OsString::from("/home/env")), || {
            panic!("fallback must not run")
        });
        assert_eq!(home, Some(PathBuf::from("/home/env")));
    }

    #[test]
    fn empty_or_missing_env_falls_back_to_account_database() {
        let fallback = || Some(PathBuf::from("/home/pw"));
        assert_eq!(
            home_from(Some(OsString::new()), fallback),
            Some(PathBuf::from("/home/pw"))
        );
        assert_eq!(home_from(None, fallback), Some(PathBuf::from("/home/pw")));
        assert_eq!(home_from(None, || None), None);
    }

    #[test]
    #[cfg(not(windows))]
    fn default_endpoint_is_home_socket() {
        assert!(matches!(Endpoint::default(), Endpoint::Home(AccountHome)));
    }

    #[test]
    #[cfg(windows)]
    fn default_endpoint_is_app_pipe() {
        let path = Endpoint::default().resolve().unwrap();
        assert_eq!(path, PathBuf::from(r"\\.\pipe\think-native"));
    }

    #[test]
    #[cfg(unix)]
    fn account_database_entry_is_absolute_when_present() {
        if let Some(home) = from_account_database() {
            assert!(home.is_absolute());
        }
    }
}
