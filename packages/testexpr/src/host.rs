//! Filesystem-probe capability consumed by the conditional evaluator.
//!
//! File predicates are lenient: an absent or unreachable path probes as a
//! negative answer, it never aborts the evaluation. The evaluator only
//! issues read-only queries through this trait, so any implementation is
//! free of observable side effects.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types shared between the trait and its implementations
// ---------------------------------------------------------------------------

/// Stat-like answer for a single path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatInfo {
    pub exists: bool,
    pub is_file: bool,
    pub is_dir: bool,
    pub is_symlink: bool,
    pub size: u64,
    pub mode: u32,
}

#[derive(Debug, Clone)]
pub enum ProbeError {
    NotFound(String),
    PermissionDenied(String),
    IoError(String),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "not found: {path}"),
            Self::PermissionDenied(path) => write!(f, "permission denied: {path}"),
            Self::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

/// Permission classes checked by `-r` / `-w` / `-x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    Execute,
}

// ---------------------------------------------------------------------------
// FsProbe trait — implemented by LocalFs or test mocks
// ---------------------------------------------------------------------------

pub trait FsProbe {
    /// Stat `path`, following symlinks.
    fn stat(&self, path: &str) -> Result<StatInfo, ProbeError>;

    /// Stat `path` itself, without following a final symlink.
    fn lstat(&self, path: &str) -> Result<StatInfo, ProbeError>;

    /// Whether the effective user may read, write or execute `path`.
    fn access(&self, path: &str, mode: AccessMode) -> bool;
}

// ---------------------------------------------------------------------------
// LocalFs — probe backed by the real filesystem
// ---------------------------------------------------------------------------

pub struct LocalFs;

fn stat_info(meta: &std::fs::Metadata) -> StatInfo {
    StatInfo {
        exists: true,
        is_file: meta.is_file(),
        is_dir: meta.is_dir(),
        is_symlink: meta.file_type().is_symlink(),
        size: meta.len(),
        mode: mode_bits(meta),
    }
}

#[cfg(unix)]
fn mode_bits(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn mode_bits(meta: &std::fs::Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

fn probe_error(path: &str, err: std::io::Error) -> ProbeError {
    match err.kind() {
        std::io::ErrorKind::NotFound => ProbeError::NotFound(path.to_string()),
        std::io::ErrorKind::PermissionDenied => ProbeError::PermissionDenied(path.to_string()),
        _ => ProbeError::IoError(format!("{path}: {err}")),
    }
}

impl FsProbe for LocalFs {
    fn stat(&self, path: &str) -> Result<StatInfo, ProbeError> {
        std::fs::metadata(path)
            .map(|m| stat_info(&m))
            .map_err(|e| probe_error(path, e))
    }

    fn lstat(&self, path: &str) -> Result<StatInfo, ProbeError> {
        std::fs::symlink_metadata(path)
            .map(|m| stat_info(&m))
            .map_err(|e| probe_error(path, e))
    }

    #[cfg(unix)]
    fn access(&self, path: &str, mode: AccessMode) -> bool {
        use std::ffi::CString;

        let flag = match mode {
            AccessMode::Read => libc::R_OK,
            AccessMode::Write => libc::W_OK,
            AccessMode::Execute => libc::X_OK,
        };
        let cpath = match CString::new(path) {
            Ok(c) => c,
            // An embedded NUL cannot name a real file.
            Err(_) => return false,
        };
        // AT_EACCESS: check against the effective uid/gid.
        unsafe { libc::faccessat(libc::AT_FDCWD, cpath.as_ptr(), flag, libc::AT_EACCESS) == 0 }
    }

    #[cfg(not(unix))]
    fn access(&self, path: &str, mode: AccessMode) -> bool {
        match self.stat(path) {
            Ok(info) if info.exists => match mode {
                AccessMode::Read => true,
                AccessMode::Write => info.mode & 0o222 != 0,
                AccessMode::Execute => info.mode & 0o111 != 0,
            },
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
