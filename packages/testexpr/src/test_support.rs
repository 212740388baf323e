#[cfg(test)]
pub mod mock {
    use std::collections::{HashMap, HashSet};

    use crate::host::{AccessMode, FsProbe, ProbeError, StatInfo};

    /// An in-memory mock implementation of `FsProbe` for testing.
    ///
    /// Missing paths stat as `exists: false` rather than erroring, the same
    /// non-throwing contract the real probe exposes to the evaluator.
    pub struct MockFs {
        files: HashMap<String, Vec<u8>>,
        dirs: HashSet<String>,
        links: HashMap<String, String>,
        modes: HashMap<String, u32>,
    }

    impl Default for MockFs {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockFs {
        pub fn new() -> Self {
            Self {
                files: HashMap::new(),
                dirs: HashSet::new(),
                links: HashMap::new(),
                modes: HashMap::new(),
            }
        }

        /// Add a regular file with the given content.
        pub fn with_file(mut self, path: &str, content: &[u8]) -> Self {
            self.files.insert(path.to_string(), content.to_vec());
            self
        }

        /// Add a directory.
        pub fn with_dir(mut self, path: &str) -> Self {
            self.dirs.insert(path.to_string());
            self
        }

        /// Add a symbolic link; the target need not exist.
        pub fn with_symlink(mut self, path: &str, target: &str) -> Self {
            self.links.insert(path.to_string(), target.to_string());
            self
        }

        /// Override the mode bits of an entry (default 0o644 for files,
        /// 0o755 for directories).
        pub fn with_mode(mut self, path: &str, mode: u32) -> Self {
            self.modes.insert(path.to_string(), mode);
            self
        }

        fn mode_of(&self, path: &str, fallback: u32) -> u32 {
            self.modes.get(path).copied().unwrap_or(fallback)
        }

        /// Follow the link chain, with a hop cap standing in for ELOOP.
        fn resolve(&self, path: &str) -> Result<String, ProbeError> {
            let mut cur = path.to_string();
            for _ in 0..8 {
                match self.links.get(&cur) {
                    Some(next) => cur = next.clone(),
                    None => return Ok(cur),
                }
            }
            Err(ProbeError::IoError(format!(
                "{path}: too many levels of symbolic links"
            )))
        }

        fn stat_no_follow(&self, path: &str) -> StatInfo {
            if let Some(data) = self.files.get(path) {
                StatInfo {
                    exists: true,
                    is_file: true,
                    is_dir: false,
                    is_symlink: false,
                    size: data.len() as u64,
                    mode: self.mode_of(path, 0o644),
                }
            } else if self.dirs.contains(path) {
                StatInfo {
                    exists: true,
                    is_file: false,
                    is_dir: true,
                    is_symlink: false,
                    size: 0,
                    mode: self.mode_of(path, 0o755),
                }
            } else {
                StatInfo::default()
            }
        }
    }

    impl FsProbe for MockFs {
        fn stat(&self, path: &str) -> Result<StatInfo, ProbeError> {
            let resolved = self.resolve(path)?;
            Ok(self.stat_no_follow(&resolved))
        }

        fn lstat(&self, path: &str) -> Result<StatInfo, ProbeError> {
            if let Some(target) = self.links.get(path) {
                return Ok(StatInfo {
                    exists: true,
                    is_file: false,
                    is_dir: false,
                    is_symlink: true,
                    size: target.len() as u64,
                    mode: 0o777,
                });
            }
            Ok(self.stat_no_follow(path))
        }

        fn access(&self, path: &str, mode: AccessMode) -> bool {
            let resolved = match self.resolve(path) {
                Ok(p) => p,
                Err(_) => return false,
            };
            let info = self.stat_no_follow(&resolved);
            if !info.exists {
                return false;
            }
            match mode {
                AccessMode::Read => info.mode & 0o444 != 0,
                AccessMode::Write => info.mode & 0o222 != 0,
                AccessMode::Execute => info.mode & 0o111 != 0,
            }
        }
    }
}
