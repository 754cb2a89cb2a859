//! Single-file feed cache.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;

use crate::error::ConfigError;

/// How a sync cycle treats the cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Try the cache first when present and fresh, then the remote mirrors. (Default)
    #[default]
    Use,
    /// Skip the cache and go straight to the remote mirrors; successful
    /// fetches are still written back.
    Refresh,
    /// Never touch the network. The cache is accepted however old it is.
    Only,
}

impl CacheMode {
    /// Cache-only wins when both flags are set.
    pub const fn from_flags(cache_only: bool, force_refresh: bool) -> Self {
        if cache_only {
            Self::Only
        } else if force_refresh {
            Self::Refresh
        } else {
            Self::Use
        }
    }
}

/// One feed's cache file, replaced wholesale on every successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    pub fn new(dir: impl AsRef<Path>, name: &str) -> Result<Self, ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyCacheFile);
        }
        Ok(Self {
            path: dir.as_ref().join(name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// An existing file must be writable; otherwise its directory must be.
    pub fn check_writable(&self) -> Result<(), ConfigError> {
        if self.path.exists() {
            return OpenOptions::new()
                .append(true)
                .open(&self.path)
                .map(|_| ())
                .map_err(|_| ConfigError::CacheNotWritable {
                    path: self.path.clone(),
                });
        }

        let dir = self.dir();
        if dir.is_dir() && tempfile::tempfile_in(dir).is_ok() {
            Ok(())
        } else {
            Err(ConfigError::CacheDirNotWritable {
                path: dir.to_path_buf(),
            })
        }
    }

    /// Whole file contents; an empty file reads as no bytes.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Replaces the file through a temp file in the same directory and a rename.
    pub async fn write(&self, contents: &[u8]) -> io::Result<()> {
        let dir = self.dir().to_path_buf();
        let path = self.path.clone();
        let contents = contents.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut temp = NamedTempFile::new_in(&dir)?;
            temp.write_all(&contents)?;
            temp.as_file().sync_all()?;
            temp.persist(&path).map_err(|error| error.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)?
    }

    /// Time since the last modification; zero when the clock runs behind the file.
    pub async fn age(&self) -> io::Result<Duration> {
        let modified = tokio::fs::metadata(&self.path).await?.modified()?;
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO))
    }

    /// Whether the file is at least `refresh` seconds old.
    pub async fn is_expired(&self, refresh: u64) -> io::Result<bool> {
        Ok(self.age().await? >= Duration::from_secs(refresh))
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_only_wins_over_force_refresh() {
        assert_eq!(CacheMode::from_flags(true, true), CacheMode::Only);
        assert_eq!(CacheMode::from_flags(false, true), CacheMode::Refresh);
        assert_eq!(CacheMode::from_flags(false, false), CacheMode::Use);
        assert_eq!(CacheMode::default(), CacheMode::Use);
    }

    #[test]
    fn empty_name_is_rejected() {
        let error = CacheFile::new(".", "  ").expect_err("empty name");
        assert_eq!(error, ConfigError::EmptyCacheFile);
    }

    #[tokio::test]
    async fn write_then_read_is_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CacheFile::new(dir.path(), "vatsim-data.txt").expect("cache file");
        assert!(!cache.exists());

        let payload = b"!GENERAL:\r\nUPDATE = 20130601000000\n\xff";
        cache.write(payload).await.expect("write");
        assert!(cache.exists());
        assert_eq!(cache.read().await.expect("read"), payload.to_vec());

        cache.write(b"").await.expect("overwrite");
        assert!(cache.read().await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn fresh_file_expires_only_with_zero_refresh() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CacheFile::new(dir.path(), "status.txt").expect("cache file");
        cache.write(b"url0=http://a").await.expect("write");

        assert!(!cache.is_expired(3600).await.expect("age"));
        assert!(cache.is_expired(0).await.expect("age"));
    }

    #[test]
    fn writable_checks_directory_when_file_is_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = CacheFile::new(dir.path(), "status.txt").expect("cache file");
        assert!(cache.check_writable().is_ok());

        let missing = CacheFile::new(dir.path().join("nope"), "status.txt").expect("cache file");
        assert!(matches!(
            missing.check_writable(),
            Err(ConfigError::CacheDirNotWritable { .. })
        ));
    }
}
