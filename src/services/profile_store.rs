// Author Profile Storage Service
// Per-author rolling baseline persisted as JSON, read-modify-write under an exclusive file lock

use crate::models::AuthorProfile;
use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Profile {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Could not lock profile {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct ProfileStore {
    profile_file: PathBuf,
}

impl ProfileStore {
    pub fn new(profile_file: PathBuf) -> Self {
        Self { profile_file }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.profile_file.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.profile_file.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_err(&self, source: std::io::Error) -> ProfileError {
        ProfileError::Io {
            path: self.profile_file.clone(),
            source,
        }
    }

    /// `Ok(None)` when no profile has been written yet.
    pub fn load(&self) -> Result<Option<AuthorProfile>, ProfileError> {
        if !self.profile_file.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.profile_file).map_err(|e| self.io_err(e))?;
        let profile = serde_json::from_str(&content).map_err(|source| ProfileError::Parse {
            path: self.profile_file.clone(),
            source,
        })?;
        Ok(Some(profile))
    }

    /// Write through a temp file and rename so readers never see a partial profile.
    pub fn save(&self, profile: &AuthorProfile) -> Result<(), ProfileError> {
        if let Some(dir) = self.profile_file.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
            }
        }
        let content = serde_json::to_string_pretty(profile).map_err(|source| ProfileError::Parse {
            path: self.profile_file.clone(),
            source,
        })?;
        let tmp = self.temp_path();
        fs::write(&tmp, content).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.profile_file).map_err(|e| self.io_err(e))
    }

    fn open_lock_file(&self) -> Result<File, ProfileError> {
        let lock_path = self.lock_path();
        if let Some(dir) = lock_path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
            }
        }
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| ProfileError::Lock { path: lock_path, source })
    }

    /// Run one read-modify-write cycle while holding the exclusive lock.
    ///
    /// `f` sees the current profile (None when missing or unreadable) and
    /// returns a value plus the profile to persist. Persistence problems never
    /// prevent `f` from running; they come back as the error list. When the
    /// lock cannot be taken, `f` runs without a profile and nothing is saved.
    pub fn update<T, F>(&self, f: F) -> (T, Vec<ProfileError>)
    where
        F: FnOnce(Option<&AuthorProfile>) -> (T, AuthorProfile),
    {
        let mut problems = Vec::new();

        let file = match self.open_lock_file() {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %self.profile_file.display(), error = %e, "profile.lock_unavailable");
                problems.push(e);
                return (f(None).0, problems);
            }
        };
        let mut lock = RwLock::new(file);
        let guard = match lock.write() {
            Ok(guard) => guard,
            Err(source) => {
                let e = ProfileError::Lock {
                    path: self.lock_path(),
                    source,
                };
                warn!(path = %self.profile_file.display(), error = %e, "profile.lock_failed");
                problems.push(e);
                return (f(None).0, problems);
            }
        };

        let current = match self.load() {
            Ok(profile) => profile,
            Err(e) => {
                warn!(path = %self.profile_file.display(), error = %e, "profile.load_failed");
                problems.push(e);
                None
            }
        };

        let (value, next) = f(current.as_ref());

        match self.save(&next) {
            Ok(()) => debug!(path = %self.profile_file.display(), samples = next.samples, "profile.saved"),
            Err(e) => {
                warn!(path = %self.profile_file.display(), error = %e, "profile.save_failed");
                problems.push(e);
            }
        }

        drop(guard);
        (value, problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_missing_profile_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("author.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("nested").join("author.json"));
        let mut profile = AuthorProfile::default();
        profile.record(4.0, 90.0);
        store.save(&profile).unwrap();
        assert_eq!(store.load().unwrap(), Some(profile));
    }

    #[test]
    fn test_corrupt_profile_reads_as_absent_during_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("author.json");
        fs::write(&path, "not json").unwrap();
        let store = ProfileStore::new(path);
        let (seen, problems) = store.update(|current| {
            let mut next = current.cloned().unwrap_or_default();
            next.record(2.0, 50.0);
            (current.is_some(), next)
        });
        assert!(!seen);
        assert_eq!(problems.len(), 1);
        assert!(matches!(problems[0], ProfileError::Parse { .. }));
        assert_eq!(store.load().unwrap().unwrap().samples, 1);
    }

    #[test]
    fn test_concurrent_updates_do_not_lose_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("author.json"));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = Arc::clone(&path);
                thread::spawn(move || {
                    let store = ProfileStore::new(path.as_ref().clone());
                    let (_, problems) = store.update(|current| {
                        let mut next = current.cloned().unwrap_or_default();
                        next.record(i as f64, 100.0);
                        ((), next)
                    });
                    assert!(problems.is_empty());
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let profile = ProfileStore::new(path.as_ref().clone()).load().unwrap().unwrap();
        assert_eq!(profile.samples, 8);
        assert!((profile.total_complexity_variance - 28.0).abs() < 1e-9);
        assert!((profile.avg_complexity_variance - 3.5).abs() < 1e-9);
    }
}
