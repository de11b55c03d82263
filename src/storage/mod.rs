//! # Storage Module - Data Persistence Layer
//!
//! File-backed JSON persistence for user accounts and chirps. The core auth
//! and admission components never touch the file system; the HTTP layer reads
//! and writes through [`Storage`] only.
//!
//! ## Layout
//!
//! ```text
//! data/
//! ├── users/     ← one <sha256(email) hex>.json per account
//! └── chirps/    ← one <uuid>.json per chirp
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chirpy::auth::CredentialHasher;
//! use chirpy::storage::Storage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = Storage::new("./data").await?;
//!     let hasher = CredentialHasher::new(None)?;
//!
//!     let user = storage
//!         .save_credential("alice@example.com", hasher.hash("hunter22")?)
//!         .await?;
//!     storage.save_post(user.id, "hello, world").await?;
//!
//!     for chirp in storage.get_chirps().await? {
//!         println!("{}: {}", chirp.user_id, chirp.body);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Write safety
//!
//! - Every write goes to a temp file in the target directory and is renamed
//!   into place while holding an exclusive `fs2` lock on the destination.
//! - Account creation publishes the record with a hard link, which fails if
//!   the email is already registered, so two concurrent registrations cannot
//!   both succeed.
//! - Reads enforce a size ceiling and tolerate leading NUL bytes.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::warn;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::auth::Credential;
use crate::validation::{
    secure_chirp_path, secure_json_parse, secure_user_path, validate_file_size, SecurityError,
};

/// Ceiling for any single record file.
const MAX_RECORD_BYTES: u64 = 100_000;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unreadable record {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: SecurityError,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Stored account. The hash never leaves the server; see the HTTP layer's
/// public view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: Credential,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub users: usize,
    pub chirps: usize,
}

/// Main storage interface
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: String,
}

impl Storage {
    /// Initialize storage with the given data directory
    pub async fn new(data_dir: &str) -> Result<Self> {
        fs::create_dir_all(Path::new(data_dir).join("users")).await?;
        fs::create_dir_all(Path::new(data_dir).join("chirps")).await?;
        Ok(Storage {
            data_dir: data_dir.to_string(),
        })
    }

    /// Return the base data directory path used by this storage instance
    pub fn base_dir(&self) -> &str {
        &self.data_dir
    }

    /// Create an account for an already-normalized email.
    pub async fn save_credential(&self, email: &str, credential: Credential) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: credential,
            created_at: now,
            updated_at: now,
        };
        let path = secure_user_path(&self.data_dir, email);
        let json_content = serde_json::to_string_pretty(&user)?;
        Self::create_file_exclusive(&path, &json_content).await?;
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let path = secure_user_path(&self.data_dir, email);
        Self::read_record(&path).await
    }

    /// Id and credential for `email`, or `None` when no such account exists.
    pub async fn lookup_credential_by_email(&self, email: &str) -> Result<Option<(Uuid, Credential)>> {
        Ok(self
            .get_user_by_email(email)
            .await?
            .map(|u| (u.id, u.hashed_password)))
    }

    /// Persist an admitted chirp body for `user_id`.
    pub async fn save_post(&self, user_id: Uuid, body: &str) -> Result<Chirp> {
        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        let path = secure_chirp_path(&self.data_dir, &chirp.id);
        let json_content = serde_json::to_string_pretty(&chirp)?;
        Self::write_file_locked(&path, &json_content).await?;
        Ok(chirp)
    }

    pub async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>> {
        let path = secure_chirp_path(&self.data_dir, &id);
        Self::read_record(&path).await
    }

    /// All chirps, oldest first.
    pub async fn get_chirps(&self) -> Result<Vec<Chirp>> {
        let mut chirps: Vec<Chirp> = Vec::new();
        for path in self.record_files("chirps").await? {
            match Self::read_record::<Chirp>(&path).await {
                Ok(Some(c)) => chirps.push(c),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable chirp file {:?}: {}", path, e),
            }
        }
        chirps.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(chirps)
    }

    /// Remove every account and chirp.
    ///
    /// Record files are unlinked one by one; the directories stay in place so
    /// writes racing the reset still have somewhere to land.
    pub async fn delete_all(&self) -> Result<()> {
        for sub in ["users", "chirps"] {
            fs::create_dir_all(Path::new(&self.data_dir).join(sub)).await?;
            for path in self.record_files(sub).await? {
                match fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            users: self.record_files("users").await?.len(),
            chirps: self.record_files("chirps").await?.len(),
        })
    }

    async fn record_files(&self, sub: &str) -> Result<Vec<PathBuf>> {
        let dir = Path::new(&self.data_dir).join(sub);
        let mut out = Vec::new();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
            let is_temp = path
                .file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.starts_with('.'))
                .unwrap_or(true);
            if is_json && !is_temp {
                out.push(path);
            }
        }
        Ok(out)
    }

    async fn read_record<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let metadata = match fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let corrupt = |source| StorageError::Corrupt {
            path: path.display().to_string(),
            source,
        };
        validate_file_size(metadata.len(), MAX_RECORD_BYTES).map_err(corrupt)?;
        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = secure_json_parse(&content, MAX_RECORD_BYTES as usize).map_err(corrupt)?;
        Ok(Some(record))
    }

    /// Write `content` to a fresh temp file next to `path` and return its path.
    fn write_temp(path: &Path, content: &str) -> Result<PathBuf> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("record.json");
        let mut counter = 0u32;
        loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut tmp) => {
                    tmp.write_all(content.as_bytes())?;
                    tmp.flush()?;
                    let _ = tmp.sync_all();
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Helper function to write content to a file with exclusive locking
    async fn write_file_locked(path: &Path, content: &str) -> Result<()> {
        use std::fs::{self, File, OpenOptions};

        // fs2 locks are synchronous; hold one on the destination for the swap
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;
        lock_file.lock_exclusive()?;

        let tmp_path = Self::write_temp(path, content)?;
        fs::rename(&tmp_path, path)?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }
        drop(lock_file);
        Ok(())
    }

    /// Publish `content` at `path` only if nothing exists there yet.
    async fn create_file_exclusive(path: &Path, content: &str) -> Result<()> {
        use std::fs::{self, File};

        let tmp_path = Self::write_temp(path, content)?;
        let linked = fs::hard_link(&tmp_path, path);
        let _ = fs::remove_file(&tmp_path);
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(StorageError::EmailTaken),
            Err(e) => return Err(e.into()),
        }
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_storage() -> (tempfile::TempDir, Storage) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");
        let storage = Storage::new(dir.to_str().unwrap()).await.unwrap();
        (tmp, storage)
    }

    #[tokio::test]
    async fn new_creates_layout() {
        let (_tmp, storage) = temp_storage().await;
        assert!(Path::new(storage.base_dir()).join("users").is_dir());
        assert!(Path::new(storage.base_dir()).join("chirps").is_dir());
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let (_tmp, storage) = temp_storage().await;
        storage
            .save_credential("a@b.io", Credential::from_stored("$x"))
            .await
            .unwrap();
        let err = storage
            .save_credential("a@b.io", Credential::from_stored("$y"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::EmailTaken));
        // original record untouched
        let (_, cred) = storage.lookup_credential_by_email("a@b.io").await.unwrap().unwrap();
        assert_eq!(cred.as_str(), "$x");
    }

    #[tokio::test]
    async fn lookup_missing_is_none() {
        let (_tmp, storage) = temp_storage().await;
        assert!(storage.lookup_credential_by_email("nobody@b.io").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn chirps_listed_oldest_first() {
        let (_tmp, storage) = temp_storage().await;
        let uid = Uuid::new_v4();
        let first = storage.save_post(uid, "one").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = storage.save_post(uid, "two").await.unwrap();
        let all = storage.get_chirps().await.unwrap();
        assert_eq!(all, vec![first.clone(), second]);
        assert_eq!(storage.get_chirp(first.id).await.unwrap(), Some(first));
        assert_eq!(storage.get_chirp(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_chirp_is_skipped_in_listing() {
        let (_tmp, storage) = temp_storage().await;
        storage.save_post(Uuid::new_v4(), "ok").await.unwrap();
        let bad = Path::new(storage.base_dir()).join("chirps").join(format!("{}.json", Uuid::new_v4()));
        std::fs::write(&bad, "{not json").unwrap();
        let all = storage.get_chirps().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn delete_all_clears_everything() {
        let (_tmp, storage) = temp_storage().await;
        let user = storage
            .save_credential("a@b.io", Credential::from_stored("$x"))
            .await
            .unwrap();
        storage.save_post(user.id, "bye").await.unwrap();
        assert_eq!(storage.stats().await.unwrap(), StoreStats { users: 1, chirps: 1 });
        storage.delete_all().await.unwrap();
        assert_eq!(storage.stats().await.unwrap(), StoreStats::default());
        // email is free again
        assert!(storage
            .save_credential("a@b.io", Credential::from_stored("$z"))
            .await
            .is_ok());
    }
}
