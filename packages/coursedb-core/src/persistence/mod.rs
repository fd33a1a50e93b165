//! Snapshot persistence and recovery.
//!
//! The whole store is written as one JSON file holding a versioned,
//! CRC32-checked payload. Writes go through a temporary file and an atomic
//! rename, so a crash mid-write leaves the previous snapshot intact.

pub mod io_utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::config::DbConfig;
use crate::database::{Database, Tables};
use crate::error::DbError;

use io_utils::{classify_io_error, retry_io_operation};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot file name inside the data directory.
pub const SNAPSHOT_FILE: &str = "coursedb.json";

/// On-disk snapshot envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Snapshot format version
    pub version: u32,
    /// CRC32 of `payload`
    pub checksum: u32,
    /// Serialized [`Tables`]
    pub payload: String,
}

/// Persistence manager for the store snapshot.
///
/// Saves are serialized, so a later save always writes a snapshot at least
/// as new as any earlier one.
#[derive(Debug)]
pub struct PersistenceManager {
    data_dir: PathBuf,
    max_retries: u32,
    retry_delay_ms: u64,
    write_lock: Mutex<()>,
}

impl PersistenceManager {
    /// Creates a persistence manager rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, config: &DbConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a persistence manager if the configuration names a data
    /// directory.
    pub fn from_config(config: &DbConfig) -> Option<Self> {
        config
            .data_dir
            .as_ref()
            .map(|dir| Self::new(dir.clone(), config))
    }

    /// Path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Saves the current contents of `db`.
    ///
    /// # Arguments
    /// * `db` - Database to save
    ///
    /// # Returns
    /// `Result<(), DbError>` indicating success or failure.
    pub fn save(&self, db: &Database) -> Result<(), DbError> {
        let _guard = self.write_lock.lock().map_err(|_| DbError::LockPoisoned)?;
        let tables = db.snapshot()?;
        let payload = serde_json::to_string(&tables)
            .map_err(|e| DbError::SerializationError(e.to_string()))?;
        let snapshot = SnapshotFile {
            version: SNAPSHOT_VERSION,
            checksum: checksum(payload.as_bytes()),
            payload,
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| DbError::SerializationError(e.to_string()))?;

        retry_io_operation(
            || write_atomically(&self.data_dir, &bytes),
            self.max_retries,
            self.retry_delay_ms,
            "snapshot save",
        )?;
        tracing::debug!(
            courses = tables.courses.len(),
            students = tables.students.len(),
            "saved snapshot to {}",
            self.snapshot_path().display()
        );
        Ok(())
    }

    /// Loads the database from the snapshot file.
    ///
    /// # Returns
    /// An empty database when no snapshot exists yet, `DataCorruption` when
    /// the file fails its version or checksum check.
    pub fn load(&self) -> Result<Database, DbError> {
        let path = self.snapshot_path();
        if !path.exists() {
            tracing::info!("No snapshot at {}, starting empty", path.display());
            return Ok(Database::new());
        }

        let bytes = retry_io_operation(
            || fs::read(&path).map_err(|e| classify_io_error(e, "snapshot read")),
            self.max_retries,
            self.retry_delay_ms,
            "snapshot load",
        )?;
        let snapshot: SnapshotFile = serde_json::from_slice(&bytes)
            .map_err(|e| DbError::DataCorruption(format!("Unreadable snapshot: {}", e)))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DbError::DataCorruption(format!(
                "Unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        let actual = checksum(snapshot.payload.as_bytes());
        if actual != snapshot.checksum {
            return Err(DbError::DataCorruption(format!(
                "Checksum mismatch: expected {:08x}, got {:08x}",
                snapshot.checksum, actual
            )));
        }

        let tables: Tables = serde_json::from_str(&snapshot.payload)
            .map_err(|e| DbError::DataCorruption(format!("Invalid snapshot payload: {}", e)))?;
        tracing::info!(
            courses = tables.courses.len(),
            students = tables.students.len(),
            "loaded snapshot from {}",
            path.display()
        );
        Ok(Database::from_tables(tables))
    }
}

fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

fn write_atomically(data_dir: &Path, bytes: &[u8]) -> Result<(), DbError> {
    fs::create_dir_all(data_dir)
        .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;

    let temp_path = data_dir.join(format!("{}.tmp", SNAPSHOT_FILE));
    let final_path = data_dir.join(SNAPSHOT_FILE);

    let mut file =
        File::create(&temp_path).map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    file.write_all(bytes)
        .map_err(|e| classify_io_error(e, "Failed to write snapshot"))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync snapshot"))?;

    // Atomic rename
    fs::rename(&temp_path, &final_path)
        .map_err(|e| classify_io_error(e, "Failed to rename snapshot file"))
}
