//! Transactional persistence for the scheduler relations.
//!
//! The whole database is one JSON document. Every mutation runs as a
//! transaction: the document is loaded under an exclusive lock, mutated in
//! memory, and committed by atomically replacing the file. If the mutation
//! fails, nothing is written.

use crate::config::StoreConfig;
use crate::{Appointment, AvailabilitySlot, Credential, Error, PrincipalKind, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const DOCUMENT_FILE: &str = "scheduler.json";
const LOCK_FILE: &str = "scheduler.lock";
const LOCK_RETRY: Duration = Duration::from_millis(2);

/// All persisted relations
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub patients: BTreeMap<String, Credential>,

    #[serde(default)]
    pub caregivers: BTreeMap<String, Credential>,

    /// Vaccine name -> available doses
    #[serde(default)]
    pub vaccines: BTreeMap<String, u32>,

    /// Open slots in upload order
    #[serde(default)]
    pub availabilities: Vec<AvailabilitySlot>,

    /// Appointments in id order
    #[serde(default)]
    pub appointments: Vec<Appointment>,

    #[serde(default)]
    pub next_appointment_id: u64,
}

impl Database {
    /// The credential table for one principal namespace
    pub fn accounts(&self, kind: PrincipalKind) -> &BTreeMap<String, Credential> {
        match kind {
            PrincipalKind::Patient => &self.patients,
            PrincipalKind::Caregiver => &self.caregivers,
        }
    }

    pub fn accounts_mut(&mut self, kind: PrincipalKind) -> &mut BTreeMap<String, Credential> {
        match kind {
            PrincipalKind::Patient => &mut self.patients,
            PrincipalKind::Caregiver => &mut self.caregivers,
        }
    }
}

/// Access to a `Database` with all-or-nothing writes
pub trait Store: Send + Sync {
    /// Run `f` against a consistent snapshot
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> T;

    /// Run `f` with exclusive access, committing only if it returns `Ok`
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Mutex-guarded store for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    db: Mutex<Database>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing contents
    pub fn with_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }
}

impl Store for MemoryStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> T,
    {
        let guard = self
            .db
            .lock()
            .map_err(|_| Error::Storage("memory store mutex poisoned".into()))?;
        Ok(f(&guard))
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T>,
    {
        let mut guard = self
            .db
            .lock()
            .map_err(|_| Error::Storage("memory store mutex poisoned".into()))?;
        let mut working = guard.clone();
        let value = f(&mut working)?;
        *guard = working;
        Ok(value)
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// JSON document store guarded by an advisory lock file.
///
/// The lock is taken per operation through a fresh file handle, so it
/// serializes threads of one process as well as separate processes.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>, config: &StoreConfig) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!("Opened file store at {:?}", dir);
        Ok(Self {
            dir,
            lock_timeout: Duration::from_millis(config.lock_timeout_ms),
        })
    }

    /// Path of the JSON document
    pub fn document_path(&self) -> PathBuf {
        self.dir.join(DOCUMENT_FILE)
    }

    /// Path of the lock file
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Acquire the store lock, retrying until the timeout elapses
    fn acquire(&self, exclusive: bool) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.lock_path())?;

        let started = Instant::now();
        loop {
            // Fully qualified: std::fs::File has inherent lock methods too
            let attempt = if exclusive {
                FileExt::try_lock_exclusive(&file)
            } else {
                FileExt::try_lock_shared(&file)
            };
            match attempt {
                Ok(()) => return Ok(file),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if started.elapsed() >= self.lock_timeout {
                        let waited_ms = started.elapsed().as_millis() as u64;
                        tracing::warn!("Gave up on store lock after {}ms", waited_ms);
                        return Err(Error::LockTimeout { waited_ms });
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Load the document; a missing file is an empty database
    fn load(&self) -> Result<Database> {
        let path = self.document_path();
        if !path.exists() {
            tracing::debug!("No document at {:?}, starting empty", path);
            return Ok(Database::default());
        }

        let mut contents = String::new();
        File::open(&path)?.read_to_string(&mut contents)?;

        // A corrupt ledger is an error, never silently replaced
        let db = serde_json::from_str::<Database>(&contents)?;
        Ok(db)
    }

    /// Atomically replace the document:
    /// 1. Write to a temp file in the same directory
    /// 2. Sync to disk
    /// 3. Rename over the original
    fn save(&self, db: &Database) -> Result<()> {
        let temp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(db)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(self.document_path())
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

/// Drop the advisory lock. Closing the handle releases it regardless.
fn release(lock: &File) {
    if let Err(e) = FileExt::unlock(lock) {
        tracing::warn!("Failed to unlock store lock file: {}", e);
    }
}

impl Store for FileStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> T,
    {
        let lock = self.acquire(false)?;
        let loaded = self.load();
        release(&lock);
        Ok(f(&loaded?))
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T>,
    {
        let lock = self.acquire(true)?;
        let outcome = self.load().and_then(|mut db| {
            let value = f(&mut db)?;
            self.save(&db)?;
            Ok(value)
        });
        // The document is already renamed into place here
        release(&lock);
        if outcome.is_ok() {
            tracing::debug!("Committed transaction to {:?}", self.document_path());
        }
        outcome
    }
}
