use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// One completed solve. Immutable after creation apart from the DNF toggle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolveRecord {
    pub id: u64,
    pub duration_ms: u64,
    pub scramble: String,
    pub created_at: DateTime<Local>,
    #[serde(default)]
    pub dnf: bool,
}

pub trait RecordStore {
    /// Missing or corrupt data loads as an empty history, never an error.
    fn load(&self) -> Vec<SolveRecord>;
    fn save(&self, records: &[SolveRecord]) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::records_path().unwrap_or_else(|| PathBuf::from("kubik_solves.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl RecordStore for FileRecordStore {
    fn load(&self) -> Vec<SolveRecord> {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(records) = serde_json::from_slice::<Vec<SolveRecord>>(&bytes) {
                return records;
            }
        }
        Vec::new()
    }

    fn save(&self, records: &[SolveRecord]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(records).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

/// In-memory store for tests and headless sessions.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: std::cell::RefCell<Vec<SolveRecord>>,
}

impl RecordStore for MemoryRecordStore {
    fn load(&self) -> Vec<SolveRecord> {
        self.records.borrow().clone()
    }

    fn save(&self, records: &[SolveRecord]) -> std::io::Result<()> {
        *self.records.borrow_mut() = records.to_vec();
        Ok(())
    }
}

/// Owns the most-recent-first solve history and writes it through on change.
pub struct RecordBook {
    store: Box<dyn RecordStore>,
    records: Vec<SolveRecord>,
    /// Only ever incremented; deletions must not free ids for reuse.
    next_id: u64,
}

impl RecordBook {
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        let records = store.load();
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            store,
            records,
            next_id,
        }
    }

    pub fn records(&self) -> &[SolveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a completed solve at the front and returns its id.
    pub fn push(&mut self, duration_ms: u64, scramble: String, created_at: DateTime<Local>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(
            0,
            SolveRecord {
                id,
                duration_ms,
                scramble,
                created_at,
                dnf: false,
            },
        );
        let _ = self.store.save(&self.records);
        id
    }

    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let deleted = self.records.len() != before;
        if deleted {
            let _ = self.store.save(&self.records);
        }
        deleted
    }

    pub fn delete_latest(&mut self) -> Option<u64> {
        let id = self.records.first().map(|r| r.id)?;
        self.delete(id);
        Some(id)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        let _ = self.store.save(&self.records);
    }

    /// Flips the DNF flag on the most recent record.
    pub fn toggle_latest_dnf(&mut self) -> Option<bool> {
        let record = self.records.first_mut()?;
        record.dnf = !record.dnf;
        let flagged = record.dnf;
        let _ = self.store.save(&self.records);
        Some(flagged)
    }

    /// Durations eligible for statistics, most-recent-first, DNFs excluded.
    pub fn countable_durations(&self) -> Vec<u64> {
        self.records
            .iter()
            .filter(|r| !r.dnf)
            .map(|r| r.duration_ms)
            .collect()
    }
}
