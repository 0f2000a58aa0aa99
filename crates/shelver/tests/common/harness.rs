//! Test harness for isolated relocation runs.
//!
//! The `TestHarness` struct provides a complete isolated environment:
//! a temporary share root and staging directory, an in-memory database
//! seeded through the same repos production uses, and helpers to run the
//! full pipeline and inspect the journal afterwards.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local};
use tempfile::TempDir;
use uuid::Uuid;

use shelver::db::document_repo::{self, DocumentRow};
use shelver::db::outcome_repo::{self, OutcomeRow};
use shelver::db::Database;
use shelver::worker::{process_backlog, DocumentRecord, RunSummary};
use shelver::{CutoffGuard, PipelineConfig};

/// A cutoff guard that cannot trigger today.
pub fn inactive_cutoff() -> CutoffGuard {
    CutoffGuard::new(Local::now().weekday().succ(), 0)
}

/// A cutoff guard that is already past for the whole current day.
pub fn active_cutoff() -> CutoffGuard {
    CutoffGuard::new(Local::now().weekday(), 0)
}

pub struct TestHarness {
    /// Temporary directory containing the share root and staging area.
    temp_dir: TempDir,
    /// Share root under which DOCS<year>/<Mon> folders live.
    pub root_dir: PathBuf,
    /// Directory the pending files start out in.
    pub staging_dir: PathBuf,
    /// In-memory database, seeded through the production repos.
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root_dir = temp_dir.path().join("share");
        let staging_dir = temp_dir.path().join("staging");

        std::fs::create_dir_all(&root_dir).expect("Failed to create share root");
        std::fs::create_dir_all(&staging_dir).expect("Failed to create staging dir");

        let db = Database::open_in_memory().expect("Failed to open in-memory database");

        Self {
            temp_dir,
            root_dir,
            staging_dir,
            db,
        }
    }

    /// Get the base temp directory path.
    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Seeds one document record and writes its file to the staging area.
    pub fn seed_document(&self, created_on: &str, sequence_number: i64) -> DocumentRecord {
        let record = self.seed_record_only(created_on, sequence_number);
        std::fs::write(record.source_path(), b"document body")
            .expect("Failed to write document file");
        record
    }

    /// Seeds one document record without any file on disk.
    pub fn seed_record_only(&self, created_on: &str, sequence_number: i64) -> DocumentRecord {
        let id = Uuid::new_v4();
        document_repo::insert(
            &self.db,
            &DocumentRow {
                id: id.simple().to_string(),
                location: self.staging_dir.display().to_string(),
                created_on: created_on.to_string(),
                sequence_number,
            },
        )
        .expect("Failed to insert document row");

        DocumentRecord {
            id,
            current_location: self.staging_dir.clone(),
            created_on: DateTime::parse_from_rfc3339(created_on).expect("Invalid timestamp"),
            sequence_number,
        }
    }

    /// Pre-provisions a top-level year folder, e.g. "DOCS2023".
    pub fn provision_year(&self, year_folder: &str) {
        std::fs::create_dir_all(self.root_dir.join(year_folder))
            .expect("Failed to provision year folder");
    }

    pub fn pipeline_config(
        &self,
        batch_size: usize,
        worker_count: usize,
        cutoff: CutoffGuard,
    ) -> Arc<PipelineConfig> {
        Arc::new(PipelineConfig {
            root_directory: self.root_dir.clone(),
            batch_size,
            worker_count,
            cutoff,
        })
    }

    /// Runs the full pipeline with an inactive cutoff.
    pub fn run(&self, batch_size: usize, worker_count: usize) -> RunSummary {
        self.run_with_cutoff(batch_size, worker_count, inactive_cutoff())
    }

    pub fn run_with_cutoff(
        &self,
        batch_size: usize,
        worker_count: usize,
        cutoff: CutoffGuard,
    ) -> RunSummary {
        process_backlog(
            &self.db,
            self.pipeline_config(batch_size, worker_count, cutoff),
            Arc::new(AtomicBool::new(false)),
        )
        .expect("Pipeline run failed")
    }

    /// Journal entries for one record, oldest first.
    pub fn outcomes_for(&self, record: &DocumentRecord) -> Vec<OutcomeRow> {
        outcome_repo::list_for_record(&self.db, &record.id_hex())
            .expect("Failed to read journal")
    }

    /// The location column currently stored for one record.
    pub fn stored_location(&self, record: &DocumentRecord) -> String {
        document_repo::find_by_id(&self.db, &record.id_hex())
            .expect("Failed to read document")
            .expect("Document row missing")
            .location
    }

    /// Records still returned by the pending query.
    pub fn pending_count(&self) -> usize {
        document_repo::fetch_pending(&self.db)
            .expect("Failed to fetch pending")
            .len()
    }

    /// Expected destination directory for a year/month pair.
    pub fn destination(&self, year_folder: &str, month_folder: &str) -> PathBuf {
        self.root_dir.join(year_folder).join(month_folder)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
