use std::path::PathBuf;

use tracing::{debug, info, info_span, warn};

use crate::db::{document_repo, outcome_repo, Database, DatabaseError};
use crate::layout;
use crate::pipeline::config::PipelineConfig;
use crate::storage::FileStorage;
use crate::worker::record::{DocumentRecord, RelocationOutcome};

/// Runs one record through the relocation gates. Each gate is terminal on
/// failure: processing of that record stops, the outcome is journaled, and
/// the batch moves on. Per record there is at most one filesystem mutation
/// and at most one location update, and exactly one journal write.
pub struct Processor {
    root_directory: PathBuf,
    storage: FileStorage,
    db: Database,
}

impl Processor {
    pub fn new(config: &PipelineConfig, db: Database) -> Self {
        Self {
            root_directory: config.root_directory.clone(),
            storage: FileStorage::new(&config.root_directory),
            db,
        }
    }

    /// Processes one record and journals its outcome.
    ///
    /// The journal write is the only error path: without a journal row the
    /// run cannot account for the record, so callers treat a failure here
    /// as fatal to the whole run.
    pub fn process(&self, record: &DocumentRecord) -> Result<RelocationOutcome, DatabaseError> {
        let _span = info_span!(
            "relocate",
            record_id = %record.id.simple(),
            sequence = record.sequence_number,
        )
        .entered();

        let outcome = self.relocate(record);

        outcome_repo::insert(&self.db, &outcome.to_row())?;

        if outcome.status.is_success() {
            debug!(
                "Relocated {} to {}",
                record.file_name(),
                outcome.new_location.as_deref().unwrap_or_default()
            );
        } else {
            warn!(
                "Record {} not relocated ({}): {}",
                record.id_hex(),
                outcome.status.as_str(),
                outcome.message
            );
        }

        Ok(outcome)
    }

    fn relocate(&self, record: &DocumentRecord) -> RelocationOutcome {
        // Gate 1: the source file must still exist. No mutation has
        // happened yet, so the record simply stays where it is.
        let source_path = record.source_path();
        if !self.storage.exists(&source_path) {
            return RelocationOutcome::file_missing(record);
        }

        // Gate 2: destination planning. Pure, always succeeds.
        let plan = layout::plan(&record.created_on);
        let year_directory = plan.year_directory(&self.root_directory);
        let destination_dir = plan.directory(&self.root_directory);

        // Gate 3: the year folder is provisioned out-of-band and is never
        // created here.
        if !self.storage.exists(&year_directory) {
            return RelocationOutcome::root_folder_missing(record, &year_directory);
        }

        // Gate 4: the month folder is created on demand.
        match self.storage.ensure_directory(&destination_dir) {
            Ok(true) => info!("Created month folder {}", destination_dir.display()),
            Ok(false) => {}
            Err(e) => return RelocationOutcome::storage_failed(record, &destination_dir, &e),
        }

        // Gate 5: point the database at the destination before the move.
        // The directory exists at this point, so a crash between the two
        // mutations leaves the database naming a real directory while the
        // file is still at its previous location.
        let destination = destination_dir.display().to_string();
        if let Err(e) = document_repo::update_location(&self.db, &record.id_hex(), &destination) {
            return RelocationOutcome::update_failed(record, &destination_dir, &e);
        }

        // Gate 6: the move. A failure here leaves the database ahead of
        // the filesystem; journaled under its own status so operators can
        // reconcile.
        let destination_path = destination_dir.join(record.file_name());
        if let Err(e) = self.storage.move_file(&source_path, &destination_path) {
            return RelocationOutcome::move_failed_after_update(record, &destination_dir, &e);
        }

        RelocationOutcome::success(record, &destination_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::document_repo::DocumentRow;
    use crate::pipeline::cutoff::CutoffGuard;
    use crate::worker::record::{OutcomeStatus, NO_NEW_LOCATION};
    use chrono::{DateTime, Weekday};
    use tempfile::TempDir;
    use uuid::Uuid;

    struct Fixture {
        _temp_dir: TempDir,
        root: PathBuf,
        staging: PathBuf,
        db: Database,
        processor: Processor,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let root = temp_dir.path().join("share");
            let staging = temp_dir.path().join("staging");
            std::fs::create_dir_all(&root).unwrap();
            std::fs::create_dir_all(&staging).unwrap();

            let db = Database::open_in_memory().unwrap();
            let config = PipelineConfig {
                root_directory: root.clone(),
                batch_size: 50,
                worker_count: 1,
                cutoff: CutoffGuard::new(Weekday::Sat, 17),
            };
            let processor = Processor::new(&config, db.clone());

            Self {
                _temp_dir: temp_dir,
                root,
                staging,
                db,
                processor,
            }
        }

        fn record(&self, created_on: &str, seq: i64) -> DocumentRecord {
            let record = DocumentRecord {
                id: Uuid::new_v4(),
                current_location: self.staging.clone(),
                created_on: DateTime::parse_from_rfc3339(created_on).unwrap(),
                sequence_number: seq,
            };
            document_repo::insert(
                &self.db,
                &DocumentRow {
                    id: record.id_hex(),
                    location: self.staging.display().to_string(),
                    created_on: created_on.to_string(),
                    sequence_number: seq,
                },
            )
            .unwrap();
            record
        }

        fn write_file(&self, record: &DocumentRecord) {
            std::fs::write(self.staging.join(record.file_name()), b"document body").unwrap();
        }

        fn provision_year(&self, year_folder: &str) {
            std::fs::create_dir_all(self.root.join(year_folder)).unwrap();
        }

        fn stored_location(&self, record: &DocumentRecord) -> String {
            document_repo::find_by_id(&self.db, &record.id_hex())
                .unwrap()
                .unwrap()
                .location
        }
    }

    #[test]
    fn test_successful_relocation() {
        let fx = Fixture::new();
        let record = fx.record("2023-03-14T09:30:00Z", 1);
        fx.write_file(&record);
        fx.provision_year("DOCS2023");

        let outcome = fx.processor.process(&record).unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Success);
        let destination = fx.root.join("DOCS2023").join("Mar");
        assert!(destination.join(record.file_name()).exists());
        assert!(!record.source_path().exists());
        assert_eq!(fx.stored_location(&record), destination.display().to_string());

        let rows = outcome_repo::list_for_record(&fx.db, &record.id_hex()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "SUCCESS");
        assert_eq!(rows[0].message, "SUCCESS");
        assert_eq!(rows[0].new_location, destination.display().to_string());
    }

    #[test]
    fn test_month_folder_created_on_demand() {
        let fx = Fixture::new();
        let record = fx.record("2023-03-14T09:30:00Z", 1);
        fx.write_file(&record);
        fx.provision_year("DOCS2023");
        assert!(!fx.root.join("DOCS2023").join("Mar").exists());

        fx.processor.process(&record).unwrap();

        assert!(fx.root.join("DOCS2023").join("Mar").is_dir());
    }

    #[test]
    fn test_file_missing_leaves_everything_untouched() {
        let fx = Fixture::new();
        let record = fx.record("2023-03-14T09:30:00Z", 1);
        fx.provision_year("DOCS2023");
        // No file written.

        let outcome = fx.processor.process(&record).unwrap();

        assert_eq!(outcome.status, OutcomeStatus::FileMissing);
        assert!(outcome.new_location.is_none());
        // Location update never ran.
        assert_eq!(fx.stored_location(&record), fx.staging.display().to_string());

        let rows = outcome_repo::list_for_record(&fx.db, &record.id_hex()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].new_location, NO_NEW_LOCATION);
    }

    #[test]
    fn test_root_folder_missing_never_creates_it() {
        let fx = Fixture::new();
        let record = fx.record("2023-03-14T09:30:00Z", 1);
        fx.write_file(&record);
        // DOCS2023 deliberately not provisioned.

        let outcome = fx.processor.process(&record).unwrap();

        assert_eq!(outcome.status, OutcomeStatus::RootFolderMissing);
        assert!(!fx.root.join("DOCS2023").exists());
        assert!(!fx.root.join("DOCS2023").join("Mar").exists());
        assert!(record.source_path().exists());
        assert_eq!(fx.stored_location(&record), fx.staging.display().to_string());
    }

    #[test]
    fn test_occupied_destination_is_inconsistent_state() {
        let fx = Fixture::new();
        let record = fx.record("2023-03-14T09:30:00Z", 1);
        fx.write_file(&record);
        fx.provision_year("DOCS2023");

        // Something already sits at the planned destination path.
        let destination = fx.root.join("DOCS2023").join("Mar");
        std::fs::create_dir_all(&destination).unwrap();
        std::fs::write(destination.join(record.file_name()), b"squatter").unwrap();

        let outcome = fx.processor.process(&record).unwrap();

        assert_eq!(outcome.status, OutcomeStatus::MoveFailedAfterUpdate);
        // The update already happened: database points at the destination,
        // while the file is still at its old path.
        assert_eq!(fx.stored_location(&record), destination.display().to_string());
        assert!(record.source_path().exists());

        let rows = outcome_repo::list_for_record(&fx.db, &record.id_hex()).unwrap();
        assert_eq!(rows[0].status, "MOVE_FAILED_AFTER_UPDATE");
    }

    #[test]
    fn test_existing_month_folder_is_reused() {
        let fx = Fixture::new();
        let record = fx.record("2023-03-14T09:30:00Z", 1);
        fx.write_file(&record);
        fx.provision_year("DOCS2023");
        std::fs::create_dir_all(fx.root.join("DOCS2023").join("Mar")).unwrap();

        let outcome = fx.processor.process(&record).unwrap();
        assert_eq!(outcome.status, OutcomeStatus::Success);
    }
}
