use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::db::outcome_repo::OutcomeRow;

/// Extension every archived document file carries.
pub const DOCUMENT_EXTENSION: &str = "zip";

/// Journal value used when no destination could be determined. The log
/// column is always populated; this sentinel stands in for "none".
pub const NO_NEW_LOCATION: &str = "no new location";

/// A document record pending relocation. Immutable value; every derived
/// path is recomputed from the four essential fields.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Globally unique identifier, doubling as the on-disk filename stem.
    pub id: Uuid,
    /// Directory the file currently resides in.
    pub current_location: PathBuf,
    /// Creation timestamp; determines the destination year/month.
    pub created_on: DateTime<FixedOffset>,
    /// Correlation key used only for logging context.
    pub sequence_number: i64,
}

impl DocumentRecord {
    /// The identifier as fixed-width lowercase hex, as stored in the
    /// database and used on disk.
    pub fn id_hex(&self) -> String {
        self.id.simple().to_string()
    }

    /// `<32-char hex>.zip`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id.simple(), DOCUMENT_EXTENSION)
    }

    /// Where the file currently lives.
    pub fn source_path(&self) -> PathBuf {
        self.current_location.join(self.file_name())
    }
}

/// Terminal classification of one processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    /// Source file absent; nothing was mutated.
    FileMissing,
    /// Pre-provisioned year folder absent; nothing was mutated.
    RootFolderMissing,
    /// Filesystem error before the location update; nothing was mutated.
    StorageFailed,
    /// Location update failed; no filesystem mutation happened.
    UpdateFailed,
    /// The database already points at the new directory but the move
    /// failed. Needs manual reconciliation.
    MoveFailedAfterUpdate,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "SUCCESS",
            OutcomeStatus::FileMissing => "FILE_MISSING",
            OutcomeStatus::RootFolderMissing => "ROOT_FOLDER_MISSING",
            OutcomeStatus::StorageFailed => "STORAGE_FAILED",
            OutcomeStatus::UpdateFailed => "UPDATE_FAILED",
            OutcomeStatus::MoveFailedAfterUpdate => "MOVE_FAILED_AFTER_UPDATE",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success)
    }
}

/// The result journaled for one record's processing attempt. Created once,
/// written once, never updated.
#[derive(Debug, Clone)]
pub struct RelocationOutcome {
    pub record_id: Uuid,
    pub previous_location: String,
    /// `None` when processing stopped before a destination existed.
    pub new_location: Option<String>,
    pub status: OutcomeStatus,
    pub message: String,
    pub sequence_number: i64,
}

impl RelocationOutcome {
    fn new(
        record: &DocumentRecord,
        new_location: Option<String>,
        status: OutcomeStatus,
        message: String,
    ) -> Self {
        Self {
            record_id: record.id,
            previous_location: record.current_location.display().to_string(),
            new_location,
            status,
            message,
            sequence_number: record.sequence_number,
        }
    }

    pub fn success(record: &DocumentRecord, destination: &Path) -> Self {
        Self::new(
            record,
            Some(destination.display().to_string()),
            OutcomeStatus::Success,
            "SUCCESS".to_string(),
        )
    }

    pub fn file_missing(record: &DocumentRecord) -> Self {
        Self::new(
            record,
            None,
            OutcomeStatus::FileMissing,
            format!(
                "Source file not found at '{}'",
                record.source_path().display()
            ),
        )
    }

    pub fn root_folder_missing(record: &DocumentRecord, year_directory: &Path) -> Self {
        Self::new(
            record,
            None,
            OutcomeStatus::RootFolderMissing,
            format!(
                "Year folder '{}' does not exist; file skipped to avoid creating an unexpected top-level share folder",
                year_directory.display()
            ),
        )
    }

    pub fn storage_failed(
        record: &DocumentRecord,
        destination: &Path,
        error: &crate::error::StorageError,
    ) -> Self {
        Self::new(
            record,
            Some(destination.display().to_string()),
            OutcomeStatus::StorageFailed,
            error.to_string(),
        )
    }

    pub fn update_failed(
        record: &DocumentRecord,
        destination: &Path,
        error: &crate::db::DatabaseError,
    ) -> Self {
        Self::new(
            record,
            Some(destination.display().to_string()),
            OutcomeStatus::UpdateFailed,
            format!("Location update failed, file not moved: {}", error),
        )
    }

    pub fn move_failed_after_update(
        record: &DocumentRecord,
        destination: &Path,
        error: &crate::error::StorageError,
    ) -> Self {
        Self::new(
            record,
            Some(destination.display().to_string()),
            OutcomeStatus::MoveFailedAfterUpdate,
            format!(
                "Database updated but move failed, file remains at '{}': {}",
                record.source_path().display(),
                error
            ),
        )
    }

    /// Converts to a journal row. The missing-destination case is stored
    /// as the sentinel string, never NULL.
    pub fn to_row(&self) -> OutcomeRow {
        OutcomeRow {
            id: 0,
            record_id: self.record_id.simple().to_string(),
            previous_location: self.previous_location.clone(),
            new_location: self
                .new_location
                .clone()
                .unwrap_or_else(|| NO_NEW_LOCATION.to_string()),
            status: self.status.as_str().to_string(),
            message: self.message.clone(),
            sequence_number: self.sequence_number,
            logged_at: Utc::now().to_rfc3339(),
        }
    }
}
