use chrono::DateTime;
use log::{info, warn};
use uuid::Uuid;

use crate::db::document_repo::{self, DocumentRow};
use crate::db::{Database, DatabaseError};
use crate::worker::record::DocumentRecord;

/// Discovers the pending backlog: every document without a journal entry,
/// in sequence order.
pub struct PendingSource {
    db: Database,
}

impl PendingSource {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Fetches and parses the backlog. Rows whose id or timestamp cannot
    /// be parsed are logged and skipped rather than failing the run; a
    /// database error here is fatal to the run (there is no work list
    /// without it).
    pub fn fetch(&self) -> Result<Vec<DocumentRecord>, DatabaseError> {
        let rows = document_repo::fetch_pending(&self.db)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match parse_record(&row) {
                Some(record) => records.push(record),
                None => warn!(
                    "Skipping malformed document row id='{}' created_on='{}'",
                    row.id, row.created_on
                ),
            }
        }

        info!("Fetched {} pending documents", records.len());
        Ok(records)
    }
}

fn parse_record(row: &DocumentRow) -> Option<DocumentRecord> {
    let id = Uuid::parse_str(&row.id).ok()?;
    let created_on = DateTime::parse_from_rfc3339(&row.created_on).ok()?;
    Some(DocumentRecord {
        id,
        current_location: row.location.clone().into(),
        created_on,
        sequence_number: row.sequence_number,
    })
}
