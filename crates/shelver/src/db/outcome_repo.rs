//! Outcome journal — append-only log of relocation attempts.
//!
//! Rows are inserted exactly once per processing attempt and never updated
//! or deleted. Operators reconcile inconsistent records (status
//! `MOVE_FAILED_AFTER_UPDATE`) by reading this table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A row in the `relocation_log` table.
#[derive(Debug, Clone)]
pub struct OutcomeRow {
    /// Autoincrement key; ignored on insert.
    pub id: i64,
    pub record_id: String,
    pub previous_location: String,
    /// Destination directory, or the `"no new location"` sentinel when no
    /// destination could be determined. Never NULL.
    pub new_location: String,
    pub status: String,
    pub message: String,
    pub sequence_number: i64,
    pub logged_at: String,
}

impl OutcomeRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            record_id: row.get("record_id")?,
            previous_location: row.get("previous_location")?,
            new_location: row.get("new_location")?,
            status: row.get("status")?,
            message: row.get("message")?,
            sequence_number: row.get("sequence_number")?,
            logged_at: row.get("logged_at")?,
        })
    }
}

/// Appends one journal entry.
pub fn insert(db: &Database, outcome: &OutcomeRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO relocation_log
             (record_id, previous_location, new_location, status, message,
              sequence_number, logged_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                outcome.record_id,
                outcome.previous_location,
                outcome.new_location,
                outcome.status,
                outcome.message,
                outcome.sequence_number,
                outcome.logged_at,
            ],
        )?;
        Ok(())
    })
}

/// All journal entries for one record, oldest first.
pub fn list_for_record(db: &Database, record_id: &str) -> Result<Vec<OutcomeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM relocation_log WHERE record_id = ?1 ORDER BY id",
        )?;
        let rows: Vec<OutcomeRow> = stmt
            .query_map(params![record_id], OutcomeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts journal entries with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM relocation_log WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_outcome(record_id: &str, status: &str) -> OutcomeRow {
        OutcomeRow {
            id: 0,
            record_id: record_id.to_string(),
            previous_location: "/var/docs/staging".to_string(),
            new_location: "/share/DOCS2023/Mar".to_string(),
            status: status.to_string(),
            message: "SUCCESS".to_string(),
            sequence_number: 1,
            logged_at: "2023-03-14T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_insert_and_list() {
        let db = test_db();
        insert(&db, &sample_outcome("r1", "SUCCESS")).unwrap();

        let rows = list_for_record(&db, "r1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "SUCCESS");
        assert_eq!(rows[0].new_location, "/share/DOCS2023/Mar");
    }

    #[test]
    fn test_journal_is_append_only() {
        let db = test_db();
        insert(&db, &sample_outcome("r1", "FILE_MISSING")).unwrap();
        insert(&db, &sample_outcome("r1", "SUCCESS")).unwrap();

        let rows = list_for_record(&db, "r1").unwrap();
        assert_eq!(rows.len(), 2);
        // Oldest first.
        assert_eq!(rows[0].status, "FILE_MISSING");
        assert_eq!(rows[1].status, "SUCCESS");
    }

    #[test]
    fn test_count_by_status() {
        let db = test_db();
        insert(&db, &sample_outcome("r1", "SUCCESS")).unwrap();
        insert(&db, &sample_outcome("r2", "SUCCESS")).unwrap();
        insert(&db, &sample_outcome("r3", "ROOT_FOLDER_MISSING")).unwrap();

        assert_eq!(count_by_status(&db, "SUCCESS").unwrap(), 2);
        assert_eq!(count_by_status(&db, "ROOT_FOLDER_MISSING").unwrap(), 1);
        assert_eq!(count_by_status(&db, "FILE_MISSING").unwrap(), 0);
    }

    #[test]
    fn test_list_for_other_record_is_empty() {
        let db = test_db();
        insert(&db, &sample_outcome("r1", "SUCCESS")).unwrap();
        assert!(list_for_record(&db, "r2").unwrap().is_empty());
    }
}
