//! Document repository — reads and point updates for the `documents` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw document row from the database.
#[derive(Debug, Clone)]
pub struct DocumentRow {
    /// Record identifier as 32-char lowercase hex (also the filename stem).
    pub id: String,
    /// Directory the document file currently resides in.
    pub location: String,
    /// Creation timestamp, RFC 3339.
    pub created_on: String,
    /// Correlation key used for logging context.
    pub sequence_number: i64,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            location: row.get("location")?,
            created_on: row.get("created_on")?,
            sequence_number: row.get("sequence_number")?,
        })
    }
}

/// Inserts a new document row. Used by provisioning and tests; the batch
/// run itself never creates documents.
pub fn insert(db: &Database, document: &DocumentRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (id, location, created_on, sequence_number)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                document.id,
                document.location,
                document.created_on,
                document.sequence_number,
            ],
        )?;
        Ok(())
    })
}

/// Fetches the pending backlog: documents with no journal entry yet,
/// in sequence order. Any journaled record (success or failure) is
/// excluded, so re-runs only ever see untouched work.
pub fn fetch_pending(db: &Database) -> Result<Vec<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT d.id, d.location, d.created_on, d.sequence_number
             FROM documents d
             WHERE NOT EXISTS (
                 SELECT 1 FROM relocation_log l WHERE l.record_id = d.id
             )
             ORDER BY d.sequence_number",
        )?;
        let rows: Vec<DocumentRow> = stmt
            .query_map([], DocumentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Point update of a document's stored location. Idempotent: re-applying
/// the same value is a no-op in effect.
pub fn update_location(db: &Database, id: &str, location: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET location = ?2 WHERE id = ?1",
            params![id, location],
        )?;
        Ok(())
    })
}

/// Finds a document by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM documents WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], DocumentRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}
