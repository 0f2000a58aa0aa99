//! Destination layout planning.
//!
//! Computes the year/month folder pair a document belongs under. Pure
//! computation: no filesystem access, no failure modes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, FixedOffset};

/// Prefix of the pre-provisioned top-level year folders, e.g. `DOCS2023`.
pub const YEAR_FOLDER_PREFIX: &str = "DOCS";

/// Fixed month-folder table. Folder names must be byte-identical across
/// environments, so the runtime locale is never consulted.
const MONTH_FOLDERS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// The planned destination for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPlan {
    pub year_folder: String,
    pub month_folder: &'static str,
}

impl DestinationPlan {
    /// The pre-provisioned year folder under the share root.
    pub fn year_directory(&self, root: &Path) -> PathBuf {
        root.join(&self.year_folder)
    }

    /// Full destination directory under the share root.
    pub fn directory(&self, root: &Path) -> PathBuf {
        root.join(&self.year_folder).join(self.month_folder)
    }
}

/// Plans the destination folders for a document created at the given time.
///
/// The year and month come from the timestamp's own calendar fields. Records
/// carry their original offset, and the folder has to match what the record
/// says, not a UTC rendering of it.
pub fn plan(created_on: &DateTime<FixedOffset>) -> DestinationPlan {
    DestinationPlan {
        year_folder: format!("{}{}", YEAR_FOLDER_PREFIX, created_on.year()),
        month_folder: MONTH_FOLDERS[created_on.month0() as usize],
    }
}
