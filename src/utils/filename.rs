use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

use crate::models::EventKind;

/// Output file for a table: `{dir}/{kind-prefix}-{table}-{YYMMDD}.{ext}`
pub fn output_filename(dir: &Path, kind: EventKind, table: &str, extension: &str) -> PathBuf {
    let now = Local::now();
    let filename = format!(
        "{}-{}-{:02}{:02}{:02}.{}",
        kind.prefix().to_lowercase(),
        table,
        now.year() % 100,
        now.month(),
        now.day(),
        extension
    );
    dir.join(filename)
}

/// Station identifier taken from a subject file name, e.g. `A701.csv` -> `A701`.
pub fn station_id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
