pub mod csv_writer;
pub mod parquet_writer;

pub use csv_writer::CsvWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};

use crate::models::{MetricColumn, MetricsTable};

/// Column headers of a metrics table: `YEAR`, seasonal columns when present,
/// then the prefixed statistics.
pub fn metrics_headers(table: &MetricsTable) -> Vec<String> {
    let mut headers = vec!["YEAR".to_string()];
    if table.is_seasonal() {
        headers.push("SEASON".to_string());
        headers.push("SEASON_NAME".to_string());
    }
    headers.extend(MetricColumn::all().iter().map(|c| c.header(&table.prefix)));
    headers
}

pub(crate) const INTENSITY_HEADERS: [&str; 7] =
    ["EVENT_ID", "YEAR", "SEASON", "START", "END", "DURATION", "INTENSITY"];

pub(crate) const CLASSIFIED_HEADERS: [&str; 5] = ["DATE", "DAY", "FLAGGED", "DEVIATION", "EVENT_ID"];
