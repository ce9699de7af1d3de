use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{DayIndex, ObservationSeries};
use crate::utils::constants::{DATE_COLUMN_CANDIDATES, DATE_FORMATS, MISSING_MARKERS};

/// Reads a daily observation CSV into an [`ObservationSeries`].
///
/// One column holds dates; every other selected column must be numeric.
pub struct SeriesReader {
    date_column: Option<String>,
    day_index_column: Option<String>,
    columns: Option<Vec<String>>,
    delimiter: u8,
}

impl SeriesReader {
    pub fn new() -> Self {
        Self {
            date_column: None,
            day_index_column: None,
            columns: None,
            delimiter: b',',
        }
    }

    /// Use `name` as the date column instead of auto-detection.
    pub fn with_date_column(mut self, name: impl Into<String>) -> Self {
        self.date_column = Some(name.into());
        self
    }

    /// Read a precomputed day-of-year column.
    pub fn with_day_index_column(mut self, name: impl Into<String>) -> Self {
        self.day_index_column = Some(name.into());
        self
    }

    /// Only load these measurement columns.
    pub fn with_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn read_series(&self, path: &Path) -> Result<ObservationSeries> {
        let file = File::open(path)?;
        let series = self.read_from(file)?;
        debug!(
            "Read {} rows, {} columns from {}",
            series.len(),
            series.column_names().count(),
            path.display()
        );
        Ok(series)
    }

    pub fn read_from<R: Read>(&self, input: R) -> Result<ObservationSeries> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(input);
        let headers = reader.headers()?.clone();

        let date_idx = self.find_date_column(&headers)?;
        let day_idx = match &self.day_index_column {
            Some(name) => Some(column_position(&headers, name)?),
            None => None,
        };
        let measured = self.measurement_columns(&headers, date_idx, day_idx)?;

        let mut dates = Vec::new();
        let mut day_index = Vec::new();
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); measured.len()];

        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let row = line + 2;

            dates.push(parse_date(field(&record, date_idx), row)?);
            if let Some(idx) = day_idx {
                day_index.push(parse_day_index(field(&record, idx), row)?);
            }
            for (slot, (name, idx)) in measured.iter().enumerate() {
                values[slot].push(parse_value(field(&record, *idx), name, row)?);
            }
        }

        let mut series = ObservationSeries::new(dates);
        for ((name, _), column) in measured.into_iter().zip(values) {
            series.insert_column(name, column)?;
        }
        if day_idx.is_some() {
            series = series.with_day_index(day_index)?;
        }
        Ok(series)
    }

    fn find_date_column(&self, headers: &StringRecord) -> Result<usize> {
        if let Some(name) = &self.date_column {
            return column_position(headers, name);
        }
        DATE_COLUMN_CANDIDATES
            .iter()
            .find_map(|candidate| headers.iter().position(|h| h == *candidate))
            .ok_or_else(|| {
                ProcessingError::malformed(format!(
                    "no date column found; expected one of {:?}",
                    DATE_COLUMN_CANDIDATES
                ))
            })
    }

    fn measurement_columns(
        &self,
        headers: &StringRecord,
        date_idx: usize,
        day_idx: Option<usize>,
    ) -> Result<Vec<(String, usize)>> {
        match &self.columns {
            Some(wanted) => wanted
                .iter()
                .map(|name| Ok((name.clone(), column_position(headers, name)?)))
                .collect(),
            None => Ok(headers
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != date_idx && Some(*idx) != day_idx)
                .map(|(idx, name)| (name.to_string(), idx))
                .collect()),
        }
    }
}

impl Default for SeriesReader {
    fn default() -> Self {
        Self::new()
    }
}

fn column_position(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ProcessingError::malformed(format!("required column '{}' is missing", name)))
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn is_missing(raw: &str) -> bool {
    MISSING_MARKERS.contains(&raw)
}

/// Parse a date using the first matching format.
pub fn parse_date(raw: &str, row: usize) -> Result<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| ProcessingError::malformed(format!("row {}: unparseable date '{}'", row, raw)))
}

fn parse_value(raw: &str, column: &str, row: usize) -> Result<Option<f64>> {
    if is_missing(raw) {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| {
        ProcessingError::malformed(format!(
            "row {}: column '{}' holds non-numeric value '{}'",
            row, column, raw
        ))
    })
}

fn parse_day_index(raw: &str, row: usize) -> Result<Option<DayIndex>> {
    if is_missing(raw) {
        return Ok(None);
    }
    let day = raw.parse::<i64>().map_err(|_| {
        ProcessingError::malformed(format!("row {}: invalid day-of-year '{}'", row, raw))
    })?;
    u16::try_from(day)
        .map_err(|_| ProcessingError::Range { day_index: day })
        .and_then(DayIndex::new)
        .map(Some)
}
