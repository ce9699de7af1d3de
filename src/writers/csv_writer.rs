use csv::Writer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::models::{DayIndex, IntensityRecord, MetricColumn, MetricsTable, ThresholdProfile, WaveSeries};
use crate::writers::{metrics_headers, CLASSIFIED_HEADERS, INTENSITY_HEADERS};

/// Writes result tables as delimited text.
pub struct CsvWriter {
    delimiter: u8,
    precision: usize,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            precision: 4,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decimal places for floating point cells.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    fn writer<W: Write>(&self, out: W) -> Writer<W> {
        csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(out)
    }

    fn float(&self, value: Option<f64>) -> String {
        value
            .map(|v| format!("{:.*}", self.precision, v))
            .unwrap_or_default()
    }

    pub fn write_metrics(&self, table: &MetricsTable, path: &Path) -> Result<()> {
        self.write_metrics_to(table, File::create(path)?)?;
        debug!("Wrote {} metrics rows to {}", table.rows.len(), path.display());
        Ok(())
    }

    pub fn write_metrics_to<W: Write>(&self, table: &MetricsTable, out: W) -> Result<()> {
        let mut writer = self.writer(out);
        writer.write_record(metrics_headers(table))?;

        for row in &table.rows {
            let mut record = vec![row.year.to_string()];
            if table.is_seasonal() {
                record.push(row.season.map(|s| s.code().to_string()).unwrap_or_default());
                record.push(
                    table
                        .season_name(row)
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                );
            }
            record.extend(MetricColumn::all().iter().map(|c| (row.value(*c) as u64).to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_intensity(&self, records: &[IntensityRecord], path: &Path) -> Result<()> {
        self.write_intensity_to(records, File::create(path)?)
    }

    pub fn write_intensity_to<W: Write>(&self, records: &[IntensityRecord], out: W) -> Result<()> {
        let mut writer = self.writer(out);
        writer.write_record(INTENSITY_HEADERS)?;
        for record in records {
            writer.write_record(&[
                record.event_id.to_string(),
                record.year.to_string(),
                record.season.map(|s| s.code().to_string()).unwrap_or_default(),
                record.start.to_string(),
                record.end.to_string(),
                record.duration.to_string(),
                self.float(record.intensity),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Per-day classification with event labels.
    pub fn write_classified(&self, waves: &WaveSeries, path: &Path) -> Result<()> {
        let mut writer = self.writer(File::create(path)?);
        writer.write_record(CLASSIFIED_HEADERS)?;
        for (day, label) in waves.days.iter().zip(&waves.labels) {
            writer.write_record(&[
                day.date.to_string(),
                day.day_index.map(|d| d.to_string()).unwrap_or_default(),
                day.flagged.to_string(),
                self.float(day.deviation),
                label.map(|l| l.to_string()).unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// One row per day-of-year with a column per threshold role.
    pub fn write_profile(&self, profile: &ThresholdProfile, path: &Path) -> Result<()> {
        let roles: Vec<_> = profile.roles().collect();
        let mut writer = self.writer(File::create(path)?);

        let mut headers = vec!["DAY".to_string()];
        headers.extend(roles.iter().map(|r| r.name().to_uppercase()));
        writer.write_record(&headers)?;

        for day in DayIndex::all() {
            let mut record = vec![day.to_string()];
            record.extend(roles.iter().map(|r| self.float(profile.threshold(*r, day))));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Full-precision JSON form, readable by `ProfileReader`.
    pub fn write_profile_json(&self, profile: &ThresholdProfile, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, profile)?;
        out.flush()?;
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
