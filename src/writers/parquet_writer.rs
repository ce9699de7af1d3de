use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{
    DayIndex, IntensityRecord, MetricColumn, MetricsRecord, MetricsTable, SeasonBucket,
    ThresholdProfile, WaveSeries,
};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use crate::writers::{metrics_headers, CLASSIFIED_HEADERS, INTENSITY_HEADERS};

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::configuration(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    fn write_batch(&self, batch: RecordBatch, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        writer.write(&batch)?;
        writer.close()?;
        debug!("Wrote {} rows to {}", batch.num_rows(), path.display());
        Ok(())
    }

    /// Write a yearly or seasonal metrics table.
    pub fn write_metrics(&self, table: &MetricsTable, path: &Path) -> Result<()> {
        let headers = metrics_headers(table);
        let mut fields = vec![Field::new(&headers[0], DataType::Int32, false)];
        let mut columns: Vec<ArrayRef> = vec![Arc::new(Int32Array::from(
            table.rows.iter().map(|r| r.year).collect::<Vec<_>>(),
        ))];

        if table.is_seasonal() {
            fields.push(Field::new(&headers[1], DataType::Utf8, true));
            fields.push(Field::new(&headers[2], DataType::Utf8, true));
            columns.push(Arc::new(StringArray::from(
                table
                    .rows
                    .iter()
                    .map(|r| r.season.map(SeasonBucket::code))
                    .collect::<Vec<_>>(),
            )));
            columns.push(Arc::new(StringArray::from(
                table
                    .rows
                    .iter()
                    .map(|r| table.season_name(r).map(|s| s.name()))
                    .collect::<Vec<_>>(),
            )));
        }

        for column in MetricColumn::all() {
            fields.push(Field::new(column.header(&table.prefix), DataType::UInt64, false));
            columns.push(Arc::new(UInt64Array::from(
                table
                    .rows
                    .iter()
                    .map(|r| r.value(column) as u64)
                    .collect::<Vec<_>>(),
            )));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        self.write_batch(batch, path)
    }

    pub fn write_intensity(&self, records: &[IntensityRecord], path: &Path) -> Result<()> {
        let [id, year, season, start, end, duration, intensity] = INTENSITY_HEADERS;
        let schema = Schema::new(vec![
            Field::new(id, DataType::UInt64, false),
            Field::new(year, DataType::Int32, false),
            Field::new(season, DataType::Utf8, true),
            Field::new(start, DataType::Date32, false),
            Field::new(end, DataType::Date32, false),
            Field::new(duration, DataType::UInt64, false),
            Field::new(intensity, DataType::Float64, true),
        ]);

        let columns: Vec<ArrayRef> = vec![
            Arc::new(UInt64Array::from(
                records.iter().map(|r| r.event_id as u64).collect::<Vec<_>>(),
            )),
            Arc::new(Int32Array::from(records.iter().map(|r| r.year).collect::<Vec<_>>())),
            Arc::new(StringArray::from(
                records
                    .iter()
                    .map(|r| r.season.map(SeasonBucket::code))
                    .collect::<Vec<_>>(),
            )),
            Arc::new(Date32Array::from(
                records.iter().map(|r| epoch_days(r.start)).collect::<Vec<_>>(),
            )),
            Arc::new(Date32Array::from(
                records.iter().map(|r| epoch_days(r.end)).collect::<Vec<_>>(),
            )),
            Arc::new(UInt64Array::from(
                records.iter().map(|r| r.duration as u64).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                records.iter().map(|r| r.intensity).collect::<Vec<_>>(),
            )),
        ];

        let batch = RecordBatch::try_new(Arc::new(schema), columns)?;
        self.write_batch(batch, path)
    }

    pub fn write_classified(&self, waves: &WaveSeries, path: &Path) -> Result<()> {
        let [date, day, flagged, deviation, event_id] = CLASSIFIED_HEADERS;
        let schema = Schema::new(vec![
            Field::new(date, DataType::Date32, false),
            Field::new(day, DataType::UInt16, true),
            Field::new(flagged, DataType::Boolean, false),
            Field::new(deviation, DataType::Float64, true),
            Field::new(event_id, DataType::UInt64, true),
        ]);

        let columns: Vec<ArrayRef> = vec![
            Arc::new(Date32Array::from(
                waves.days.iter().map(|d| epoch_days(d.date)).collect::<Vec<_>>(),
            )),
            Arc::new(UInt16Array::from(
                waves
                    .days
                    .iter()
                    .map(|d| d.day_index.map(DayIndex::get))
                    .collect::<Vec<_>>(),
            )),
            Arc::new(BooleanArray::from(
                waves.days.iter().map(|d| d.flagged).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                waves.days.iter().map(|d| d.deviation).collect::<Vec<_>>(),
            )),
            Arc::new(UInt64Array::from(
                waves
                    .labels
                    .iter()
                    .map(|l| l.map(|id| id as u64))
                    .collect::<Vec<_>>(),
            )),
        ];

        let batch = RecordBatch::try_new(Arc::new(schema), columns)?;
        self.write_batch(batch, path)
    }

    pub fn write_profile(&self, profile: &ThresholdProfile, path: &Path) -> Result<()> {
        let mut fields = vec![Field::new("DAY", DataType::UInt16, false)];
        let mut columns: Vec<ArrayRef> = vec![Arc::new(UInt16Array::from(
            DayIndex::all().map(DayIndex::get).collect::<Vec<_>>(),
        ))];

        for role in profile.roles() {
            fields.push(Field::new(role.name().to_uppercase(), DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(
                DayIndex::all()
                    .map(|day| profile.threshold(role, day))
                    .collect::<Vec<_>>(),
            )));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        self.write_batch(batch, path)
    }

    /// Read a metrics table written by [`ParquetWriter::write_metrics`].
    pub fn read_metrics(&self, path: &Path) -> Result<Vec<MetricsRecord>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let mut records = Vec::new();

        for batch in reader {
            let batch = batch?;
            let seasonal = batch.num_columns() == 7;
            let offset = if seasonal { 3 } else { 1 };

            let years = downcast::<Int32Array>(&batch, 0, "YEAR")?;
            let seasons = if seasonal {
                Some(downcast::<StringArray>(&batch, 1, "SEASON")?)
            } else {
                None
            };
            let stats = (0..4)
                .map(|i| downcast::<UInt64Array>(&batch, offset + i, "statistic"))
                .collect::<Result<Vec<_>>>()?;

            for row in 0..batch.num_rows() {
                let season = match seasons {
                    Some(s) if s.is_valid(row) => Some(parse_bucket(s.value(row))?),
                    _ => None,
                };
                records.push(MetricsRecord {
                    year: years.value(row),
                    season,
                    count: stats[0].value(row) as usize,
                    max_duration: stats[1].value(row) as usize,
                    frequency: stats[2].value(row) as usize,
                    extreme_days: stats[3].value(row) as usize,
                });
            }
        }

        Ok(records)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Days since 1970-01-01, the Date32 encoding.
fn epoch_days(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

fn downcast<'a, T: 'static>(batch: &'a RecordBatch, index: usize, name: &str) -> Result<&'a T> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| ProcessingError::malformed(format!("Invalid {} column type", name)))
}

fn parse_bucket(code: &str) -> Result<SeasonBucket> {
    SeasonBucket::all()
        .into_iter()
        .find(|b| b.code() == code)
        .ok_or_else(|| ProcessingError::malformed(format!("unknown season '{}'", code)))
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
        )
    }
}
