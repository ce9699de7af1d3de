/// Slots in the fixed day-of-year calendar (Feb 29 excluded)
pub const DAYS_PER_YEAR: usize = 365;

/// Detection defaults
pub const DEFAULT_WINDOW_SIZE: usize = 15;
pub const DEFAULT_UPPER_PERCENTILE: f64 = 90.0;
pub const DEFAULT_LOWER_PERCENTILE: f64 = 10.0;
pub const DEFAULT_MIN_DURATION: usize = 3;

/// Column names used for derived baseline variables
pub const RANGE_COLUMN: &str = "__range";
pub const DIFFERENCE_COLUMN: &str = "__abs_difference";

/// Input parsing
pub const DATE_COLUMN_CANDIDATES: &[&str] = &["DATE", "date", "Date", "data", "DATA"];
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%d/%m/%Y", "%Y/%m/%d"];
pub const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "-9999"];

/// Integrity checks
pub const DEFAULT_JUMP_THRESHOLD: f64 = 20.0;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
