//! Raw record sources
//!
//! A source hands the reader one row of raw string fields at a time and
//! signals the end of input with `Ok(None)`. It knows nothing about schemas.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};

use super::errors::{ConfigError, SourceError};

/// One raw input row: a string per column.
pub type RawRow = Vec<String>;

/// Ordered supplier of raw rows.
pub trait RawRecordSource {
    /// Returns the next row, or `Ok(None)` once the input is exhausted.
    fn next_record(&mut self) -> Result<Option<RawRow>, SourceError>;
}

impl<S: RawRecordSource + ?Sized> RawRecordSource for Box<S> {
    fn next_record(&mut self) -> Result<Option<RawRow>, SourceError> {
        (**self).next_record()
    }
}

/// Rows held in memory.
#[derive(Debug, Clone)]
pub struct VecRecordSource {
    rows: std::vec::IntoIter<RawRow>,
}

impl VecRecordSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }

    /// Builds rows from string slices.
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|f| f.to_string()).collect())
                .collect(),
        )
    }
}

impl RawRecordSource for VecRecordSource {
    fn next_record(&mut self) -> Result<Option<RawRow>, SourceError> {
        Ok(self.rows.next())
    }
}

/// Dialect options for delimited text.
///
/// Built from the configuration keys the reader core passes through untouched:
/// `delimiter`, `quotechar`, `escapechar`, `doublequote`, `skipinitialspace`,
/// `lineterminator`, `comment` and `quoting`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvSourceOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub escape: Option<u8>,
    pub double_quote: bool,
    pub quoting: bool,
    pub trim: bool,
    pub terminator: Option<u8>,
    pub comment: Option<u8>,
}

/// `quoting` value that disables quote handling.
const QUOTE_NONE: u64 = 3;

impl Default for CsvSourceOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            escape: None,
            double_quote: true,
            quoting: true,
            trim: false,
            terminator: None,
            comment: None,
        }
    }
}

impl CsvSourceOptions {
    /// Interprets pass-through options. Unknown keys are rejected.
    pub fn from_map(options: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut opts = Self::default();

        for (key, value) in options {
            match key.as_str() {
                "delimiter" => opts.delimiter = single_byte(key, value)?,
                "quotechar" => opts.quote = single_byte(key, value)?,
                "escapechar" => opts.escape = optional_byte(key, value)?,
                "comment" => opts.comment = optional_byte(key, value)?,
                "doublequote" => opts.double_quote = boolean(key, value)?,
                "skipinitialspace" => opts.trim = boolean(key, value)?,
                "lineterminator" => {
                    opts.terminator = match value.as_str() {
                        Some("\n") | Some("\r\n") | Some("\r") => None,
                        _ => Some(single_byte(key, value)?),
                    }
                }
                "quoting" => match value.as_u64() {
                    Some(QUOTE_NONE) => opts.quoting = false,
                    Some(0..=2) => opts.quoting = true,
                    _ => return Err(invalid(key, "expected an integer from 0 to 3")),
                },
                _ => return Err(invalid(key, "unknown option")),
            }
        }

        Ok(opts)
    }

    fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(self.escape)
            .double_quote(self.double_quote)
            .quoting(self.quoting)
            .comment(self.comment)
            .trim(if self.trim {
                csv::Trim::Fields
            } else {
                csv::Trim::None
            });
        if let Some(terminator) = self.terminator {
            builder.terminator(csv::Terminator::Any(terminator));
        }
        builder
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::SourceOption {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn single_byte(key: &str, value: &Value) -> Result<u8, ConfigError> {
    match value.as_str().map(str::as_bytes) {
        Some([b]) => Ok(*b),
        _ => Err(invalid(key, "expected a single ASCII character")),
    }
}

fn optional_byte(key: &str, value: &Value) -> Result<Option<u8>, ConfigError> {
    if value.is_null() {
        return Ok(None);
    }
    single_byte(key, value).map(Some)
}

fn boolean(key: &str, value: &Value) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(key, "expected true or false"))
}

/// Delimited text parsed with the `csv` crate.
///
/// Rows may have any number of fields; length checking is the schema's job.
/// The underlying reader is dropped, closing any file, as soon as the end of
/// input is reached.
pub struct CsvRecordSource<R> {
    reader: Option<csv::Reader<R>>,
    record: csv::StringRecord,
    skipped_lines: u64,
}

impl CsvRecordSource<BufReader<File>> {
    /// Opens a file, discarding its first `skip_lines` lines.
    pub fn open(
        path: &Path,
        options: &CsvSourceOptions,
        skip_lines: usize,
    ) -> Result<Self, ConfigError> {
        let open_err = |source: io::Error| ConfigError::OpenInput {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        Self::from_reader(BufReader::new(file), options, skip_lines).map_err(open_err)
    }
}

impl<R: BufRead> CsvRecordSource<R> {
    /// Wraps a reader, discarding its first `skip_lines` lines.
    ///
    /// Lines are physical text lines, not records: a quoted field spanning
    /// lines counts once per line. Reported line numbers still count from the
    /// top of the input.
    pub fn from_reader(
        mut reader: R,
        options: &CsvSourceOptions,
        skip_lines: usize,
    ) -> io::Result<Self> {
        let mut discard = Vec::new();
        let mut skipped_lines = 0;
        for _ in 0..skip_lines {
            discard.clear();
            if reader.read_until(b'\n', &mut discard)? == 0 {
                break;
            }
            skipped_lines += 1;
        }

        Ok(Self {
            reader: Some(options.reader_builder().from_reader(reader)),
            record: csv::StringRecord::new(),
            skipped_lines,
        })
    }
}

impl<R: io::Read> RawRecordSource for CsvRecordSource<R> {
    fn next_record(&mut self) -> Result<Option<RawRow>, SourceError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        match reader.read_record(&mut self.record) {
            Ok(true) => Ok(Some(self.record.iter().map(str::to_string).collect())),
            Ok(false) => {
                self.reader = None;
                Ok(None)
            }
            Err(e) => {
                let err = match SourceError::from(e) {
                    SourceError::Malformed { line, reason } => SourceError::Malformed {
                        line: line.map(|l| l + self.skipped_lines),
                        reason,
                    },
                    other => other,
                };
                if !err.is_recoverable() {
                    self.reader = None;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    fn options(value: Value) -> Result<CsvSourceOptions, ConfigError> {
        CsvSourceOptions::from_map(value.as_object().unwrap())
    }

    fn drain<S: RawRecordSource>(source: &mut S) -> Vec<RawRow> {
        let mut rows = Vec::new();
        while let Some(row) = source.next_record().unwrap() {
            rows.push(row);
        }
        rows
    }

    #[test]
    fn test_options_from_map() {
        let opts = options(json!({"delimiter": "|", "quotechar": "'", "skipinitialspace": true})).unwrap();
        assert_eq!(opts.delimiter, b'|');
        assert_eq!(opts.quote, b'\'');
        assert!(opts.trim);
    }

    #[test]
    fn test_options_reject_unknown_and_bad_values() {
        assert!(matches!(
            options(json!({"dialect": "excel"})),
            Err(ConfigError::SourceOption { key, .. }) if key == "dialect"
        ));
        assert!(options(json!({"delimiter": "||"})).is_err());
        assert!(options(json!({"quoting": 7})).is_err());
        assert!(!options(json!({"quoting": 3})).unwrap().quoting);
    }

    #[test]
    fn test_pipe_delimited_rows() {
        let data = "1997|Ford|Mustang\n1998|Jeep|\"Grand | Cherokee\"\n";
        let opts = options(json!({"delimiter": "|"})).unwrap();
        let mut source = CsvRecordSource::from_reader(Cursor::new(data), &opts, 0).unwrap();

        let rows = drain(&mut source);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["1998", "Jeep", "Grand | Cherokee"]);
    }

    #[test]
    fn test_skips_header_lines() {
        let data = "# exported 2016\nyear,make\n1997,Ford\n";
        let mut source =
            CsvRecordSource::from_reader(Cursor::new(data), &CsvSourceOptions::default(), 2).unwrap();
        assert_eq!(drain(&mut source), vec![vec!["1997".to_string(), "Ford".to_string()]]);
    }

    #[test]
    fn test_ragged_rows_are_passed_through() {
        let data = "a,b,c\nd\n";
        let mut source =
            CsvRecordSource::from_reader(Cursor::new(data), &CsvSourceOptions::default(), 0).unwrap();
        let rows = drain(&mut source);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn test_end_is_sticky() {
        let mut source =
            CsvRecordSource::from_reader(Cursor::new("x\n"), &CsvSourceOptions::default(), 0).unwrap();
        assert!(source.next_record().unwrap().is_some());
        assert!(source.next_record().unwrap().is_none());
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_malformed_and_recoverable() {
        let data: &[u8] = b"ok,1\n\xff\xfe,2\nfine,3\n";
        let mut source =
            CsvRecordSource::from_reader(Cursor::new(data), &CsvSourceOptions::default(), 0).unwrap();

        assert!(source.next_record().unwrap().is_some());
        let err = source.next_record().unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            source.next_record().unwrap(),
            Some(vec!["fine".to_string(), "3".to_string()])
        );
    }

    #[test]
    fn test_malformed_line_counts_skipped_headers() {
        let data: &[u8] = b"header one\nheader two\nok,1\n\xff\xfe,2\n";
        let mut source =
            CsvRecordSource::from_reader(Cursor::new(data), &CsvSourceOptions::default(), 2).unwrap();

        assert!(source.next_record().unwrap().is_some());
        assert!(matches!(
            source.next_record(),
            Err(SourceError::Malformed { line: Some(4), .. })
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let result = CsvRecordSource::open(
            Path::new("/nonexistent/cars.csv"),
            &CsvSourceOptions::default(),
            0,
        );
        assert!(matches!(result, Err(ConfigError::OpenInput { .. })));
    }

    #[test]
    fn test_vec_source() {
        let mut source = VecRecordSource::from_strs(&[&["1997", "Ford"], &["1998", "Jeep"]]);
        assert_eq!(drain(&mut source).len(), 2);
    }
}
