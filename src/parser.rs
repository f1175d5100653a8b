//! CSV ingestion for traffic-sensor exports.
//!
//! Every data row is turned into a [`Record`] or a [`RejectReason`]; the
//! outcomes are folded into an [`Ingested`] batch. Only file-level failures
//! (missing file, undecodable content) abort ingestion.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of rejected rows kept for display unless configured otherwise.
pub const DEFAULT_SAMPLE_LIMIT: usize = 3;

/// One accepted input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: String,
    pub traffic_volume: i64,
    pub rainfall: f64,
    pub snowfall: f64,
}

/// Where the traffic volume lives in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeColumn {
    /// The final field of the row, whatever its width.
    Last,
    Index(usize),
}

/// Column positions of the fields we extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub timestamp: usize,
    pub rainfall: usize,
    pub snowfall: usize,
    pub volume: VolumeColumn,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            timestamp: 0,
            rainfall: 9,
            snowfall: 10,
            volume: VolumeColumn::Last,
        }
    }
}

impl ColumnLayout {
    /// Rows narrower than this are rejected before any field is read.
    pub fn min_fields(&self) -> usize {
        let volume = match self.volume {
            VolumeColumn::Last => 0,
            VolumeColumn::Index(i) => i,
        };
        self.timestamp
            .max(self.rainfall)
            .max(self.snowfall)
            .max(volume)
            + 1
    }
}

/// Why a single row was not accepted.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum RejectReason {
    #[error("row has {found} fields, expected at least {required}")]
    TooFewFields { found: usize, required: usize },
    #[error("traffic volume {0:?} is not an integer")]
    InvalidVolume(String),
    #[error("rainfall {0:?} is not a number")]
    InvalidRainfall(String),
    #[error("snowfall {0:?} is not a number")]
    InvalidSnowfall(String),
}

/// A rejected row kept for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    /// 1-based line in the source file.
    pub line: u64,
    pub reason: RejectReason,
    pub fields: Vec<String>,
}

/// Result of reading one file.
#[derive(Debug, Default)]
pub struct Ingested {
    pub records: Vec<Record>,
    pub rows_read: usize,
    pub rejected: usize,
    pub samples: Vec<RejectedRow>,
    /// Empty lines the CSV reader passed over; they are not data rows.
    pub blank_lines: usize,
}

/// Failures that stop the run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file not found: {}. Please check the file location.", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("the file format of {} is incorrect: missing header row", path.display())]
    MissingHeader { path: PathBuf },
    #[error("the file format of {} is incorrect or corrupted: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Extracts a [`Record`] from a raw row.
pub fn parse_row(row: &StringRecord, layout: &ColumnLayout) -> Result<Record, RejectReason> {
    let required = layout.min_fields();
    if row.len() < required {
        return Err(RejectReason::TooFewFields {
            found: row.len(),
            required,
        });
    }

    // The width guard above makes every fixed index readable.
    let field = |i: usize| row.get(i).unwrap_or_default();
    let volume_index = match layout.volume {
        VolumeColumn::Last => row.len() - 1,
        VolumeColumn::Index(i) => i,
    };

    let raw_volume = field(volume_index);
    let traffic_volume = raw_volume
        .trim()
        .parse::<i64>()
        .map_err(|_| RejectReason::InvalidVolume(raw_volume.to_string()))?;

    let raw_rain = field(layout.rainfall);
    let rainfall = raw_rain
        .trim()
        .parse::<f64>()
        .map_err(|_| RejectReason::InvalidRainfall(raw_rain.to_string()))?;

    let raw_snow = field(layout.snowfall);
    let snowfall = raw_snow
        .trim()
        .parse::<f64>()
        .map_err(|_| RejectReason::InvalidSnowfall(raw_snow.to_string()))?;

    Ok(Record {
        timestamp: field(layout.timestamp).to_string(),
        traffic_volume,
        rainfall,
        snowfall,
    })
}

impl Ingested {
    /// Adds one row outcome, keeping at most `sample_limit` rejection samples.
    fn absorb(
        mut self,
        line: u64,
        row: &StringRecord,
        outcome: Result<Record, RejectReason>,
        sample_limit: usize,
    ) -> Self {
        self.rows_read += 1;
        match outcome {
            Ok(record) => self.records.push(record),
            Err(reason) => {
                debug!(line, %reason, "Row rejected");
                self.rejected += 1;
                if self.samples.len() < sample_limit {
                    self.samples.push(RejectedRow {
                        line,
                        reason,
                        fields: row.iter().map(str::to_string).collect(),
                    });
                }
            }
        }
        self
    }
}

/// Remembers the final byte handed to the CSV reader.
struct LastByte<R> {
    inner: R,
    last: Option<u8>,
}

impl<R: Read> Read for LastByte<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.last = Some(buf[n - 1]);
        }
        Ok(n)
    }
}

/// Newlines consumed by the reader that belong to no header or data row.
///
/// `newlines` is every `\n` seen, `logical_lines` the header plus data rows,
/// and `embedded` the newlines inside quoted fields.
fn blank_line_count(
    newlines: u64,
    logical_lines: usize,
    embedded: usize,
    ends_with_newline: bool,
) -> usize {
    let terminated = if ends_with_newline {
        logical_lines
    } else {
        logical_lines.saturating_sub(1)
    };
    (newlines as usize).saturating_sub(terminated + embedded)
}

/// Reads CSV data with a header row from any reader.
///
/// `path` is only used to label errors.
pub fn read_records<R: Read>(
    reader: R,
    path: &Path,
    layout: &ColumnLayout,
    sample_limit: usize,
) -> Result<Ingested, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(LastByte {
            inner: reader,
            last: None,
        });

    let corrupt = |source| IngestError::Corrupt {
        path: path.to_path_buf(),
        source,
    };

    let headers = rdr.headers().map_err(corrupt)?;
    if headers.is_empty() {
        return Err(IngestError::MissingHeader {
            path: path.to_path_buf(),
        });
    }
    debug!(columns = headers.len(), "Header row read");
    let mut embedded = headers.as_slice().matches('\n').count();

    let mut ingested = Ingested::default();
    for result in rdr.records() {
        let row = result.map_err(corrupt)?;
        embedded += row.as_slice().matches('\n').count();
        let line = row.position().map_or(0, |p| p.line());
        let outcome = parse_row(&row, layout);
        ingested = ingested.absorb(line, &row, outcome, sample_limit);
    }

    // Line numbering starts at 1, so the final line is one past the newline count.
    let newlines = rdr.position().line().saturating_sub(1);
    ingested.blank_lines = blank_line_count(
        newlines,
        ingested.rows_read + 1,
        embedded,
        rdr.get_ref().last == Some(b'\n'),
    );

    Ok(ingested)
}

/// Opens `path` and ingests it. The file handle is dropped before returning.
#[tracing::instrument(skip(path, layout), fields(path = %path.display()))]
pub fn load_file(
    path: &Path,
    layout: &ColumnLayout,
    sample_limit: usize,
) -> Result<Ingested, IngestError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => IngestError::NotFound {
            path: path.to_path_buf(),
        },
        _ => IngestError::Open {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let ingested = read_records(file, path, layout, sample_limit)?;

    info!(
        rows_read = ingested.rows_read,
        accepted = ingested.records.len(),
        rejected = ingested.rejected,
        blank_lines = ingested.blank_lines,
        "Ingestion complete"
    );
    if ingested.rejected > 0 {
        warn!(rejected = ingested.rejected, "Rows skipped due to formatting errors");
    }

    Ok(ingested)
}
