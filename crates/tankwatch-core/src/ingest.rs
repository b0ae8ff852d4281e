//! CSV ingestion of the sensor log.
//!
//! The sensor log is a comma-separated file with one header line followed by
//! `timestamp,tank_id,ph,temperature` rows. Parsing is tolerant: a row with a
//! missing or empty field, or a field that does not parse, is dropped and
//! counted instead of failing the whole load.
//!
//! Raw text comes from a [`Transport`]. The file and HTTP transports are
//! available behind the `fs` and `http` features; [`StaticTransport`] serves
//! text that is already in memory (tests, the WASM front-end).
//!
//! # Example
//!
//! ```
//! use tankwatch_core::ingest::parse_csv;
//! use time::UtcOffset;
//!
//! let text = "timestamp,tank,ph,temp\n\
//!             2025-01-01T10:00:00Z,1,7.0,25.0\n\
//!             2025-01-01T10:01:00Z,1,7.1,\n";
//! let parsed = parse_csv(text, UtcOffset::UTC).unwrap();
//! assert_eq!(parsed.records.len(), 1);
//! assert_eq!(parsed.dropped, 1);
//! ```

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::{debug, info, warn};

use tankwatch_types::{SensorRecord, TankId};

use crate::error::Result;
#[cfg(any(feature = "fs", feature = "http"))]
use crate::error::Error;
use crate::store::Store;

/// Result of parsing a sensor log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLog {
    /// Parsed records, sorted by timestamp.
    pub records: Vec<SensorRecord>,
    /// Number of data rows that were dropped.
    pub dropped: usize,
}

/// Parse a sensor log.
///
/// The first line is a header and is discarded. Timestamps without an offset
/// are interpreted in `local_offset`. The result is stable-sorted by timestamp.
///
/// Only an unreadable header is an error; bad data rows are dropped.
pub fn parse_csv(text: &str, local_offset: UtcOffset) -> Result<ParsedLog> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    reader.headers()?;

    let mut parsed = ParsedLog::default();
    for (index, row) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                debug!("Dropping unreadable row at line {}: {}", line, e);
                parsed.dropped += 1;
                continue;
            }
        };
        match parse_row(&row, local_offset) {
            Some(record) => parsed.records.push(record),
            None => {
                debug!("Dropping malformed row at line {}: {:?}", line, row);
                parsed.dropped += 1;
            }
        }
    }

    parsed.records.sort_by_key(|r| r.timestamp);
    Ok(parsed)
}

fn parse_row(row: &csv::StringRecord, local_offset: UtcOffset) -> Option<SensorRecord> {
    let field = |i: usize| row.get(i).filter(|f| !f.is_empty());

    let timestamp = parse_timestamp(field(0)?, local_offset)?;
    let tank_id = field(1)?.parse::<u32>().ok().map(TankId)?;
    let ph = field(2)?.parse::<f64>().ok().filter(|v| v.is_finite())?;
    let temperature = field(3)?.parse::<f64>().ok().filter(|v| v.is_finite())?;

    Some(SensorRecord {
        timestamp,
        tank_id,
        ph,
        temperature,
    })
}

/// Parse a log timestamp.
///
/// Accepts RFC 3339 (`2025-01-01T10:00:00+09:00`), ISO-8601 without offset
/// using either `T` or a space as separator (`2025-01-01 10:00:00`, optional
/// fractional seconds, optional seconds), and bare dates (`2025-01-01`, read
/// as midnight). Values without an offset are taken to be in `local_offset`.
///
/// ```
/// use tankwatch_core::ingest::parse_timestamp;
/// use time::macros::{datetime, offset};
///
/// let ts = parse_timestamp("2025-01-01 10:00:00", offset!(+9)).unwrap();
/// assert_eq!(ts, datetime!(2025-01-01 10:00:00 +9));
///
/// let ts = parse_timestamp("2025-01-01T01:00:00Z", offset!(+9)).unwrap();
/// assert_eq!(ts, datetime!(2025-01-01 10:00:00 +9));
/// ```
pub fn parse_timestamp(s: &str, local_offset: UtcOffset) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(ts);
    }

    let normalized = s.replacen('T', " ", 1);
    let naive = PrimitiveDateTime::parse(
        &normalized,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &normalized,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &normalized,
            format_description!("[year]-[month]-[day] [hour]:[minute]"),
        )
    })
    .or_else(|_| {
        Date::parse(&normalized, format_description!("[year]-[month]-[day]"))
            .map(|d| d.midnight())
    })
    .ok()?;

    Some(naive.assume_offset(local_offset))
}

/// A source of raw sensor log text.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the whole log as text.
    async fn fetch(&self) -> Result<String>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// Serves text that is already in memory.
#[derive(Debug, Clone)]
pub struct StaticTransport {
    text: String,
}

impl StaticTransport {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn fetch(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory log ({} bytes)", self.text.len())
    }
}

/// Reads the log from a local file.
#[cfg(feature = "fs")]
#[derive(Debug, Clone)]
pub struct FileTransport {
    path: PathBuf,
}

#[cfg(feature = "fs")]
impl FileTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(feature = "fs")]
#[async_trait]
impl Transport for FileTransport {
    async fn fetch(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| Error::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fetches the log over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Where the sensor log lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Local file path.
    Path(PathBuf),
    /// HTTP or HTTPS URL.
    Url(String),
}

impl Source {
    /// Classify a location string: `http://` and `https://` are URLs,
    /// anything else is a file path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::Path(PathBuf::from(location))
        }
    }

    /// Build the transport for this source.
    ///
    /// Returns an error when the needed transport feature is disabled.
    pub fn transport(&self) -> Result<Box<dyn Transport>> {
        match self {
            #[cfg(feature = "fs")]
            Source::Path(path) => Ok(Box::new(FileTransport::new(path.clone()))),
            #[cfg(feature = "http")]
            Source::Url(url) => Ok(Box::new(HttpTransport::new(url.clone()))),
            #[allow(unreachable_patterns)]
            other => Err(crate::error::Error::InvalidConfig(format!(
                "no transport compiled in for {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

/// Fetch and parse the sensor log.
pub async fn load(transport: &dyn Transport, local_offset: UtcOffset) -> Result<Vec<SensorRecord>> {
    let text = transport.fetch().await?;
    let parsed = parse_csv(&text, local_offset)?;
    info!(
        "Loaded {} sensor records from {} ({} rows dropped)",
        parsed.records.len(),
        transport.describe(),
        parsed.dropped
    );
    Ok(parsed.records)
}

/// Load the sensor log and swap it into `store`.
///
/// On failure the store keeps its previous contents. Returns the number of
/// records now in the store.
pub async fn ingest(store: &Store, transport: &dyn Transport, local_offset: UtcOffset) -> Result<usize> {
    let records = load(transport, local_offset).await?;
    let count = records.len();
    store.replace(records);
    Ok(count)
}

/// Like [`ingest`], but logs the error instead of returning it.
///
/// This is the dashboard's recovery policy: a failed load leaves the charts
/// empty and raises no alerts.
pub async fn ingest_or_log(store: &Store, transport: &dyn Transport, local_offset: UtcOffset) -> usize {
    match ingest(store, transport, local_offset).await {
        Ok(count) => count,
        Err(e) => {
            warn!("Failed to load sensor data from {}: {}", transport.describe(), e);
            store.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    const LOG: &str = "timestamp,tanknumber,pH_Value,temp_Value\n\
        2025-01-01 10:02:00,1,7.2,25.5\n\
        2025-01-01 10:00:00,1,7.0,25.0\n\
        2025-01-01 10:01:00,2,6.8,24.0\n";

    #[test]
    fn test_parse_sorts_by_timestamp() {
        let parsed = parse_csv(LOG, UtcOffset::UTC).unwrap();
        assert_eq!(parsed.dropped, 0);
        let phs: Vec<f64> = parsed.records.iter().map(|r| r.ph).collect();
        assert_eq!(phs, vec![7.0, 6.8, 7.2]);
        assert_eq!(parsed.records[1].tank_id, TankId(2));
    }

    #[test]
    fn test_row_missing_temperature_is_dropped() {
        let text = format!("{}2025-01-01 10:03:00,1,7.1,\n2025-01-01 10:04:00,1,7.1\n", LOG);
        let parsed = parse_csv(&text, UtcOffset::UTC).unwrap();
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.dropped, 2);
    }

    #[test]
    fn test_unparseable_fields_are_dropped() {
        let text = "h\nnot-a-date,1,7,25\n2025-01-01 10:00:00,x,7,25\n2025-01-01 10:00:00,1,NaN,25\n";
        let parsed = parse_csv(text, UtcOffset::UTC).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.dropped, 3);
    }

    #[test]
    fn test_header_only_and_empty_input() {
        assert!(parse_csv("timestamp,tank,ph,temp\n", UtcOffset::UTC).unwrap().records.is_empty());
        assert_eq!(parse_csv("", UtcOffset::UTC).unwrap(), ParsedLog::default());
    }

    #[test]
    fn test_crlf_and_whitespace_tolerated() {
        let text = "timestamp,tank,ph,temp\r\n2025-01-01T10:00:00Z, 1 , 7.0 , 25.0\r\n";
        let parsed = parse_csv(text, UtcOffset::UTC).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].temperature, 25.0);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let text = "h\n2025-01-01T10:00:00Z,1,7.0,25.0,extra\n";
        let parsed = parse_csv(text, UtcOffset::UTC).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_quotes_are_not_special() {
        let text = "h\n\"2025-01-01T10:00:00Z\",1,7.0,25.0\n";
        let parsed = parse_csv(text, UtcOffset::UTC).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.dropped, 1);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let off = offset!(+9);
        assert_eq!(
            parse_timestamp("2025-01-01T10:00", off),
            Some(datetime!(2025-01-01 10:00 +9))
        );
        assert_eq!(
            parse_timestamp("2025-01-01 10:00:00.250", off),
            Some(datetime!(2025-01-01 10:00:00.25 +9))
        );
        assert_eq!(
            parse_timestamp("2025-01-02", off),
            Some(datetime!(2025-01-02 0:00 +9))
        );
        assert_eq!(parse_timestamp("01/02/2025", off), None);
    }

    #[tokio::test]
    async fn test_ingest_replaces_store() {
        let store = Store::new();
        let count = ingest(&store, &StaticTransport::new(LOG), UtcOffset::UTC)
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.len(), 3);
    }

    #[cfg(feature = "fs")]
    #[tokio::test]
    async fn test_missing_file_keeps_store() {
        let store = Store::new();
        ingest(&store, &StaticTransport::new(LOG), UtcOffset::UTC)
            .await
            .unwrap();

        let missing = FileTransport::new("/definitely/not/here.csv");
        let err = ingest(&store, &missing, UtcOffset::UTC).await.unwrap_err();
        assert!(err.is_ingestion());
        assert_eq!(ingest_or_log(&store, &missing, UtcOffset::UTC).await, 3);
        assert_eq!(store.len(), 3);
    }

    #[cfg(feature = "fs")]
    #[tokio::test]
    async fn test_file_transport_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, LOG.as_bytes()).unwrap();
        let transport = FileTransport::new(file.path());
        let records = load(&transport, UtcOffset::UTC).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].timestamp, datetime!(2025-01-01 10:00 UTC));
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("https://example.com/sensor_Value.csv"),
            Source::Url("https://example.com/sensor_Value.csv".to_string())
        );
        assert_eq!(
            Source::parse("data/sensor_Value.csv"),
            Source::Path(PathBuf::from("data/sensor_Value.csv"))
        );
    }
}
