//! Decoder for CSV results logs.
//!
//! Reads the header-first CSV layout written by common load-test tools:
//!
//! ```text
//! timeStamp,elapsed,label,responseCode,success,bytes
//! 1323787200000,100,/main,200,true,1024
//! ```
//!
//! Only `timeStamp` (epoch millis), `elapsed`, `label` and `success` are
//! required. `bytes` defaults to 0 and any other column is ignored. An empty
//! label is valid and yields a sample that matches no exact or subtree rule.

use super::sample::Sample;
use crate::utils::error::ParseError;
use chrono::{TimeZone, Utc};
use log::{debug, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Raw CSV row before validation
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "timeStamp", alias = "timestamp")]
    time_stamp: i64,

    elapsed: u64,

    label: String,

    #[serde(deserialize_with = "deserialize_flag")]
    success: bool,

    #[serde(default)]
    bytes: Option<u64>,
}

/// Lazy, forward-only stream of samples from a CSV results log
///
/// Yields `Err` at most once: after the first decode failure the reader is
/// exhausted and returns `None` for every further call.
pub struct SampleReader<R: Read> {
    records: csv::DeserializeRecordsIntoIter<R, RawRecord>,
    decoded: u64,
    failed: bool,
}

impl SampleReader<File> {
    /// Open a results log on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        debug!("Opening results log: {}", path.display());

        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> SampleReader<R> {
    pub fn new(reader: R) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader)
            .into_deserialize();

        Self {
            records,
            decoded: 0,
            failed: false,
        }
    }

    /// Number of samples successfully decoded so far
    pub fn decoded(&self) -> u64 {
        self.decoded
    }
}

impl<R: Read> Iterator for SampleReader<R> {
    type Item = Result<Sample, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = match self.records.next()? {
            Ok(raw) => to_sample(raw, self.decoded + 2),
            Err(e) => Err(ParseError::CsvError(e)),
        };

        match &result {
            Ok(_) => self.decoded += 1,
            Err(e) => {
                warn!("Stopping results log decoding: {}", e);
                self.failed = true;
            }
        }

        Some(result)
    }
}

/// Validate a raw row and convert it into a `Sample`
///
/// `line` is only used for error messages (header is line 1).
fn to_sample(raw: RawRecord, line: u64) -> Result<Sample, ParseError> {
    let timestamp = Utc
        .timestamp_millis_opt(raw.time_stamp)
        .single()
        .ok_or_else(|| ParseError::InvalidRecord {
            line,
            reason: format!("timestamp out of range: {}", raw.time_stamp),
        })?;

    Ok(Sample::new(
        timestamp,
        raw.label,
        raw.elapsed,
        raw.bytes.unwrap_or(0),
        raw.success,
    ))
}

/// Accept `true`/`false` in any case
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid success flag: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "timeStamp,elapsed,label,responseCode,success,bytes\n";

    fn read_all(data: &str) -> Vec<Result<Sample, ParseError>> {
        SampleReader::new(data.as_bytes()).collect()
    }

    #[test]
    fn test_reads_samples_in_order() {
        let data = format!(
            "{}1323787200000,100,/main,200,true,1024\n1323787200500,300,/main/sub,200,TRUE,\n",
            HEADER
        );

        let samples: Vec<Sample> = read_all(&data).into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label(), "/main");
        assert_eq!(samples[0].elapsed_millis(), 100);
        assert_eq!(samples[0].bytes(), 1024);
        assert_eq!(samples[0].timestamp().timestamp_millis(), 1323787200000);
        assert_eq!(samples[1].bytes(), 0);
        assert!(samples[1].success());
    }

    #[test]
    fn test_missing_bytes_column_defaults_to_zero() {
        let data = "timeStamp,elapsed,label,success\n1000,5,/x,false\n";
        let samples = read_all(data);

        let sample = samples[0].as_ref().unwrap();
        assert_eq!(sample.bytes(), 0);
        assert!(!sample.success());
    }

    #[test]
    fn test_stops_after_first_error() {
        let data = format!(
            "{}1000,10,/a,200,true,1\n1001,oops,/b,200,true,1\n1002,30,/c,200,true,1\n",
            HEADER
        );

        let mut reader = SampleReader::new(data.as_bytes());
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
        assert_eq!(reader.decoded(), 1);
    }

    #[test]
    fn test_invalid_flag_is_error() {
        let data = format!("{}1000,10,/a,200,maybe,1\n", HEADER);
        let samples = read_all(&data);

        assert_eq!(samples.len(), 1);
        assert!(samples[0].is_err());
    }

    #[test]
    fn test_empty_label_is_kept() {
        let data = format!("{}1000,10,,200,true,1\n1001,20,/a,200,true,1\n", HEADER);
        let samples: Vec<Sample> = read_all(&data).into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label(), "");
        assert_eq!(samples[1].label(), "/a");
    }

    #[test]
    fn test_empty_log() {
        assert!(read_all(HEADER).is_empty());
        assert!(read_all("").is_empty());
    }
}
