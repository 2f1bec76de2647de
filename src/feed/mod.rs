//! Tick source: top-of-book quotes from a delimited record stream.
//!
//! ## Record Format
//!
//! ```text
//! date,time,bid_price,ask_price,bid_volume,ask_volume
//! 2023.01.02,00:00:00.123,1.20450,1.20470,1.5,2.25
//! ```
//!
//! Fields are positional. A header row is optional and off by default.
//! Ingestion stops at the first record that fails to parse or carries a
//! non-finite or negative price or volume.

use std::fs::File;
use std::io;
use std::path::Path;

use serde::Deserialize;
use tracing::trace;

use crate::types::FeedError;

/// One top-of-book observation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tick {
    pub date: String,
    pub time: String,
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_volume: f64,
    pub ask_volume: f64,
}

impl Tick {
    /// Create an undated tick
    pub fn new(bid_price: f64, bid_volume: f64, ask_price: f64, ask_volume: f64) -> Self {
        Self {
            date: String::new(),
            time: String::new(),
            bid_price,
            ask_price,
            bid_volume,
            ask_volume,
        }
    }

    /// Reject values the book cannot hold
    fn validate(&self) -> Result<(), String> {
        let fields = [
            ("bid_price", self.bid_price),
            ("ask_price", self.ask_price),
            ("bid_volume", self.bid_volume),
            ("ask_volume", self.ask_volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(format!("{name} is not finite"));
            }
            if value < 0.0 {
                return Err(format!("{name} is negative ({value})"));
            }
        }
        Ok(())
    }
}

/// Streaming tick reader over any byte source.
///
/// ## Example
///
/// ```
/// use tickbook::feed::TickReader;
///
/// let data = "2023.01.02,00:00:01,1.2745,1.2746,1.0,2.0\n";
/// let mut reader = TickReader::from_reader(data.as_bytes(), false);
///
/// let tick = reader.next().unwrap().unwrap();
/// assert_eq!(tick.ask_volume, 2.0);
/// assert!(reader.next().is_none());
/// ```
pub struct TickReader<R: io::Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,

    /// 1-based number of the last record read
    position: u64,

    /// Set after the first error; the reader yields nothing further
    halted: bool,
}

impl TickReader<File> {
    /// Open a tick file
    pub fn from_path<P: AsRef<Path>>(path: P, has_headers: bool) -> Result<Self, FeedError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file, has_headers))
    }
}

impl<R: io::Read> TickReader<R> {
    pub fn from_reader(source: R, has_headers: bool) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .trim(csv::Trim::All)
            .from_reader(source);

        Self {
            reader,
            record: csv::StringRecord::new(),
            position: 0,
            halted: false,
        }
    }

    /// Number of records read so far
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next tick.
    ///
    /// # Returns
    ///
    /// `Ok(None)` at end of input, `MalformedTick` for an unusable record
    pub fn next_tick(&mut self) -> Result<Option<Tick>, FeedError> {
        if self.halted {
            return Ok(None);
        }

        match self.read_tick() {
            Ok(tick) => Ok(tick),
            Err(err) => {
                self.halted = true;
                Err(err)
            }
        }
    }

    fn read_tick(&mut self) -> Result<Option<Tick>, FeedError> {
        let more = self
            .reader
            .read_record(&mut self.record)
            .map_err(|err| csv_error(self.position + 1, err))?;
        if !more {
            return Ok(None);
        }
        self.position += 1;

        let tick: Tick = self
            .record
            .deserialize(None)
            .map_err(|err| csv_error(self.position, err))?;
        tick.validate().map_err(|reason| FeedError::MalformedTick {
            record: self.position,
            reason,
        })?;

        trace!(record = self.position, bid = tick.bid_price, ask = tick.ask_price, "tick read");
        Ok(Some(tick))
    }
}

impl<R: io::Read> Iterator for TickReader<R> {
    type Item = Result<Tick, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_tick().transpose()
    }
}

/// I/O failures stay I/O; everything else is a bad record
fn csv_error(record: u64, err: csv::Error) -> FeedError {
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => FeedError::Io(io),
        _ => FeedError::MalformedTick { record, reason },
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
