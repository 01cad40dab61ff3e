//! Streaming `key;value\n` tokenizer that folds rows straight into a map.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Seek, SeekFrom},
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::trace;

use crate::{
    config::{Config, Limits},
    data::{self, AggregationMap},
    error::{Error, Result, Token},
    parse::parse_scaled,
    plan::ByteRange,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadingKey,
    ReadingValue,
}

/// Incremental row parser. Bytes may be fed in arbitrarily sized pieces;
/// a row split across two calls to [`Aggregator::feed`] is stitched back
/// together in the key and value buffers, which keep their capacity
/// between rows.
pub struct Aggregator {
    map: AggregationMap,
    state: State,
    key: Vec<u8>,
    value: Vec<u8>,
    limits: Limits,
    /// Absolute offset of the next byte to be fed.
    offset: u64,
    row_start: u64,
}

impl Aggregator {
    /// `start` is the absolute offset of the first byte, used in errors.
    pub fn new(start: u64, limits: Limits) -> Self {
        Aggregator {
            map: AggregationMap::default(),
            state: State::ReadingKey,
            key: Vec::with_capacity(limits.max_key_len),
            value: Vec::with_capacity(limits.max_value_len),
            limits,
            offset: start,
            row_start: start,
        }
    }

    pub fn feed(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            match self.state {
                State::ReadingKey => {
                    let Some(at) = bytes.iter().position(|&b| b == b';' || b == b'\n') else {
                        self.push_key(bytes)?;
                        self.offset += bytes.len() as u64;
                        return Ok(());
                    };

                    self.push_key(&bytes[..at])?;
                    self.offset += at as u64 + 1;
                    if bytes[at] == b'\n' {
                        return Err(Error::malformed(self.row_start, "missing ';' delimiter"));
                    }
                    if self.key.is_empty() {
                        return Err(Error::malformed(self.row_start, "empty key"));
                    }
                    self.state = State::ReadingValue;
                    bytes = &bytes[at + 1..];
                }
                State::ReadingValue => {
                    let Some(at) = bytes.iter().position(|&b| b == b'\n') else {
                        self.push_value(bytes)?;
                        self.offset += bytes.len() as u64;
                        return Ok(());
                    };

                    self.push_value(&bytes[..at])?;
                    self.offset += at as u64 + 1;
                    self.end_row()?;
                    bytes = &bytes[at + 1..];
                }
            }
        }
        Ok(())
    }

    /// Flush a trailing row that had no terminating `\n` and hand over the map.
    pub fn finish(mut self) -> Result<AggregationMap> {
        match self.state {
            State::ReadingValue => self.end_row()?,
            State::ReadingKey if !self.key.is_empty() => {
                return Err(Error::malformed(self.row_start, "missing ';' delimiter"));
            }
            State::ReadingKey => {}
        }
        Ok(self.map)
    }

    fn push_key(&mut self, bytes: &[u8]) -> Result<()> {
        if self.key.len() + bytes.len() > self.limits.max_key_len {
            return Err(Error::ParseOverflow {
                offset: self.row_start,
                token: Token::Key,
                limit: self.limits.max_key_len,
            });
        }
        self.key.extend_from_slice(bytes);
        Ok(())
    }

    fn push_value(&mut self, bytes: &[u8]) -> Result<()> {
        if self.value.len() + bytes.len() > self.limits.max_value_len {
            return Err(Error::ParseOverflow {
                offset: self.row_start,
                token: Token::Value,
                limit: self.limits.max_value_len,
            });
        }
        self.value.extend_from_slice(bytes);
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        let reading = parse_scaled(&self.value).ok_or_else(|| {
            Error::malformed(
                self.row_start,
                format!("invalid reading {:?}", String::from_utf8_lossy(&self.value)),
            )
        })?;
        data::record(&mut self.map, &self.key, reading);

        self.key.clear();
        self.value.clear();
        self.state = State::ReadingKey;
        self.row_start = self.offset;
        Ok(())
    }
}

/// Aggregate an in-memory buffer, e.g. a memory-mapped file, in one go.
pub fn aggregate_slice(bytes: &[u8], limits: Limits) -> Result<AggregationMap> {
    let mut aggregator = Aggregator::new(0, limits);
    aggregator.feed(bytes)?;
    aggregator.finish()
}

/// Aggregate the rows of `path` lying in `range`.
///
/// The file is opened here and closed before returning, whatever the
/// outcome. Reading stops early, with [`Error::Aborted`], once `abort` is
/// raised.
pub fn aggregate_range(
    path: &Path,
    range: ByteRange,
    config: &Config,
    abort: &AtomicBool,
) -> Result<AggregationMap> {
    if range.is_empty() {
        return Ok(AggregationMap::default());
    }

    let mut file = File::open(path).map_err(|e| Error::file_access(path, e))?;
    file.seek(SeekFrom::Start(range.start))
        .map_err(|e| Error::file_access(path, e))?;
    let mut reader = BufReader::with_capacity(config.read_buffer, file.take(range.len()));

    let mut aggregator = Aggregator::new(range.start, config.limits);
    loop {
        if abort.load(Ordering::Relaxed) {
            return Err(Error::Aborted);
        }

        let buf = match reader.fill_buf() {
            Ok([]) => break,
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::file_access(path, e)),
        };
        let n = buf.len();
        aggregator.feed(buf)?;
        reader.consume(n);
    }

    let map = aggregator.finish()?;
    trace!(
        start = range.start,
        end = range.end,
        keys = map.len(),
        "range aggregated"
    );
    Ok(map)
}
