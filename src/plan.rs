//! Splitting a file into row-aligned byte ranges, one per worker.

use std::{
    io::{self, Read, Seek, SeekFrom},
    num::NonZeroUsize,
    path::Path,
};

use tracing::{debug, trace};

use crate::{
    config::Limits,
    error::{Error, Result, Token},
};

/// Half-open `[start, end)` span of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Random-access reads used to look for a line break near a naive split point.
pub trait Probe {
    /// Fill `buf` from `offset`, stopping early only at end of input.
    /// Returns the number of bytes written.
    fn probe(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;
}

impl Probe for &[u8] {
    fn probe(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.len());
        let src = &self[start..];
        let n = src.len().min(buf.len());
        buf[..n].copy_from_slice(&src[..n]);
        Ok(n)
    }
}

/// Probes any seekable reader; `path` only labels errors.
pub struct SeekProbe<'p, R> {
    inner: R,
    path: &'p Path,
}

impl<'p, R: Read + Seek> SeekProbe<'p, R> {
    pub fn new(inner: R, path: &'p Path) -> Self {
        SeekProbe { inner, path }
    }

    fn fill(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read + Seek> Probe for SeekProbe<'_, R> {
    fn probe(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.fill(offset, buf)
            .map_err(|e| Error::file_access(self.path, e))
    }
}

/// Plan at most `workers` contiguous ranges covering `[0, file_size)`.
///
/// Every interior boundary sits right after a `\n`. A boundary may land on
/// `file_size` itself, which leaves a zero-length tail range.
///
/// Fails with [`Error::ParseOverflow`] when a probe window of
/// [`Limits::probe_window`] bytes holds no line break but more input follows,
/// since that means a row is longer than the limits allow.
pub fn plan<P: Probe>(
    probe: &mut P,
    file_size: u64,
    workers: NonZeroUsize,
    limits: &Limits,
) -> Result<Vec<ByteRange>> {
    let naive = file_size / workers.get() as u64;
    let mut window = vec![0u8; limits.probe_window()];
    let mut ranges = Vec::with_capacity(workers.get());

    let mut start = 0;
    let mut offset = 0;
    loop {
        offset += naive;
        if offset >= file_size {
            ranges.push(ByteRange {
                start,
                end: file_size,
            });
            break;
        }

        let n = probe.probe(offset, &mut window)?;
        match window[..n].iter().position(|&b| b == b'\n') {
            Some(p) => {
                offset += p as u64 + 1;
                trace!(start, end = offset, "planned range");
                ranges.push(ByteRange { start, end: offset });
                start = offset;
            }
            None if offset + n as u64 >= file_size => {
                ranges.push(ByteRange {
                    start,
                    end: file_size,
                });
                break;
            }
            None => {
                return Err(Error::ParseOverflow {
                    offset,
                    token: Token::Row,
                    limit: window.len(),
                })
            }
        }
    }

    debug!(
        file_size,
        requested = workers.get(),
        planned = ranges.len(),
        "planned byte ranges"
    );
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn workers(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn plan_bytes(data: &[u8], n: usize) -> Result<Vec<ByteRange>> {
        let mut probe = data;
        plan(&mut probe, data.len() as u64, workers(n), &Limits::DEFAULT)
    }

    fn assert_aligned(data: &[u8], ranges: &[ByteRange]) {
        assert_eq!(ranges.first().map(|r| r.start), Some(0));
        assert_eq!(ranges.last().map(|r| r.end), Some(data.len() as u64));
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for r in ranges {
            assert!(r.start <= r.end);
            if r.end != data.len() as u64 {
                assert_eq!(data[r.end as usize - 1], b'\n');
            }
        }
    }

    #[test]
    fn single_worker_covers_everything_without_probing() {
        struct Untouchable;
        impl Probe for Untouchable {
            fn probe(&mut self, _: u64, _: &mut [u8]) -> Result<usize> {
                panic!("single worker must not probe");
            }
        }

        let ranges = plan(&mut Untouchable, 1234, workers(1), &Limits::DEFAULT).unwrap();
        assert_eq!(ranges, vec![ByteRange { start: 0, end: 1234 }]);
    }

    #[test]
    fn empty_file_is_one_empty_range() {
        let ranges = plan_bytes(b"", 4).unwrap();
        assert_eq!(ranges, vec![ByteRange { start: 0, end: 0 }]);
        assert!(ranges[0].is_empty());
    }

    #[test]
    fn boundaries_move_past_the_next_line_break() {
        let data = b"A;1.0\nB;2.0\nC;3.0\nD;4.0\n";
        let ranges = plan_bytes(data, 2).unwrap();
        assert_eq!(
            ranges,
            vec![
                ByteRange { start: 0, end: 18 },
                ByteRange { start: 18, end: 24 },
            ]
        );
    }

    #[test]
    fn boundary_at_file_end_leaves_an_empty_tail() {
        let data = b"A;1.0\nB;2.0\n";
        let ranges = plan_bytes(data, 2).unwrap();
        assert_eq!(
            ranges,
            vec![
                ByteRange { start: 0, end: 12 },
                ByteRange { start: 12, end: 12 },
            ]
        );
        assert_aligned(data, &ranges);
    }

    #[test]
    fn missing_trailing_line_break_ends_at_file_size() {
        let data = b"A;1.0\nB;2.0";
        let ranges = plan_bytes(data, 2).unwrap();
        assert_eq!(ranges.last().unwrap().end, data.len() as u64);
        assert_aligned(data, &ranges);
    }

    #[test]
    fn more_workers_than_bytes_still_splits_on_rows() {
        let data = b"A;1.0\nB;2.0\nC;3.0\n";
        let ranges = plan_bytes(data, 64).unwrap();
        assert_aligned(data, &ranges);
        assert!(ranges.len() <= 4);
    }

    #[test]
    fn overlong_row_is_reported() {
        let limits = Limits {
            max_key_len: 4,
            max_value_len: 5,
        };
        let mut data = b"A;1.0\n".to_vec();
        data.extend(std::iter::repeat(b'x').take(40));
        data.extend_from_slice(b";1.0\nB;2.0\n");

        let err = plan(
            &mut data.as_slice(),
            data.len() as u64,
            workers(4),
            &limits,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::ParseOverflow {
                token: Token::Row,
                limit: 11,
                ..
            }
        ));
    }

    #[test]
    fn seek_probe_reads_windows_from_a_reader() {
        let data = b"A;1.0\nB;2.0\nC;3.0\nD;4.0\n".to_vec();
        let len = data.len() as u64;
        let mut probe = SeekProbe::new(Cursor::new(data), Path::new("mem"));
        let ranges = plan(&mut probe, len, workers(2), &Limits::DEFAULT).unwrap();
        assert_eq!(ranges[0], ByteRange { start: 0, end: 18 });
    }

    fn arb_file() -> impl Strategy<Value = Vec<u8>> {
        let row = ("[a-z]{1,12}", -999i64..=999)
            .prop_map(|(k, v)| format!("{k};{}\n", crate::itoa::format(v)));
        (prop::collection::vec(row, 0..60), any::<bool>()).prop_map(|(rows, trim)| {
            let mut data = rows.concat().into_bytes();
            if trim {
                data.pop();
            }
            data
        })
    }

    proptest! {
        #[test]
        fn ranges_tile_the_file_on_row_boundaries(data in arb_file(), n in 1usize..16) {
            let ranges = plan_bytes(&data, n).unwrap();
            prop_assert!(!ranges.is_empty());
            prop_assert!(ranges.len() <= n);
            assert_aligned(&data, &ranges);

            let joined: Vec<u8> = ranges
                .iter()
                .flat_map(|r| data[r.start as usize..r.end as usize].iter().copied())
                .collect();
            prop_assert_eq!(joined, data);
        }
    }
}
