// src/readers/streamreader.rs

//! Implements a [`StreamReader`], the streaming driver: a single forward
//! pass over a non-seekable byte stream with bounded buffering.
//!
//! Lines are framed in a growable buffer. Nothing is written until the
//! first line whose timestamp is at or after `start`; emission stops at
//! the first timestamp at or after `stop`. Consumed bytes are compacted
//! away whenever the consumed prefix exceeds the live suffix, so
//! worst-case residency is proportional to the longest line.

use std::io::{ErrorKind, Read, Write};

use crate::common::{Count, EpochSecs, GrepError, NLu8, ResultS3, CHUNKSZ};
use crate::data::datetime::DateTimeMatcher;

use ::memchr::memchr;
use ::more_asserts::assert_gt;
use ::si_trace_print::{defn, defo, defx};

/// [`StreamReader::slice_into`] result; the found value counts emitted
/// bytes
pub type ResultS3Slice = ResultS3<Count, GrepError>;

/// Reader of one non-seekable byte stream, typically standard input.
///
/// Frame positions satisfy `0 ≤ lbound ≤ ubound ≤ data.len()`: `lbound` is
/// the next unconsumed line start, `ubound` one past the last byte read.
pub struct StreamReader<R: Read> {
    input: R,
    /// read granularity; the buffer grows by `2 × chunksz` when the free
    /// tail is smaller than one chunk
    chunksz: usize,
    data: Vec<u8>,
    lbound: usize,
    ubound: usize,
}

impl<R: Read> StreamReader<R> {
    pub fn new(input: R) -> StreamReader<R> {
        StreamReader::with_chunksz(input, CHUNKSZ)
    }

    /// Mainly for testing; small chunks force buffer growth and
    /// compaction.
    pub fn with_chunksz(input: R, chunksz: usize) -> StreamReader<R> {
        assert_gt!(chunksz, 0, "chunksz must be non-zero");

        StreamReader {
            input,
            chunksz,
            data: Vec::new(),
            lbound: 0,
            ubound: 0,
        }
    }

    /// Frame the next line: return the length of the line beginning at
    /// `lbound`, excluding its `'\n'`, reading more of the stream as
    /// needed.
    ///
    /// [`Done`] at end of stream; a final unterminated line is not framed.
    ///
    /// [`Done`]: crate::common::ResultS3#variant.Done
    fn read_line(&mut self) -> ResultS3<usize, GrepError> {
        if let Some(at) = memchr(NLu8, &self.data[self.lbound..self.ubound]) {
            return ResultS3::Found(at);
        }
        loop {
            if self.data.len() - self.ubound < self.chunksz {
                let grow: usize = self.chunksz * 2;
                if let Err(err) = self.data.try_reserve(grow) {
                    return ResultS3::Err(GrepError::OutOfMemory(err));
                }
                let newsz: usize = self.data.len() + grow;
                self.data.resize(newsz, 0);
            }
            let actual: usize = match self
                .input
                .read(&mut self.data[self.ubound..self.ubound + self.chunksz])
            {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return ResultS3::Err(GrepError::Io(err)),
            };
            if actual == 0 {
                // end of stream
                return ResultS3::Done;
            }
            let nl: Option<usize> = memchr(NLu8, &self.data[self.ubound..self.ubound + actual]);
            self.ubound += actual;
            if let Some(at) = nl {
                return ResultS3::Found(self.ubound - actual + at - self.lbound);
            }
        }
    }

    /// Emit to `out` every line of the stream from the first line whose
    /// timestamp is at or after `start` up to, and not including, the
    /// first line whose timestamp is at or after `stop`.
    ///
    /// Once emission latches on, lines without timestamps are emitted too.
    /// The found count is the number of bytes written; [`Done`] when
    /// nothing was emitted.
    ///
    /// [`Done`]: crate::common::ResultS3#variant.Done
    pub fn slice_into<W: Write>(
        &mut self,
        start: EpochSecs,
        stop: EpochSecs,
        matcher: &DateTimeMatcher,
        out: &mut W,
    ) -> ResultS3Slice {
        defn!("(start {}, stop {})", start, stop);
        let mut emitting: bool = false;
        let mut emitted: Count = 0;
        loop {
            let length: usize = match self.read_line() {
                ResultS3::Found(len) => len,
                ResultS3::Done => break,
                ResultS3::Err(err) => return ResultS3::Err(err),
            };
            match matcher.get_timestamp(&self.data[self.lbound..self.lbound + length]) {
                ResultS3::Found(epoch) => {
                    if epoch >= stop {
                        defo!("epoch {} at or after stop; terminate emission", epoch);
                        break;
                    }
                    if !emitting && epoch >= start {
                        defo!("epoch {} at or after start; begin emission", epoch);
                        emitting = true;
                    }
                }
                ResultS3::Done => {}
                ResultS3::Err(err) => return ResultS3::Err(err),
            }
            if emitting {
                // the line and its '\n'
                if let Err(err) = out.write_all(&self.data[self.lbound..self.lbound + length + 1])
                {
                    return ResultS3::Err(GrepError::Io(err));
                }
                emitted += (length + 1) as Count;
            }
            self.lbound += length + 1;
            if self.ubound - self.lbound < self.lbound {
                // compact: move the live suffix to the front
                self.data.copy_within(self.lbound..self.ubound, 0);
                self.ubound -= self.lbound;
                self.lbound = 0;
            }
        }
        defx!("emitted {}", emitted);

        match emitted {
            0 => ResultS3::Done,
            _ => ResultS3::Found(emitted),
        }
    }
}
