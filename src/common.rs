// src/common.rs

//! Common imports, type aliases, result enums, and other globals for _tslib_.

use std::collections::TryReserveError;
use std::io::Error;

use ::static_assertions::const_assert;
use ::thiserror::Error as ThisError;

/// `F`ake `Path` or `F`ile `Path`.
///
/// An easier-to-pass stand-in for a formalized file system path;
/// [`std::path::Path`] is unsized and so cannot be stored by value.
pub type FPath = String;

/// a sequence of [`FPath`]s
pub type FPaths = Vec<FPath>;

/// File size in bytes
pub type FileSz = u64;

/// A general-purpose counting type, typically for internal statistics and
/// for counting emitted bytes.
pub type Count = u64;

/// Seconds since the Unix epoch; negative values are valid.
pub type EpochSecs = i64;

/// A timezone offset in seconds east of UTC.
///
/// Matches the representation of [`chrono::FixedOffset::local_minus_utc`].
///
/// [`chrono::FixedOffset::local_minus_utc`]: https://docs.rs/chrono/latest/chrono/offset/struct.FixedOffset.html#method.local_minus_utc
pub type SecsOffset = i32;

/// Single newline, as a byte. The only line delimiter recognized.
#[allow(non_upper_case_globals)]
pub const NLu8: u8 = b'\n';

/// Chunk size in bytes for emitting data and for growing the streaming
/// frame buffer.
pub const CHUNKSZ: usize = 512 * 1024;

// the release-behind arithmetic presumes whole pages per chunk
const_assert!(CHUNKSZ % 8192 == 0);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GrepError
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Every failure that aborts a run. All variants map to process exit code 2.
///
/// Line-level extraction misses are not errors; they are represented as
/// [`ResultS3::Done`] and the line is skipped.
#[derive(Debug, ThisError)]
pub enum GrepError {
    /// unterminated `%`, an `%O`/`%E` modifier, or an unknown conversion
    /// specifier in a datetime format string
    #[error("{0}")]
    MalformedFormat(String),
    /// the regex derived from the datetime format was rejected by the engine
    #[error("could not compile datetime regex: {0}")]
    RegexCompile(#[from] ::regex::Error),
    /// a `--start`/`--stop` value not parseable by the active format nor the
    /// fallback heuristics
    #[error("can not convert argument '{0}' to timestamp")]
    ParseArg(String),
    /// streaming frame buffer growth failed
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
    /// any system-level open/metadata/mmap/read/write failure
    #[error(transparent)]
    Io(#[from] Error),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// custom Results enums for various "find" functions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// [`Result`]-like result extended to 3 types.
///
/// For "find" functions that distinguish _found a datum_ from _nothing
/// there, keep going (or done)_ from _hard failure_.
///
/// [`Result`]: std::result::Result
#[derive(Debug)]
pub enum ResultS3<T, E> {
    /// Contains the found data.
    Found(T),
    /// Nothing found, or the request reached the end of the input.
    ///
    /// Does not imply an error occurred.
    Done,
    /// Something bad happened. Contains the `E` error data.
    Err(E),
}

impl<T, E> ResultS3<T, E> {
    /// Returns `true` if the result is [`Found`].
    ///
    /// [`Found`]: self::ResultS3#variant.Found
    #[inline(always)]
    pub const fn is_found(&self) -> bool {
        matches!(*self, ResultS3::Found(_))
    }

    /// Returns `true` if the result is [`Done`].
    ///
    /// [`Done`]: self::ResultS3#variant.Done
    #[inline(always)]
    pub const fn is_done(&self) -> bool {
        matches!(*self, ResultS3::Done)
    }

    /// Returns `true` if the result is [`Err`].
    ///
    /// [`Err`]: self::ResultS3#variant.Err
    #[inline(always)]
    pub const fn is_err(&self) -> bool {
        matches!(*self, ResultS3::Err(_))
    }

    /// Converts to an [`Option<T>`], discarding the other states.
    #[allow(dead_code)]
    pub fn found(self) -> Option<T> {
        match self {
            ResultS3::Found(val) => Some(val),
            _ => None,
        }
    }
}

/// [`Result`]-like result extended to 4 types.
///
/// For the line locator and the searches built upon it, which additionally
/// distinguish _the byte region holds no `'\n'` at all_ ([`Null`]) from
/// _nothing found_ ([`Done`]).
///
/// [`Result`]: std::result::Result
/// [`Null`]: self::ResultS4#variant.Null
/// [`Done`]: self::ResultS4#variant.Done
#[derive(Debug)]
pub enum ResultS4<T, E> {
    /// Contains the found data.
    Found(T),
    /// Nothing found between the probe position and the upper bound.
    ///
    /// Does not imply an error occurred.
    Done,
    /// The entire byte region is a single line without a `'\n'` delimiter;
    /// line-oriented searching is undetermined.
    Null,
    /// Something bad happened. Contains the `E` error data.
    Err(E),
}

impl<T, E> ResultS4<T, E> {
    /// Returns `true` if the result is [`Found`].
    ///
    /// [`Found`]: self::ResultS4#variant.Found
    #[inline(always)]
    pub const fn is_found(&self) -> bool {
        matches!(*self, ResultS4::Found(_))
    }

    /// Returns `true` if the result is [`Done`].
    ///
    /// [`Done`]: self::ResultS4#variant.Done
    #[inline(always)]
    pub const fn is_done(&self) -> bool {
        matches!(*self, ResultS4::Done)
    }

    /// Returns `true` if the result is [`Null`].
    ///
    /// [`Null`]: self::ResultS4#variant.Null
    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        matches!(*self, ResultS4::Null)
    }

    /// Returns `true` if the result is [`Err`].
    ///
    /// [`Err`]: self::ResultS4#variant.Err
    #[inline(always)]
    pub const fn is_err(&self) -> bool {
        matches!(*self, ResultS4::Err(_))
    }

    /// Converts to an [`Option<T>`], discarding the other states.
    #[allow(dead_code)]
    pub fn found(self) -> Option<T> {
        match self {
            ResultS4::Found(val) => Some(val),
            _ => None,
        }
    }
}
