// src/tests/common.rs

//! shared test data and helpers

#![allow(non_upper_case_globals)]

use crate::common::EpochSecs;
use crate::data::datetime::{resolve_format, DateTimeMatcher};

/// 2020-01-01 00:00:00 UTC
pub const EPOCH_20200101: EpochSecs = 1577836800;
/// 2020-01-01 12:00:00 UTC
pub const EPOCH_20200101_1200: EpochSecs = EPOCH_20200101 + 12 * 3600;
/// 2020-06-01 00:00:00 UTC
pub const EPOCH_20200601: EpochSecs = 1590969600;

/// compile a named or literal format with the given default offset,
/// panicking on failure (test setup only)
pub fn matcher(format: &str, tz_default: i32) -> DateTimeMatcher {
    let format: &str = resolve_format(format).unwrap_or(format);
    DateTimeMatcher::compile(format, tz_default)
        .unwrap_or_else(|err| panic!("compile {:?} failed: {}", format, err))
}

/// a `default`-format log of one line per minute starting at
/// 2020-01-01 12:00:00, as bytes plus the byte offset of each line
pub fn minute_log(minutes: u32) -> (Vec<u8>, Vec<usize>) {
    let mut data: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::with_capacity(minutes as usize);
    for minute in 0..minutes {
        offsets.push(data.len());
        data.extend_from_slice(
            format!("2020-01-01 12:{:02}:00 GET /index.html\n", minute).as_bytes(),
        );
    }

    (data, offsets)
}
