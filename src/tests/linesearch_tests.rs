// src/tests/linesearch_tests.rs

//! tests for `linesearch.rs` functions

use crate::common::ResultS4;
use crate::data::datetime::DateTimeMatcher;
use crate::debug::printers::buffer_to_String_noraw;
use crate::readers::linesearch::{binary_search, find_line, forward_search};
use crate::tests::common::{matcher, minute_log, EPOCH_20200101_1200};

use ::test_case::test_case;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// find_line
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test_case(b"abc\ndef\nghi", 0, Some((0, 3)); "first line start")]
#[test_case(b"abc\ndef\nghi", 2, Some((0, 3)); "first line end")]
#[test_case(b"abc\ndef\nghi", 4, Some((4, 3)); "middle line start")]
#[test_case(b"abc\ndef\nghi", 6, Some((4, 3)); "middle line inside")]
#[test_case(b"abc\ndef\nghi", 8, Some((8, 3)); "terminal line without newline")]
#[test_case(b"abc\ndef\nghi", 10, Some((8, 3)); "terminal line last byte")]
#[test_case(b"abc\ndef\nghi\n", 8, Some((8, 3)); "terminal line with newline")]
#[test_case(b"\nabc", 1, Some((1, 3)); "after leading newline")]
#[test_case(b"a\n", 0, Some((0, 1)); "single delimited line")]
#[test_case(b"\n\n", 1, None; "empty lines only")]
fn test_find_line_found(data: &[u8], position: usize, expect: Option<(usize, usize)>) {
    match (find_line(data, position), expect) {
        (ResultS4::Found(span), Some(want)) => assert_eq!(
            span,
            want,
            "data {:?} position {}",
            buffer_to_String_noraw(data),
            position
        ),
        (result, None) => assert!(
            !result.is_found(),
            "expected no line, got {:?}, data {:?}",
            result,
            buffer_to_String_noraw(data)
        ),
        (result, Some(want)) => panic!(
            "expected Found({:?}), got {:?}, data {:?}",
            want,
            result,
            buffer_to_String_noraw(data)
        ),
    }
}

#[test_case(b"abc\ndef", 3; "on first newline")]
#[test_case(b"\nabc", 0; "on leading newline")]
#[test_case(b"abc\n", 3; "on trailing newline")]
fn test_find_line_done_on_newline(data: &[u8], position: usize) {
    assert!(find_line(data, position).is_done());
}

#[test_case(b"abcdef", 0)]
#[test_case(b"abcdef", 5)]
#[test_case(b"x", 0)]
fn test_find_line_null_no_newline(data: &[u8], position: usize) {
    assert!(find_line(data, position).is_null());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// forward_search
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// two unparseable lines, then a timestamped line at offset 4
const PREAMBLE_LOG: &[u8] = b"x\ny\n2020-01-01 12:00:00 a\ntail\n";

#[test]
fn test_forward_search_skips_unparseable() {
    let dtm: DateTimeMatcher = matcher("default", 0);
    match forward_search(PREAMBLE_LOG, 0, PREAMBLE_LOG.len(), &dtm) {
        ResultS4::Found((start, length, epoch)) => {
            assert_eq!(start, 4);
            assert_eq!(length, 21);
            assert_eq!(epoch, EPOCH_20200101_1200);
        }
        result => panic!("expected Found, got {:?}", result),
    }
}

#[test]
fn test_forward_search_starts_mid_line() {
    // a position inside the timestamped line locates that whole line
    let dtm: DateTimeMatcher = matcher("default", 0);
    match forward_search(PREAMBLE_LOG, 10, PREAMBLE_LOG.len(), &dtm) {
        ResultS4::Found((start, length, _epoch)) => {
            assert_eq!((start, length), (4, 21));
        }
        result => panic!("expected Found, got {:?}", result),
    }
}

#[test]
fn test_forward_search_ubound_reached() {
    // the timestamped line starts at 4; an upper bound at or before it
    // yields Done
    let dtm: DateTimeMatcher = matcher("default", 0);
    assert!(forward_search(PREAMBLE_LOG, 0, 4, &dtm).is_done());
    assert!(forward_search(b"x\ny\nz\n", 0, 6, &dtm).is_done());
}

#[test]
fn test_forward_search_null_without_newline() {
    let dtm: DateTimeMatcher = matcher("default", 0);
    assert!(forward_search(b"2020-01-01 12:00:00 a", 0, 21, &dtm).is_null());
}

#[test]
fn test_forward_search_position_on_newline() {
    let dtm: DateTimeMatcher = matcher("default", 0);
    // position 1 is the '\n' after "x"; the probe steps over it
    match forward_search(b"x\n2020-01-01 12:00:00 a\n", 1, 24, &dtm) {
        ResultS4::Found((start, _length, _epoch)) => assert_eq!(start, 2),
        result => panic!("expected Found, got {:?}", result),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// binary_search
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// epoch of minute `m` within the `minute_log`
fn minute_epoch(minute: i64) -> i64 {
    EPOCH_20200101_1200 + minute * 60
}

#[test_case(0; "first line")]
#[test_case(1)]
#[test_case(29)]
#[test_case(59; "last line")]
fn test_binary_search_exact_minute(minute: usize) {
    let (data, offsets) = minute_log(60);
    let dtm = matcher("default", 0);
    match binary_search(&data, 0, minute_epoch(minute as i64), &dtm) {
        ResultS4::Found(at) => assert_eq!(at, offsets[minute]),
        result => panic!("minute {}: expected Found, got {:?}", minute, result),
    }
}

#[test]
fn test_binary_search_between_lines() {
    // a target between two timestamps locates the later line
    let (data, offsets) = minute_log(60);
    let dtm = matcher("default", 0);
    match binary_search(&data, 0, minute_epoch(29) + 30, &dtm) {
        ResultS4::Found(at) => assert_eq!(at, offsets[30]),
        result => panic!("expected Found, got {:?}", result),
    }
}

#[test]
fn test_binary_search_before_all() {
    let (data, _offsets) = minute_log(60);
    let dtm = matcher("default", 0);
    match binary_search(&data, 0, minute_epoch(-100), &dtm) {
        ResultS4::Found(at) => assert_eq!(at, 0),
        result => panic!("expected Found, got {:?}", result),
    }
}

#[test]
fn test_binary_search_after_all() {
    // every timestamp is below the target; no candidate line exists
    let (data, _offsets) = minute_log(60);
    let dtm = matcher("default", 0);
    assert!(binary_search(&data, 0, minute_epoch(60), &dtm).is_done());
}

#[test]
fn test_binary_search_monotonicity() {
    let (data, _offsets) = minute_log(60);
    let dtm = matcher("default", 0);
    let mut previous: usize = 0;
    for minute in -2..62 {
        let at: usize = match binary_search(&data, 0, minute_epoch(minute), &dtm) {
            ResultS4::Found(at) => at,
            // past every timestamp; the insertion point is the region end
            ResultS4::Done => data.len(),
            result => panic!("minute {}: expected Found, got {:?}", minute, result),
        };
        assert!(
            previous <= at,
            "offset for minute {} went backward: {} then {}",
            minute,
            previous,
            at
        );
        previous = at;
    }
}

#[test]
fn test_binary_search_lbound_chaining() {
    // the second search of a driver passes the first result as lbound;
    // the answer must match an unconstrained search
    let (data, _offsets) = minute_log(60);
    let dtm = matcher("default", 0);
    let p0: usize = binary_search(&data, 0, minute_epoch(10), &dtm)
        .found()
        .unwrap();
    let unconstrained: usize = binary_search(&data, 0, minute_epoch(40), &dtm)
        .found()
        .unwrap();
    let chained: usize = binary_search(&data, p0, minute_epoch(40), &dtm)
        .found()
        .unwrap();
    assert_eq!(chained, unconstrained);
}

#[test]
fn test_binary_search_unparseable_lines_interleaved() {
    // garbage lines between timestamped lines do not perturb the result
    let mut data: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();
    for minute in 0..30 {
        offsets.push(data.len());
        data.extend_from_slice(format!("2020-01-01 12:{:02}:00 msg\n", minute).as_bytes());
        data.extend_from_slice(b"  continuation without timestamp\n");
    }
    let dtm = matcher("default", 0);
    match binary_search(&data, 0, minute_epoch(20), &dtm) {
        ResultS4::Found(at) => assert_eq!(at, offsets[20]),
        result => panic!("expected Found, got {:?}", result),
    }
}

#[test]
fn test_binary_search_unparseable_only() {
    let data: &[u8] = b"alpha\nbeta\ngamma\ndelta\n";
    let dtm = matcher("default", 0);
    assert!(binary_search(data, 0, 0, &dtm).is_done());
}

#[test]
fn test_binary_search_empty_region() {
    // too small to probe; the search reports nothing found
    let dtm = matcher("default", 0);
    assert!(binary_search(b"", 0, 0, &dtm).is_done());
}

#[test]
fn test_binary_search_single_line_no_newline() {
    let dtm = matcher("default", 0);
    assert!(binary_search(b"2020-01-01 12:00:00 a", 0, 0, &dtm).is_null());
}

#[test]
fn test_binary_search_unparseable_tail_pruned() {
    // parseable head, garbage tail; a target above every timestamp lands
    // within the head or reports Done, never errors or loops
    let mut data: Vec<u8> = Vec::new();
    for minute in 0..8 {
        data.extend_from_slice(format!("2020-01-01 12:{:02}:00 msg\n", minute).as_bytes());
    }
    let head_end: usize = data.len();
    for _ in 0..64 {
        data.extend_from_slice(b"unparseable filler line\n");
    }
    let dtm = matcher("default", 0);
    match binary_search(&data, 0, minute_epoch(3), &dtm) {
        ResultS4::Found(at) => assert!(at <= head_end),
        ResultS4::Done => {}
        result => panic!("unexpected {:?}", result),
    }
}
