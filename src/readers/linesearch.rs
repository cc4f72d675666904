// src/readers/linesearch.rs

//! Line-oriented searching over an in-memory byte region.
//!
//! Three layers, each built on the previous:
//!
//! 1. [`find_line`] — locate the line containing a byte position.
//! 2. [`forward_search`] — from a position, walk forward line-by-line to
//!    the first line yielding a timestamp.
//! 3. [`binary_search`] — locate the lowest byte offset of a line whose
//!    timestamp is at or after a target instant, in O(log N) probes.
//!
//! A "line" is a maximal byte run not containing `'\n'`; the terminal line
//! of a region may lack the delimiter.

use crate::common::{EpochSecs, GrepError, NLu8, ResultS3, ResultS4};
use crate::data::datetime::DateTimeMatcher;

use ::memchr::{memchr, memrchr};
use ::more_asserts::{debug_assert_le, debug_assert_lt};
use ::si_trace_print::{defn, defo, defx};

/// `(start, length)` of a located line; `length` excludes the `'\n'`
pub type LineSpan = (usize, usize);

/// [`find_line`] result
pub type ResultS4Line = ResultS4<LineSpan, GrepError>;

/// `(start, length, epoch)` of a line bearing a timestamp
pub type LineStamp = (usize, usize, EpochSecs);

/// [`forward_search`] result
pub type ResultS4Probe = ResultS4<LineStamp, GrepError>;

/// [`binary_search`] result; the found value is a byte offset
pub type ResultS4Search = ResultS4<usize, GrepError>;

/// Locate the line containing byte `position` within `data`.
///
/// - [`Done`] when `data[position]` is itself a `'\n'`
/// - [`Null`] when `data` holds no `'\n'` at all (the region is a single
///   undelimited line)
/// - [`Found((start, length))`] otherwise; the line runs to the next
///   `'\n'` or to the end of `data`
///
/// `position` must be within `data`.
///
/// [`Done`]: crate::common::ResultS4#variant.Done
/// [`Null`]: crate::common::ResultS4#variant.Null
/// [`Found((start, length))`]: crate::common::ResultS4#variant.Found
pub fn find_line(data: &[u8], position: usize) -> ResultS4Line {
    debug_assert_lt!(position, data.len());
    if data[position] == NLu8 {
        return ResultS4::Done;
    }
    let start: usize = match memrchr(NLu8, &data[..position]) {
        Some(at) => at + 1,
        None => 0,
    };
    let length: usize = match memchr(NLu8, &data[position..]) {
        Some(at) => position + at - start,
        None => data.len() - start,
    };
    if length == data.len() {
        return ResultS4::Null;
    }

    ResultS4::Found((start, length))
}

/// From `position`, walk forward line-by-line until a line yields a
/// timestamp or `ubound` is reached.
///
/// Lines without a parseable timestamp are skipped whole, so each line is
/// inspected at most once per probe. A line beginning before `ubound` is
/// inspected in full even when it extends past `ubound`.
pub fn forward_search(
    data: &[u8],
    position: usize,
    ubound: usize,
    matcher: &DateTimeMatcher,
) -> ResultS4Probe {
    debug_assert_le!(ubound, data.len());
    let mut position: usize = position;
    while position < ubound {
        let (start, length): LineSpan = match find_line(data, position) {
            ResultS4::Found(span) => span,
            // sitting on a '\n'; step over it
            ResultS4::Done => {
                position += 1;
                continue;
            }
            ResultS4::Null => return ResultS4::Null,
            ResultS4::Err(err) => return ResultS4::Err(err),
        };
        match matcher.get_timestamp(&data[start..start + length]) {
            ResultS3::Found(epoch) => return ResultS4::Found((start, length, epoch)),
            // no timestamp on this line; skip past it and its '\n'
            ResultS3::Done => position = start + length + 1,
            ResultS3::Err(err) => return ResultS4::Err(err),
        }
    }

    ResultS4::Done
}

/// Binary search `data` for the smallest byte offset `p` such that the
/// line starting at `p` has a timestamp at or after `target`, and every
/// parseable line strictly before `p` has a timestamp before `target`.
///
/// `lbound` is a recommended lower bound for the search, used by callers
/// chaining two searches over the same region.
///
/// Probes are made with [`forward_search`]; a probe finding no timestamp
/// up to the current upper bound prunes that unparseable span. The loop
/// maintains `lbound ≤ middle ≤ ubound ≤ data.len()`: `ubound` never
/// increases, `lbound` never decreases, and `middle` shrinks toward
/// `lbound`, so the search terminates.
///
/// Each probed line with a timestamp at or after `target` records its
/// start as the candidate answer before the upper bound closes on it; the
/// best (lowest) candidate is returned. With no candidate the result is
/// [`Done`] — in particular when every parseable timestamp is before
/// `target` — or [`Null`] when a probe finds the region to be a single
/// undelimited line. `Null` is only observable when the loop runs at
/// all, which requires an initial span `ubound − lbound > 1`; a region
/// too small to probe reports [`Done`], undelimited or not.
///
/// [`Done`]: crate::common::ResultS4#variant.Done
/// [`Null`]: crate::common::ResultS4#variant.Null
pub fn binary_search(
    data: &[u8],
    lbound: usize,
    target: EpochSecs,
    matcher: &DateTimeMatcher,
) -> ResultS4Search {
    defn!("(data len {}, lbound {}, target {})", data.len(), lbound, target);
    let mut lbound: usize = lbound;
    let mut ubound: usize = data.len();
    let mut middle: usize = lbound + (ubound - lbound) / 2;
    let mut candidate: Option<usize> = None;
    let mut saw_null: bool = false;
    while lbound != middle {
        match forward_search(data, middle, ubound, matcher) {
            ResultS4::Found((start, length, epoch)) => {
                defo!(
                    "probe at {} found line [{}, {}) epoch {}",
                    middle,
                    start,
                    start + length,
                    epoch
                );
                if epoch < target {
                    lbound = start + length;
                    middle = ubound;
                    if lbound != ubound {
                        // skip the '\n'
                        lbound += 1;
                    }
                } else {
                    candidate = Some(start);
                    ubound = start;
                    middle = ubound;
                }
            }
            ResultS4::Done => {
                // no timestamp from middle to ubound; prune that span
                defo!("probe at {} found nothing up to {}", middle, ubound);
                ubound = middle;
            }
            ResultS4::Null => {
                saw_null = true;
                break;
            }
            ResultS4::Err(err) => return ResultS4::Err(err),
        }
        debug_assert_le!(lbound, ubound);
        middle = lbound + (middle - lbound) / 2;
    }
    defx!("lbound {} candidate {:?}", lbound, candidate);

    match candidate {
        Some(at) => ResultS4::Found(at),
        None if saw_null => ResultS4::Null,
        None => ResultS4::Done,
    }
}
