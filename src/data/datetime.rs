// src/data/datetime.rs
//
// the most relevant documents to understand this file:
// `strptime(3)` conversion specifications
// https://man7.org/linux/man-pages/man3/strptime.3.html
// `regex` crate patterns
// https://docs.rs/regex/latest/regex/
// `chrono` crate `strftime` format
// https://docs.rs/chrono/latest/chrono/format/strftime/index.html

//! Datetime format compilation and timestamp extraction.
//!
//! A `strptime`-style format string is compiled once into a
//! [`DateTimeMatcher`]: a byte-oriented regular expression with named
//! capture groups plus a _fast path_ descriptor. Per candidate log line,
//! [`DateTimeMatcher::get_timestamp`] runs the regex and produces an
//! [`EpochSecs`] either by interpreting the captured digits directly
//! (fast path) or by handing the full matched substring back to the
//! general `chrono` parser with the original format (slow path).
//!
//! The fast path recognizes English month names and a closed set of
//! timezone abbreviations only.

#![allow(non_camel_case_types)]

use std::collections::BTreeMap;

use crate::common::{EpochSecs, GrepError, ResultS3, SecsOffset};

use ::chrono::format::{parse, Parsed, StrftimeItems};
use ::lazy_static::lazy_static;
use ::regex::bytes::{Captures, Regex, RegexBuilder};
use ::si_trace_print::{defn, defo, defx};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// named formats
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `strptime`-style formatting pattern. Input to [`DateTimeMatcher::compile`]
/// and, on the slow path, to [`datetime_parse_from_str`].
pub type DateTimePattern_str = str;

/// regular expression capture group name used within the emitted regex
pub type CaptureGroupName = str;

/// the regular expression "class" used here; byte-oriented so lines of
/// arbitrary (non-UTF-8) bytes can be matched
pub type DateTimeRegex = Regex;

/// One compiled-in format selectable by name with `--format`.
///
/// Either `format` is set, or `alias` names another table entry.
pub struct NamedFormat {
    pub name: &'static str,
    pub alias: Option<&'static str>,
    pub format: Option<&'static DateTimePattern_str>,
}

/// The compiled-in table of named datetime formats.
pub const NAMED_FORMATS: [NamedFormat; 7] = [
    NamedFormat {
        name: "default",
        alias: None,
        format: Some("%Y-%m-%d %H:%M:%S"),
    },
    NamedFormat {
        name: "iso",
        alias: None,
        format: Some("%Y-%m-%dT%H:%M:%S%z"),
    },
    NamedFormat {
        name: "common",
        alias: None,
        format: Some("%d/%b/%Y:%H:%M:%S %z"),
    },
    NamedFormat {
        name: "syslog",
        alias: None,
        format: Some("%b %d %H:%M:%S"),
    },
    NamedFormat {
        name: "tskv",
        alias: None,
        format: Some("unixtime=%s"),
    },
    NamedFormat {
        name: "apache",
        alias: Some("common"),
        format: None,
    },
    NamedFormat {
        name: "nginx",
        alias: Some("common"),
        format: None,
    },
];

/// Resolve a name from [`NAMED_FORMATS`] to its format string, following
/// `alias` links until a concrete entry is found. The table scan restarts
/// after each link so resolution is idempotent.
///
/// Returns `None` for a name not in the table; the caller then treats the
/// name itself as a literal format string.
pub fn resolve_format(name: &str) -> Option<&'static DateTimePattern_str> {
    let mut want: &str = name;
    let mut index: usize = 0;
    while index < NAMED_FORMATS.len() {
        let entry = &NAMED_FORMATS[index];
        if entry.name == want {
            match entry.alias {
                Some(alias) => {
                    want = alias;
                    index = 0;
                    continue;
                }
                None => return entry.format,
            }
        }
        index += 1;
    }
    None
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// format → regex compilation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// `CGN_*` are the capture group names the fast path can read,
// `CGP_*` the corresponding capture group patterns (group body only; the
// compiler wraps them, named on first occurrence, anonymous on repeats).

pub const CGN_YEAR: &CaptureGroupName = "year";
pub const CGN_MONTH: &CaptureGroupName = "month";
pub const CGN_MONTH_T: &CaptureGroupName = "month_t";
pub const CGN_DAY: &CaptureGroupName = "day";
pub const CGN_HOUR: &CaptureGroupName = "hour";
pub const CGN_MINUTE: &CaptureGroupName = "minute";
pub const CGN_SECOND: &CaptureGroupName = "second";
pub const CGN_TZ: &CaptureGroupName = "timezone";
pub const CGN_EPOCH: &CaptureGroupName = "timestamp";

const CGP_YEAR: &str = r"\d{4}";
const CGP_MONTH: &str = r"1[0-2]|0?[1-9]";
// English forms only, as all world do
const CGP_MONTH_T: &str = "Jan|January|Feb|February|Mar|March|Apr|April|May|\
Jun|June|Jul|July|Aug|August|Sep|September|Oct|October|Nov|November|Dec|December";
const CGP_DAY: &str = r"[1-2][0-9]|3[0-1]|0?[1-9]";
const CGP_HOUR: &str = r"1[0-9]|2[0-3]|0?[0-9]";
const CGP_MINUTE: &str = r"[1-5][0-9]|0?[0-9]";
const CGP_SECOND: &str = r"[1-5][0-9]|60|0?[0-9]";
// an RFC-822/ISO 8601 timezone: numeric offset, military letter,
// or North-American abbreviation
// https://datatracker.ietf.org/doc/html/rfc822#section-5
const CGP_TZ: &str = r"((\+|\-)\d{2}:?\d{2})|UT|UTC|GMT|EST|EDT|CST|CDT|MST|MDT|PST|PDT|[A-Z]";
const CGP_EPOCH: &str = r"\d{1,20}";

// `RP_*` are patterns for specifiers the fast path cannot read; any of them
// forces delegation to the general `chrono` parser.

const RP_WEEKDAY: &str =
    "(Mon|Monday|Tue|Tuesday|Wed|Wednesday|Thu|Thursday|Fri|Friday|Sat|Saturday|Sun|Sunday)";
const RP_CENTURY: &str = r"\d{1,2}";
const RP_HOUR12: &str = r"(1[0-2]|0?[1-9])";
const RP_YEARDAY: &str = r"([1-2][0-9][0-9]|3[0-5][0-9]|36[0-6]|0?[1-9][0-9]|0{0,2}[1-9])";
const RP_AMPM: &str = "(AM|PM)";
const RP_WEEKNUM: &str = r"([1-4][0-9]|5[0-3]|0?[0-9])";
const RP_WEEKDAYNUM: &str = "[0-6]";
const RP_YEARy: &str = r"\d{1,2}";
const RP_ISOYEAR: &str = r"\d{4}";
const RP_ISOWEEKDAY: &str = "[1-7]";
const RP_ISOWEEK: &str = r"([1-4][0-9]|5[0-3]|0?[1-9])";
// a timezone name: PST8PDT, Etc/GMT+2, America/Argentina/Rio_Gallegos, …
const RP_TZNAME: &str = r"[A-Za-z0-9_\+\-/]{3,33}";

/// regex metacharacters that must be escaped when a format literal is
/// copied into the emitted regex
const REGEX_ESCAPE: &[u8] = br"^$|()[]{}.*+?\";

/// Occurrence counts of the recognized fields, accumulated while walking a
/// format string, plus the forced-fallback flag set by any specifier the
/// fast path cannot read.
#[derive(Debug, Default, Eq, PartialEq)]
struct GroupTally {
    year: u32,
    month: u32,
    month_t: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    timezone: u32,
    timestamp: u32,
    fallback: bool,
}

impl GroupTally {
    /// Do the accumulated counts rule out the fast path?
    ///
    /// Any field more than once, `month` together with `month_t`, or
    /// `timestamp` together with any date/time field, and the extractor
    /// must fall back to the general parser.
    fn violates_fast_path(&self) -> bool {
        let datetime_fields: u32 = self.year
            + self.month
            + self.month_t
            + self.day
            + self.hour
            + self.minute
            + self.second;
        self.year > 1
            || self.month > 1
            || self.month_t > 1
            || self.day > 1
            || self.hour > 1
            || self.minute > 1
            || self.second > 1
            || self.timezone > 1
            || self.timestamp > 1
            || self.month + self.month_t > 1
            || (self.timestamp > 0 && datetime_fields > 0)
    }
}

/// Append one capture group to `regex`: named on the first occurrence of a
/// field, anonymous on repeats (the `regex` crate rejects duplicate group
/// names; a repeated field forces the slow path anyway, which only reads
/// the full match).
fn push_group(regex: &mut String, name: &CaptureGroupName, pattern: &str, count: &mut u32) {
    if *count == 0 {
        regex.push_str("(?P<");
        regex.push_str(name);
        regex.push('>');
    } else {
        regex.push('(');
    }
    regex.push_str(pattern);
    regex.push(')');
    *count += 1;
}

/// Walk a `strptime`-style format string, appending the equivalent regex to
/// `regex` and accumulating field occurrences into `tally`.
///
/// Recurses for the equivalence specifiers (`%c %D %F %R %r %T %x %X`).
fn strptime_to_regex(
    format: &DateTimePattern_str,
    regex: &mut String,
    tally: &mut GroupTally,
) -> Result<(), GrepError> {
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            if c.is_ascii() && REGEX_ESCAPE.contains(&(c as u8)) {
                regex.push('\\');
            }
            regex.push(c);
            continue;
        }
        let spec: char = match chars.next() {
            Some(s) => s,
            None => {
                return Err(GrepError::MalformedFormat(
                    "unexpected format char '%' at end of format string".to_string(),
                ))
            }
        };
        match spec {
            // the % character
            '%' => regex.push('%'),
            // weekday name, abbreviated or full; English only
            'a' | 'A' => {
                regex.push_str(RP_WEEKDAY);
                tally.fallback = true;
            }
            // month name, abbreviated or full; English only
            'b' | 'B' | 'h' => push_group(regex, CGN_MONTH_T, CGP_MONTH_T, &mut tally.month_t),
            // the locale's date and time representation; %x %X stands in
            'c' => strptime_to_regex("%x %X", regex, tally)?,
            // century number (0-99)
            'C' => {
                regex.push_str(RP_CENTURY);
                tally.fallback = true;
            }
            // day of month (1-31)
            'd' | 'e' => push_group(regex, CGN_DAY, CGP_DAY, &mut tally.day),
            // American style date, equivalent to %m/%d/%y
            'D' => strptime_to_regex("%m/%d/%y", regex, tally)?,
            // equivalent to %Y-%m-%d; %x uses the same stand-in
            'F' | 'x' => strptime_to_regex("%Y-%m-%d", regex, tally)?,
            // ISO week-based year without century (0-99)
            'g' => {
                regex.push_str(RP_YEARy);
                tally.fallback = true;
            }
            // ISO week-based year
            'G' => {
                regex.push_str(RP_ISOYEAR);
                tally.fallback = true;
            }
            // hour (0-23)
            'H' => push_group(regex, CGN_HOUR, CGP_HOUR, &mut tally.hour),
            // hour on a 12-hour clock (1-12)
            'I' => {
                regex.push_str(RP_HOUR12);
                tally.fallback = true;
            }
            // day number in the year (1-366)
            'j' => {
                regex.push_str(RP_YEARDAY);
                tally.fallback = true;
            }
            // month number (1-12)
            'm' => push_group(regex, CGN_MONTH, CGP_MONTH, &mut tally.month),
            // minute (0-59)
            'M' => push_group(regex, CGN_MINUTE, CGP_MINUTE, &mut tally.minute),
            // arbitrary whitespace
            'n' | 't' => regex.push_str(r"\s"),
            // the locale's AM or PM; English only
            'p' => {
                regex.push_str(RP_AMPM);
                tally.fallback = true;
            }
            // 12-hour clock time, equivalent to %I:%M:%S %p
            'r' => strptime_to_regex("%I:%M:%S %p", regex, tally)?,
            // equivalent to %H:%M
            'R' => strptime_to_regex("%H:%M", regex, tally)?,
            // seconds since the Epoch
            's' => push_group(regex, CGN_EPOCH, CGP_EPOCH, &mut tally.timestamp),
            // second (0-60)
            'S' => push_group(regex, CGN_SECOND, CGP_SECOND, &mut tally.second),
            // equivalent to %H:%M:%S; %X uses the same stand-in
            'T' | 'X' => strptime_to_regex("%H:%M:%S", regex, tally)?,
            // weekday number, Monday = 1 (1-7)
            'u' => {
                regex.push_str(RP_ISOWEEKDAY);
                tally.fallback = true;
            }
            // week number, Sunday-first or Monday-first (0-53)
            'U' | 'W' => {
                regex.push_str(RP_WEEKNUM);
                tally.fallback = true;
            }
            // ISO 8601 week number (1-53)
            'V' => {
                regex.push_str(RP_ISOWEEK);
                tally.fallback = true;
            }
            // weekday number, Sunday = 0 (0-6)
            'w' => {
                regex.push_str(RP_WEEKDAYNUM);
                tally.fallback = true;
            }
            // year within century (0-99)
            'y' => {
                regex.push_str(RP_YEARy);
                tally.fallback = true;
            }
            // year including century
            'Y' => push_group(regex, CGN_YEAR, CGP_YEAR, &mut tally.year),
            // RFC-822/ISO 8601 timezone specification
            'z' => push_group(regex, CGN_TZ, CGP_TZ, &mut tally.timezone),
            // timezone name
            'Z' => {
                regex.push_str(RP_TZNAME);
                tally.fallback = true;
                tally.timezone += 1;
            }
            'O' | 'E' => {
                return Err(GrepError::MalformedFormat(
                    "'O' and 'E' modifiers are not supported".to_string(),
                ))
            }
            unknown => {
                return Err(GrepError::MalformedFormat(format!(
                    "unexpected format char '{}'",
                    unknown
                )))
            }
        }
    }

    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DateTimeMatcher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Capture group index of each fast-path field within the compiled regex,
/// `None` when the field does not occur in the format.
///
/// Index 0 is the full match in the `regex` crate, so a dedicated `Option`
/// keeps "absent" distinct from any valid index.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CaptureIndexes {
    pub year: Option<usize>,
    pub month: Option<usize>,
    pub month_t: Option<usize>,
    pub day: Option<usize>,
    pub hour: Option<usize>,
    pub minute: Option<usize>,
    pub second: Option<usize>,
    pub timezone: Option<usize>,
    pub timestamp: Option<usize>,
}

/// A datetime format compiled for repeated matching against log lines.
///
/// Created once per invocation by [`DateTimeMatcher::compile`] and shared
/// read-only by every search operation afterward.
pub struct DateTimeMatcher {
    /// compiled byte-oriented regex derived from `format`
    regex: DateTimeRegex,
    /// the original `strptime`-style format, kept for the slow path
    format: String,
    /// `true`: every match delegates to [`datetime_parse_from_str`]
    fallback: bool,
    /// the format itself carries timezone information (`%z` or `%Z`)
    format_has_tz: bool,
    /// fast-path capture indices; all `None` when `fallback` is set
    captures: CaptureIndexes,
    /// offset subtracted when the format carries no timezone, typically the
    /// process-startup local offset
    tz_default: SecsOffset,
}

impl DateTimeMatcher {
    /// Compile `format` into a matcher.
    ///
    /// `tz_default` is the offset in seconds east of UTC presumed for
    /// matched datetimes whose format lacks timezone information.
    pub fn compile(
        format: &DateTimePattern_str,
        tz_default: SecsOffset,
    ) -> Result<DateTimeMatcher, GrepError> {
        defn!("({:?}, {:?})", format, tz_default);
        let mut regex_text = String::with_capacity(format.len() * 8);
        let mut tally = GroupTally::default();
        strptime_to_regex(format, &mut regex_text, &mut tally)?;
        let fallback: bool = tally.fallback || tally.violates_fast_path();
        let format_has_tz: bool = tally.timezone > 0;
        defo!("regex_text {:?} fallback {}", regex_text, fallback);
        let regex: DateTimeRegex = RegexBuilder::new(&regex_text)
            .unicode(false)
            .build()?;
        let captures: CaptureIndexes = match fallback {
            true => CaptureIndexes::default(),
            false => CaptureIndexes {
                year: capture_index(&regex, CGN_YEAR),
                month: capture_index(&regex, CGN_MONTH),
                month_t: capture_index(&regex, CGN_MONTH_T),
                day: capture_index(&regex, CGN_DAY),
                hour: capture_index(&regex, CGN_HOUR),
                minute: capture_index(&regex, CGN_MINUTE),
                second: capture_index(&regex, CGN_SECOND),
                timezone: capture_index(&regex, CGN_TZ),
                timestamp: capture_index(&regex, CGN_EPOCH),
            },
        };
        defx!();

        Ok(DateTimeMatcher {
            regex,
            format: format.to_string(),
            fallback,
            format_has_tz,
            captures,
            tz_default,
        })
    }

    /// Is the numeric fast path active for this format?
    pub const fn is_fast_path(&self) -> bool {
        !self.fallback
    }

    /// Does the format carry timezone information (`%z` or `%Z`)?
    pub const fn format_has_tz(&self) -> bool {
        self.format_has_tz
    }

    /// The original format string.
    pub fn format(&self) -> &DateTimePattern_str {
        &self.format
    }

    /// The regex text the format compiled to.
    pub fn regex_pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// The fast-path capture indices (all `None` in fallback mode).
    pub const fn capture_indexes(&self) -> &CaptureIndexes {
        &self.captures
    }

    /// Search one line for a datetime and convert it to seconds since the
    /// Unix epoch.
    ///
    /// Lines that do not match the compiled regex, and matches that decode
    /// to an impossible value (a bad timezone letter, an out-of-range
    /// conversion), yield [`ResultS3::Done`] so the caller skips the line.
    pub fn get_timestamp(&self, line: &[u8]) -> ResultS3<EpochSecs, GrepError> {
        let captures: Captures = match self.regex.captures(line) {
            Some(c) => c,
            None => return ResultS3::Done,
        };
        if !self.fallback {
            return self.captures_to_epoch(&captures);
        }
        // slow path: hand the full matched substring back to the general
        // parser together with the original format
        let matched: &[u8] = match captures.get(0) {
            Some(m) => m.as_bytes(),
            None => return ResultS3::Done,
        };
        let text: &str = match std::str::from_utf8(matched) {
            Ok(t) => t,
            Err(_) => return ResultS3::Done,
        };
        match datetime_parse_from_str(text, &self.format, self.format_has_tz, self.tz_default) {
            Some(epoch) => ResultS3::Found(epoch),
            None => ResultS3::Done,
        }
    }

    /// Fast path: assemble the epoch from the captured fields, without
    /// re-parsing the matched text through the general parser.
    fn captures_to_epoch(&self, captures: &Captures) -> ResultS3<EpochSecs, GrepError> {
        fn capture<'c>(captures: &'c Captures, index: Option<usize>) -> Option<&'c [u8]> {
            index
                .and_then(|at| captures.get(at))
                .map(|m| m.as_bytes())
        }

        // `%s` captures are the result; no calendar computation
        if let Some(digits) = capture(captures, self.captures.timestamp) {
            return match atoi(digits) {
                Some(epoch) => ResultS3::Found(epoch),
                None => ResultS3::Done,
            };
        }

        let mut tm = TmFields::default();
        if let Some(digits) = capture(captures, self.captures.year) {
            tm.year = match atoi(digits) {
                Some(year) => year,
                None => return ResultS3::Done,
            };
        }
        if let Some(digits) = capture(captures, self.captures.month) {
            tm.mon0 = match atoi(digits) {
                Some(month) => month - 1,
                None => return ResultS3::Done,
            };
        }
        if let Some(name) = capture(captures, self.captures.month_t) {
            tm.mon0 = match month_from_name(name) {
                Some(mon0) => mon0,
                None => return ResultS3::Done,
            };
        }
        if let Some(digits) = capture(captures, self.captures.day) {
            tm.mday = match atoi(digits) {
                Some(day) => day,
                None => return ResultS3::Done,
            };
        }
        if let Some(digits) = capture(captures, self.captures.hour) {
            tm.hour = match atoi(digits) {
                Some(hour) => hour,
                None => return ResultS3::Done,
            };
        }
        if let Some(digits) = capture(captures, self.captures.minute) {
            tm.min = match atoi(digits) {
                Some(min) => min,
                None => return ResultS3::Done,
            };
        }
        if let Some(digits) = capture(captures, self.captures.second) {
            tm.sec = match atoi(digits) {
                Some(sec) => sec,
                None => return ResultS3::Done,
            };
        }
        let gmtoff: i64 = match capture(captures, self.captures.timezone) {
            Some(tz) => match tz_offset_secs(tz) {
                Some(offset) => offset,
                None => return ResultS3::Done,
            },
            None => self.tz_default as i64,
        };

        match epoch_from_utc_fields(&tm).and_then(|epoch| epoch.checked_sub(gmtoff)) {
            Some(epoch) => ResultS3::Found(epoch),
            None => ResultS3::Done,
        }
    }
}

/// Index of the named capture group within `regex`, `None` when absent.
fn capture_index(regex: &DateTimeRegex, name: &CaptureGroupName) -> Option<usize> {
    regex
        .capture_names()
        .position(|group| group == Some(name))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// field decoding helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decimal digits to `i64`, `None` on any non-digit or on overflow.
pub(crate) fn atoi(digits: &[u8]) -> Option<i64> {
    if digits.is_empty() {
        return None;
    }
    let mut value: i64 = 0;
    for b in digits.iter() {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add((b - b'0') as i64)?;
    }

    Some(value)
}

/// Decode an English month name to 0 (Jan) through 11 (Dec), keyed on the
/// first letter and disambiguated by the second or third.
///
/// The capture pattern [`CGP_MONTH_T`] guarantees a valid name of at least
/// three bytes.
pub(crate) fn month_from_name(name: &[u8]) -> Option<i64> {
    if name.len() < 3 {
        return None;
    }
    match name[0] {
        // Apr Aug
        b'A' => Some(if name[1] == b'p' { 3 } else { 7 }),
        // Dec
        b'D' => Some(11),
        // Feb
        b'F' => Some(1),
        // Jan Jul Jun
        b'J' => Some(if name[1] == b'a' {
            0
        } else if name[2] == b'n' {
            5
        } else {
            6
        }),
        // Mar May
        b'M' => Some(if name[2] == b'r' { 2 } else { 4 }),
        // Nov
        b'N' => Some(10),
        // Oct
        b'O' => Some(9),
        // Sep
        b'S' => Some(8),
        _ => None,
    }
}

/// timezone abbreviation to offset in seconds east of UTC
type Map_TZZ_to_Offset = BTreeMap<&'static str, i64>;

lazy_static! {
    /// the closed set of named timezone abbreviations the `%z` fast path
    /// accepts, per RFC 822 §5
    static ref MAP_TZZ_TO_OFFSET: Map_TZZ_to_Offset = {
        let mut map_ = Map_TZZ_to_Offset::new();
        for (name, hours) in [
            ("UT", 0),
            ("UTC", 0),
            ("GMT", 0),
            ("EST", -5),
            ("EDT", -4),
            ("CST", -6),
            ("CDT", -5),
            ("MST", -7),
            ("MDT", -6),
            ("PST", -8),
            ("PDT", -7),
        ] {
            map_.insert(name, hours * 60 * 60);
        }

        map_
    };
}

/// Decode a `%z` capture to an offset in seconds east of UTC.
///
/// Accepts `±HHMM`, `±HH:MM`, a single RFC 822 military letter (`J` is
/// unassigned), or an abbreviation from [`MAP_TZZ_TO_OFFSET`]. Anything
/// else is `None`, treated as "no timestamp on this line" upstream.
pub(crate) fn tz_offset_secs(tz: &[u8]) -> Option<i64> {
    fn digits2(hi: u8, lo: u8) -> Option<i64> {
        if !hi.is_ascii_digit() || !lo.is_ascii_digit() {
            return None;
        }
        Some(((hi - b'0') * 10 + (lo - b'0')) as i64)
    }

    match tz.len() {
        // +0000
        5 => {
            let offset = digits2(tz[1], tz[2])? * 60 * 60 + digits2(tz[3], tz[4])? * 60;
            Some(if tz[0] == b'-' { -offset } else { offset })
        }
        // +00:00
        6 => {
            let offset = digits2(tz[1], tz[2])? * 60 * 60 + digits2(tz[4], tz[5])? * 60;
            Some(if tz[0] == b'-' { -offset } else { offset })
        }
        // military
        1 => {
            let hours: i64 = match tz[0] {
                b'A' => -1,
                b'B' => -2,
                b'C' => -3,
                b'D' => -4,
                b'E' => -5,
                b'F' => -6,
                b'G' => -7,
                b'H' => -8,
                b'I' => -9,
                b'K' => -10,
                b'L' => -11,
                b'M' => -12,
                b'N' => 1,
                b'O' => 2,
                b'P' => 3,
                b'Q' => 4,
                b'R' => 5,
                b'S' => 6,
                b'T' => 7,
                b'U' => 8,
                b'V' => 9,
                b'W' => 10,
                b'X' => 11,
                b'Y' => 12,
                b'Z' => 0,
                _ => return None,
            };
            Some(hours * 60 * 60)
        }
        _ => {
            let name: &str = std::str::from_utf8(tz).ok()?;
            MAP_TZZ_TO_OFFSET.get(name).copied()
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// broken-down fields → epoch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Broken-down calendar fields, `timegm(3)`-style: out-of-range values are
/// normalized arithmetically rather than rejected (`sec` 60 carries into
/// the next minute, `mday` 0 is the day before the 1st).
#[derive(Debug, Eq, PartialEq)]
pub(crate) struct TmFields {
    /// full Gregorian year (`tm_year` + 1900)
    pub year: i64,
    /// month, 0 (January) through 11 (December), like `tm_mon`
    pub mon0: i64,
    /// day of month, 1-based like `tm_mday`
    pub mday: i64,
    pub hour: i64,
    pub min: i64,
    pub sec: i64,
}

impl Default for TmFields {
    /// the all-zero `struct tm`: year 1900, January, `mday` 0
    fn default() -> TmFields {
        TmFields {
            year: 1900,
            mon0: 0,
            mday: 0,
            hour: 0,
            min: 0,
            sec: 0,
        }
    }
}

/// Days from the Unix epoch to the first day of `month` (1-12) in `year`,
/// proleptic Gregorian.
///
/// Howard Hinnant's `days_from_civil` algorithm
/// <http://howardhinnant.github.io/date_algorithms.html#days_from_civil>
fn days_from_civil(year: i64, month: u32) -> Option<i64> {
    let year: i64 = if month <= 2 { year - 1 } else { year };
    let era: i64 = year.div_euclid(400);
    let yoe: i64 = year - era * 400;
    let mp: i64 = ((month + 9) % 12) as i64;
    let doy: i64 = (153 * mp + 2) / 5;
    let doe: i64 = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era.checked_mul(146097)?
        .checked_add(doe)?
        .checked_sub(719468)
}

/// Combine broken-down fields into seconds since the Unix epoch, treating
/// the fields as UTC. The `timegm(3)` equivalent.
///
/// `None` when the computation overflows.
pub(crate) fn epoch_from_utc_fields(tm: &TmFields) -> Option<EpochSecs> {
    // carry months outside 0-11 into the year
    let year: i64 = tm.year.checked_add(tm.mon0.div_euclid(12))?;
    let mon0: i64 = tm.mon0.rem_euclid(12);
    let days: i64 = days_from_civil(year, (mon0 + 1) as u32)?.checked_add(tm.mday - 1)?;

    days.checked_mul(86400)?
        .checked_add(tm.hour.checked_mul(3600)?)?
        .checked_add(tm.min.checked_mul(60)?)?
        .checked_add(tm.sec)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// slow path and argument parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse `data` against the `strptime`-style `pattern` with the general
/// `chrono` parser and convert to seconds since the Unix epoch.
///
/// Fields absent from `pattern` default like a zeroed `struct tm` passed to
/// `strptime(3)`: year 1900, January, `mday` 0, midnight. A `%s` capture is
/// returned directly. When `has_tz` the offset parsed from the data is
/// subtracted (0 when the data carries none), otherwise `tz_offset`.
pub fn datetime_parse_from_str(
    data: &str,
    pattern: &DateTimePattern_str,
    has_tz: bool,
    tz_offset: SecsOffset,
) -> Option<EpochSecs> {
    let mut parsed = Parsed::new();
    if parse(&mut parsed, data, StrftimeItems::new(pattern)).is_err() {
        return None;
    }
    if let Some(epoch) = parsed.timestamp {
        return Some(epoch);
    }
    let year: i64 = match parsed.year {
        Some(year) => year as i64,
        // two-digit years pivot like strptime(3): 69-99 → 19xx, 0-68 → 20xx
        None => match (parsed.year_div_100, parsed.year_mod_100) {
            (Some(div), Some(rem)) => div as i64 * 100 + rem as i64,
            (None, Some(rem)) if rem >= 69 => 1900 + rem as i64,
            (None, Some(rem)) => 2000 + rem as i64,
            _ => 1900,
        },
    };
    let tm = TmFields {
        year,
        mon0: match parsed.month {
            Some(month) => month as i64 - 1,
            None => 0,
        },
        mday: parsed.day.map_or(0, |day| day as i64),
        hour: parsed.hour_div_12.unwrap_or(0) as i64 * 12
            + parsed.hour_mod_12.unwrap_or(0) as i64,
        min: parsed.minute.unwrap_or(0) as i64,
        sec: parsed.second.unwrap_or(0) as i64,
    };
    let gmtoff: i64 = match has_tz {
        true => parsed.offset.unwrap_or(0) as i64,
        false => tz_offset as i64,
    };

    epoch_from_utc_fields(&tm)?.checked_sub(gmtoff)
}

/// fallback patterns for `--start`/`--stop` values the active format does
/// not parse, attempted in order; the order is part of the observable
/// interface ("2020-01-02" is year-month-day, not day-month-year)
pub const DATETIME_ARG_FALLBACKS: [&DateTimePattern_str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
];

/// Convert a `--start`/`--stop` argument to seconds since the Unix epoch:
/// first with the active `format`, then each of
/// [`DATETIME_ARG_FALLBACKS`]. The first success wins.
pub fn datetime_from_arg(
    value: &str,
    format: &DateTimePattern_str,
    format_has_tz: bool,
    tz_offset: SecsOffset,
) -> Option<EpochSecs> {
    if let Some(epoch) = datetime_parse_from_str(value, format, format_has_tz, tz_offset) {
        return Some(epoch);
    }
    for pattern in DATETIME_ARG_FALLBACKS.iter() {
        if let Some(epoch) = datetime_parse_from_str(value, pattern, false, tz_offset) {
            return Some(epoch);
        }
    }

    None
}
