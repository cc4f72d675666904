// src/bin/timeslice.rs

//! Driver program _timeslice_ drives the [_tslib_].
//!
//! Processes user-passed command-line arguments, compiles the active
//! datetime format once, then extracts the `[start, stop)` time range from
//! each passed file in random-access mode, or from standard input in
//! streaming mode when no files are passed.
//!
//! Exit code 0 when at least one line was emitted, 1 when the search
//! completed without emitting, 2 on any error.
//!
//! [_tslib_]: tslib

#![allow(non_camel_case_types)]

use std::io::{self, Write};
use std::process::ExitCode;

use ::chrono::{Local, Utc};
use ::clap::{ArgAction, Parser};
use ::const_format::concatcp;
use ::si_trace_print::{defn, defo, defx};
use ::tslib::common::{Count, EpochSecs, FPath, GrepError, ResultS3, ResultS4, SecsOffset};
use ::tslib::data::datetime::{
    datetime_from_arg,
    resolve_format,
    DateTimeMatcher,
    NAMED_FORMATS,
};
use ::tslib::e_err;
use ::tslib::readers::regionreader::RegionReader;
use ::tslib::readers::streamreader::StreamReader;

/// CLI binary name, used in messages
const NAME: &str = "timeslice";

/// process exit code: at least one matching line was emitted
const EXIT_FOUND: u8 = 0;
/// process exit code: the search completed but nothing matched
const EXIT_NOTFOUND: u8 = 1;
/// process exit code: invalid arguments, I/O, regex compilation, …
const EXIT_ERR: u8 = 2;

/// expanded information for `--version`
const CLI_VERSION: &str = concatcp!(
    env!("CARGO_PKG_VERSION"),
    "\nMSRV: ",
    env!("CARGO_PKG_RUST_VERSION"),
    "\nLicense: ",
    env!("CARGO_PKG_LICENSE"),
);

/// Render the named-format table for `--help`, aligned like the options
/// table above it.
fn help_formats() -> String {
    let width: usize = NAMED_FORMATS
        .iter()
        .map(|entry| entry.name.len())
        .max()
        .unwrap_or(0);
    let mut help = String::from("Formats:\n");
    for entry in NAMED_FORMATS.iter() {
        match (entry.alias, entry.format) {
            (Some(alias), _) => {
                help.push_str(&format!("   {:width$} -- alias for '{}'\n", entry.name, alias));
            }
            (None, Some(format)) => {
                help.push_str(&format!("   {:width$} -- '{}'\n", entry.name, format));
            }
            (None, None) => {}
        }
    }
    help.push_str("\nSee strptime(3) for format details\n");

    help
}

/// clap command-line arguments build-time definitions.
//
// `-h` selects `--hours` as the reference tool always had it, so clap's
// automatic help and version flags are disabled and declared by hand.
#[derive(Parser, Debug)]
#[clap(
    name = NAME,
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = CLI_VERSION,
    after_help = help_formats(),
    disable_help_flag = true,
    disable_version_flag = true,
)]
struct CLI_Args {
    /// Path(s) of log files to search in random-access mode.
    /// If none are passed, standard input is searched in streaming mode.
    paths: Vec<FPath>,

    /// Datetime format: a name from the Formats table below, or a literal
    /// strptime-style format string.
    #[clap(
        short = 'e',
        long,
        verbatim_doc_comment,
        value_name = "FORMAT",
        default_value_t = String::from("default"),
    )]
    format: String,

    /// Datetime to start the search (inclusive).
    /// Parsed with the active format, then with fallback heuristics
    /// such as "%Y-%m-%d %H:%M:%S" and "%Y-%m-%d".
    /// Defaults to the stop datetime minus the seconds/minutes/hours
    /// offset.
    #[clap(short = 'f', long, verbatim_doc_comment, value_name = "DATETIME")]
    start: Option<String>,

    /// Datetime to stop the search (exclusive).
    /// Parsed like the start datetime. Defaults to now.
    #[clap(short = 't', long, verbatim_doc_comment, value_name = "DATETIME")]
    stop: Option<String>,

    /// Seconds to subtract from the stop datetime when --start is not
    /// passed.
    #[clap(short = 's', long, verbatim_doc_comment, value_name = "N", default_value_t = 0)]
    seconds: u64,

    /// Minutes to subtract from the stop datetime when --start is not
    /// passed.
    #[clap(short = 'm', long, verbatim_doc_comment, value_name = "N", default_value_t = 0)]
    minutes: u64,

    /// Hours to subtract from the stop datetime when --start is not
    /// passed.
    #[clap(short = 'h', long, verbatim_doc_comment, value_name = "N", default_value_t = 0)]
    hours: u64,

    /// Print program version and exit.
    #[clap(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Print this help message and exit.
    #[clap(short = '?', long = "help", action = ArgAction::Help)]
    help: Option<bool>,
}

/// Combined `--seconds --minutes --hours` offset, saturating.
fn args_offset(args: &CLI_Args) -> i64 {
    let offset: u64 = args
        .seconds
        .saturating_add(args.minutes.saturating_mul(60))
        .saturating_add(args.hours.saturating_mul(60 * 60));

    i64::try_from(offset).unwrap_or(i64::MAX)
}

/// Parse one `--start`/`--stop` value.
fn args_datetime(
    value: &str,
    format: &str,
    format_has_tz: bool,
    tz_local: SecsOffset,
) -> Result<EpochSecs, GrepError> {
    datetime_from_arg(value, format, format_has_tz, tz_local)
        .ok_or_else(|| GrepError::ParseArg(value.to_string()))
}

fn run() -> Result<bool, GrepError> {
    let args = CLI_Args::parse();
    defn!("({:?})", args);

    // the process-wide local-time offset, computed once at startup; the
    // default offset for matched datetimes whose format lacks a timezone
    let tz_local: SecsOffset = Local::now().offset().local_minus_utc();
    defo!("local offset {}s", tz_local);

    let format: String = match resolve_format(&args.format) {
        Some(named) => named.to_string(),
        None => args.format.clone(),
    };
    let matcher = DateTimeMatcher::compile(&format, tz_local)?;

    let stop: EpochSecs = match &args.stop {
        Some(value) => args_datetime(value, &format, matcher.format_has_tz(), tz_local)?,
        None => Utc::now().timestamp(),
    };
    let start: EpochSecs = match &args.start {
        Some(value) => args_datetime(value, &format, matcher.format_has_tz(), tz_local)?,
        None => stop.saturating_sub(args_offset(&args)),
    };
    defo!("start {} stop {}", start, stop);

    let mut out = io::stdout().lock();
    let mut emitted: Count = 0;
    for path in args.paths.iter() {
        let region = RegionReader::open(path)?;
        match region.slice_into(start, stop, &matcher, &mut out) {
            ResultS4::Found(count) => emitted += count,
            ResultS4::Done | ResultS4::Null => {}
            ResultS4::Err(err) => return Err(err),
        }
    }
    if args.paths.is_empty() {
        let stdin = io::stdin();
        let mut stream = StreamReader::new(stdin.lock());
        match stream.slice_into(start, stop, &matcher, &mut out) {
            ResultS3::Found(count) => emitted += count,
            ResultS3::Done => {}
            ResultS3::Err(err) => return Err(err),
        }
    }
    out.flush()?;
    defx!("emitted {} bytes", emitted);

    Ok(emitted > 0)
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::from(EXIT_FOUND),
        Ok(false) => ExitCode::from(EXIT_NOTFOUND),
        Err(err) => {
            e_err!("{}", err);
            ExitCode::from(EXIT_ERR)
        }
    }
}
