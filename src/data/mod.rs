// src/data/mod.rs

//! The `data` module is specialized data for _tslib_,
//! chiefly datetime format compilation and timestamp extraction
//! in [`datetime.rs`].
//!
//! [`datetime.rs`]: crate::data::datetime

pub mod datetime;
