// src/readers/mod.rs

//! The `readers` module is where the searching and emitting happens:
//! line-oriented binary search over byte regions in [`linesearch.rs`],
//! the memory-mapped random-access driver in [`regionreader.rs`], and
//! the single-pass streaming driver in [`streamreader.rs`].
//!
//! [`linesearch.rs`]: crate::readers::linesearch
//! [`regionreader.rs`]: crate::readers::regionreader
//! [`streamreader.rs`]: crate::readers::streamreader

pub mod linesearch;
pub mod regionreader;
pub mod streamreader;
