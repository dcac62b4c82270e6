//! Regex backend selection.
//!
//! The `regex` feature uses the full `regex` crate; `lite` swaps in
//! `regex-lite` for smaller binaries. Both expose the same subset used here.

#[cfg(feature = "regex")]
pub(crate) use regex::{Captures, Regex};

#[cfg(all(feature = "lite", not(feature = "regex")))]
pub(crate) use regex_lite::{Captures, Regex};
