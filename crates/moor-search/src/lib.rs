#![forbid(unsafe_code)]

//! Search patterns and search history.
//!
//! A search string compiles with smart case (case sensitive iff it contains
//! any uppercase rune) into either a regex or a literal substring matcher.
//! Match ranges come back rune-indexed so highlighting works on cells, not
//! bytes.

pub mod history;
pub mod pattern;
pub mod ranges;

pub use history::SearchHistory;
pub use pattern::Search;
pub use ranges::MatchRanges;
