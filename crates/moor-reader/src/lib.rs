#![forbid(unsafe_code)]

//! Streaming input: lines, line metadata, and the asynchronous reader.
//!
//! A [`Reader`] ingests a file or stream on a background thread, splitting it
//! into [`Line`]s that stay put for the life of the process. Consumers see
//! progress through coalescing signals and ask for lines through the
//! [`LineSource`] surface, which a filtering view can also implement.

pub mod highlight;
pub mod line;
pub mod linemeta;
pub mod reader;
pub mod reformat;
pub mod source;

pub use line::{Line, NumberedLine};
pub use linemeta::{LineIndex, LineNumber};
pub use reader::{Reader, ReaderError, ReaderOptions, DEFAULT_PAUSE_AFTER_LINES};
pub use source::{LineSource, Lines};
