#![forbid(unsafe_code)]

//! The asynchronous reader: ingest, progress signals, backpressure.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};

use crossbeam_channel::{bounded, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::highlight::{highlighted_lines, HighlightSettings};
use crate::line::{Line, NumberedLine};
use crate::linemeta::LineIndex;
use crate::reformat::reformat_json;
use crate::source::{status_text, LineSource, Lines};

/// Stop ingesting once this many lines are buffered, until somebody asks for
/// more. Keeps a 100 GiB input from being buffered when the user only ever
/// looks at the top screen.
pub const DEFAULT_PAUSE_AFTER_LINES: usize = 20_000;

/// Things that can go wrong while reading input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReaderError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Failed to open {path}: {problem}")]
    Open { path: String, problem: String },
}

/// Reader construction knobs.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Re-style lines with syntax highlighting once reading finishes.
    pub highlight: Option<HighlightSettings>,
    /// Pretty-print the input before highlighting if it parses as one JSON
    /// document.
    pub reformat_json: bool,
    /// Initial backpressure limit; raised later when somebody scrolls down.
    pub pause_after_lines: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            highlight: None,
            reformat_json: false,
            pause_after_lines: DEFAULT_PAUSE_AFTER_LINES,
        }
    }
}

struct ReaderInner {
    name: Option<String>,
    lines: RwLock<Vec<Arc<Line>>>,

    reading_done: AtomicBool,
    highlighting_done: AtomicBool,
    err: Mutex<Option<ReaderError>>,

    // Edge-triggered and coalescing: bounded(1) plus try_send means a slow
    // receiver sees one pulse covering any number of appends.
    more_lines_added_tx: Sender<()>,
    more_lines_added_rx: Receiver<()>,
    maybe_done_tx: Sender<()>,
    maybe_done_rx: Receiver<()>,

    pause_after_lines: Mutex<usize>,
    pause_raised: Condvar,

    done_lock: Mutex<bool>,
    done_signal: Condvar,
}

impl ReaderInner {
    fn signal_more_lines(&self) {
        let _ = self.more_lines_added_tx.try_send(());
    }

    fn pulse_maybe_done(&self) {
        let _ = self.maybe_done_tx.try_send(());
    }

    fn set_reading_done(&self) {
        self.reading_done.store(true, Ordering::SeqCst);
        let mut done = self
            .done_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *done = true;
        self.done_signal.notify_all();
        self.pulse_maybe_done();
    }

    fn set_err(&self, error: ReaderError) {
        warn!("Reader error: {error}");
        let mut slot = self
            .err
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    /// Backpressure: block while the buffer is at or over the limit.
    fn wait_for_room(&self) {
        let mut limit = self
            .pause_after_lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        loop {
            let buffered = self
                .lines
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .len();
            if buffered < *limit {
                return;
            }
            limit = self
                .pause_raised
                .wait(limit)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }
}

/// A handle to an ingesting reader. Cheap to clone; all clones see the same
/// lines.
#[derive(Clone)]
pub struct Reader {
    inner: Arc<ReaderInner>,
}

impl Reader {
    fn empty(name: Option<String>) -> Self {
        let (more_tx, more_rx) = bounded(1);
        let (done_tx, done_rx) = bounded(1);
        Self {
            inner: Arc::new(ReaderInner {
                name,
                lines: RwLock::new(Vec::new()),
                reading_done: AtomicBool::new(false),
                highlighting_done: AtomicBool::new(false),
                err: Mutex::new(None),
                more_lines_added_tx: more_tx,
                more_lines_added_rx: more_rx,
                maybe_done_tx: done_tx,
                maybe_done_rx: done_rx,
                pause_after_lines: Mutex::new(DEFAULT_PAUSE_AFTER_LINES),
                pause_raised: Condvar::new(),
                done_lock: Mutex::new(false),
                done_signal: Condvar::new(),
            }),
        }
    }

    /// A reader over in-memory text, fully ingested before returning. Used
    /// for the built-in help text and by tests.
    #[must_use]
    pub fn from_text(name: Option<&str>, text: &str) -> Self {
        let reader = Self::empty(name.map(String::from));
        {
            let mut lines = reader
                .inner
                .lines
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            for line in text.lines() {
                lines.push(Arc::new(Line::new(line)));
            }
        }
        reader.inner.signal_more_lines();
        reader.inner.set_reading_done();
        reader.inner.highlighting_done.store(true, Ordering::SeqCst);
        reader
    }

    /// A reader ingesting a byte stream on a background thread.
    #[must_use]
    pub fn from_stream(
        stream: Box<dyn Read + Send>,
        name: Option<String>,
        options: ReaderOptions,
    ) -> Self {
        let reader = Self::empty(name);
        reader.set_pause_after_lines(options.pause_after_lines);
        let inner = Arc::clone(&reader.inner);
        if let Err(error) = std::thread::Builder::new()
            .name("reader".into())
            .spawn(move || ingest(&inner, stream, &options))
        {
            reader
                .inner
                .set_err(ReaderError::Io(format!("spawning the reader thread: {error}")));
            reader.inner.set_reading_done();
            reader.inner.highlighting_done.store(true, Ordering::SeqCst);
        }
        reader
    }

    /// A reader over a file. Open failures surface here so the launcher can
    /// bail out before any terminal setup.
    ///
    /// Compressed files are the decompression front-end's business; this
    /// constructor serves the byte stream it is given.
    pub fn from_file(path: &Path, options: ReaderOptions) -> Result<Self, ReaderError> {
        let file = std::fs::File::open(path).map_err(|error| ReaderError::Open {
            path: path.display().to_string(),
            problem: error.to_string(),
        })?;

        let name = path.display().to_string();
        Ok(Self::from_stream(Box::new(file), Some(name), options))
    }

    /// The file name or label shown in the status bar.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Whether ingest has finished (successfully or not).
    #[must_use]
    pub fn reading_done(&self) -> bool {
        self.inner.reading_done.load(Ordering::SeqCst)
    }

    /// Whether the highlighting pass has finished (or was never needed).
    #[must_use]
    pub fn highlighting_done(&self) -> bool {
        self.inner.highlighting_done.load(Ordering::SeqCst)
    }

    /// The first fatal error, if any.
    #[must_use]
    pub fn error(&self) -> Option<ReaderError> {
        self.inner
            .err
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Pulsed (coalescing) after lines were appended.
    #[must_use]
    pub fn more_lines_added(&self) -> Receiver<()> {
        self.inner.more_lines_added_rx.clone()
    }

    /// Pulsed when reading or highlighting finishes.
    #[must_use]
    pub fn maybe_done(&self) -> Receiver<()> {
        self.inner.maybe_done_rx.clone()
    }

    /// Raise (or lower) the backpressure limit and wake the ingest thread.
    pub fn set_pause_after_lines(&self, limit: usize) {
        let mut pause = self
            .inner
            .pause_after_lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *pause != limit {
            debug!("Pause-after-lines set to {limit}");
        }
        *pause = limit;
        self.inner.pause_raised.notify_all();
    }

    /// Block until ingest finishes, then report its outcome. For tests and
    /// for dumping input when there is no terminal.
    pub fn wait(&self) -> Result<(), ReaderError> {
        // Make sure ingest can finish even if nobody raised the limit
        self.set_pause_after_lines(usize::MAX);

        let mut done = self
            .inner
            .done_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        while !*done {
            done = self
                .inner
                .done_signal
                .wait(done)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
        drop(done);

        match self.error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl LineSource for Reader {
    fn line_count(&self) -> usize {
        self.inner
            .lines
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn get_line(&self, index: LineIndex) -> Option<NumberedLine> {
        let lines = self
            .inner
            .lines
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let line = lines.get(index.index())?;
        Some(NumberedLine {
            index,
            number: index.number(),
            line: Arc::clone(line),
        })
    }

    fn get_lines(&self, from: LineIndex, count: usize) -> Lines {
        let lines = self
            .inner
            .lines
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let total = lines.len();

        let first = from.index().min(total);
        let last = first.saturating_add(count).min(total);
        let batch: Vec<NumberedLine> = (first..last)
            .map(|position| {
                let index = LineIndex::from_zero_based(position);
                NumberedLine {
                    index,
                    number: index.number(),
                    line: Arc::clone(&lines[position]),
                }
            })
            .collect();
        drop(lines);

        let last_returned = batch.last().map(|line| line.index);
        let status_text = match self.error() {
            // Reading trouble beats percentages; the UI keeps going either way
            Some(error) => match self.display_name() {
                Some(name) => format!("{name}: {error}"),
                None => error.to_string(),
            },
            None => status_text(self.display_name(), total, last_returned),
        };
        Lines {
            status_text,
            lines: batch,
        }
    }
}

fn ingest(inner: &Arc<ReaderInner>, stream: Box<dyn Read + Send>, options: &ReaderOptions) {
    let mut buffered = BufReader::new(stream);
    let mut buffer: Vec<u8> = Vec::new();

    loop {
        buffer.clear();
        match buffered.read_until(b'\n', &mut buffer) {
            Ok(0) => break,
            Ok(_) => {
                if buffer.last() == Some(&b'\n') {
                    buffer.pop();
                    if buffer.last() == Some(&b'\r') {
                        buffer.pop();
                    }
                }
                let line = Line::new(String::from_utf8_lossy(&buffer).into_owned());
                {
                    let mut lines = inner
                        .lines
                        .write()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    lines.push(Arc::new(line));
                }
                inner.signal_more_lines();
                inner.wait_for_room();
            }
            Err(error) => {
                inner.set_err(ReaderError::Io(error.to_string()));
                break;
            }
        }
    }

    if options.reformat_json {
        let lines = inner
            .lines
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        if let Some(pretty) = reformat_json(&lines) {
            info!("Input reformatted as JSON, {} lines", pretty.len());
            let mut store = inner
                .lines
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *store = pretty.into_iter().map(|raw| Arc::new(Line::new(raw))).collect();
        }
    }

    inner.set_reading_done();
    inner.signal_more_lines();

    if let Some(settings) = &options.highlight {
        let lines = inner
            .lines
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        if let Some(styled) = highlighted_lines(&lines, inner.name.as_deref(), settings) {
            let mut store = inner
                .lines
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if store.len() == styled.len() {
                *store = styled.into_iter().map(|raw| Arc::new(Line::new(raw))).collect();
            } else {
                // Highlighting must never change the line structure
                warn!(
                    "Highlighting changed the line count {} -> {}, dropping it",
                    store.len(),
                    styled.len()
                );
            }
        }
    }

    inner.highlighting_done.store(true, Ordering::SeqCst);
    inner.pulse_maybe_done();
    inner.signal_more_lines();
}
