#![forbid(unsafe_code)]

//! Scanning input lines for search hits, in parallel.
//!
//! Searching loops over *input lines*, not screen lines. The line range is
//! split into one contiguous chunk per core; every chunk scans on its own
//! thread through a small sliding-window line cache, and the earliest hit
//! along the search direction wins. Chunks past a found hit keep running
//! until they notice the stop flag; their results are discarded.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use moor_reader::{LineIndex, LineSource, NumberedLine};
use moor_search::Search;
use moor_text::StyleContext;
use tracing::{debug, error};

/// Which way a search moves through the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Fetch this many consecutive lines per cache miss. For small searches any
/// value is fine; for many-core scans of huge files this was tuned
/// empirically against the search benchmarks.
const SEARCH_LINE_CACHE_SIZE: usize = 5_000;

/// A sliding window of consecutive lines, refilled in the search direction.
#[derive(Default)]
struct SearchLineCache {
    lines: Vec<NumberedLine>,
}

impl SearchLineCache {
    fn get_line(
        &mut self,
        source: &dyn LineSource,
        index: LineIndex,
        direction: SearchDirection,
    ) -> Option<NumberedLine> {
        if let Some(hit) = self.from_cache(index) {
            return Some(hit);
        }

        // Cache miss, load new lines
        let first_to_request = match direction {
            SearchDirection::Forward => index,
            SearchDirection::Backward => {
                // For index 10 with cache size 5 we want 6..=10 in the cache
                index.non_wrapping_add(-(SEARCH_LINE_CACHE_SIZE as isize) + 1)
            }
        };

        let lines = source.get_lines(first_to_request, SEARCH_LINE_CACHE_SIZE);
        if lines.lines.is_empty() {
            // No lines at all
            return None;
        }
        self.lines = lines.lines;

        self.from_cache(index)
    }

    fn from_cache(&self, index: LineIndex) -> Option<NumberedLine> {
        let first = self.lines.first()?.index;
        let last = self.lines.last()?.index;
        if index.is_before(first) || index.is_after(last) {
            return None;
        }
        self.lines.get(index.index() - first.index()).cloned()
    }
}

/// Find the first hit from `start` in the given direction. `before` is
/// exclusive: that line is not searched.
///
/// Equivalent to a single-threaded linear scan, only faster on big inputs.
#[must_use]
pub fn find_first_hit<S: LineSource + Sync>(
    source: &S,
    search: &Search,
    ctx: &StyleContext,
    start: LineIndex,
    before: Option<LineIndex>,
    direction: SearchDirection,
) -> Option<LineIndex> {
    // If the number of lines to search matches the number of cores (or
    // more), divide the search into chunks. Otherwise use one chunk.
    let mut chunk_count = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);

    let lines_count = match direction {
        SearchDirection::Backward => match before {
            // Searching from 1 with before set to 0 should make the count 1
            Some(before) => start.index().saturating_sub(before.index()),
            // If the start position is zero, that should make the count one
            None => start.index() + 1,
        },
        SearchDirection::Forward => match before {
            Some(before) => before.index().saturating_sub(start.index()),
            None => source.line_count().saturating_sub(start.index()),
        },
    };

    if lines_count < chunk_count {
        chunk_count = 1;
    }
    let chunk_size = lines_count / chunk_count.max(1);

    debug!("Searching {lines_count} lines across {chunk_count} chunks of {chunk_size}...");

    let direction_sign: isize = match direction {
        SearchDirection::Forward => 1,
        SearchDirection::Backward => -1,
    };
    let chunk_starts: Vec<LineIndex> = (0..chunk_count)
        .map(|chunk| start.non_wrapping_add(chunk as isize * direction_sign * chunk_size as isize))
        .collect();

    let stop = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..chunk_count)
            .map(|chunk| {
                let chunk_start = chunk_starts[chunk];
                let chunk_before = if chunk + 1 < chunk_starts.len() {
                    Some(chunk_starts[chunk + 1])
                } else {
                    before
                };
                let stop = &stop;
                scope.spawn(move || {
                    catch_unwind(AssertUnwindSafe(|| {
                        scan_chunk(source, search, ctx, chunk_start, chunk_before, direction, stop)
                    }))
                    .unwrap_or_else(|_| {
                        error!("Search chunk panicked, reporting no hit for it");
                        None
                    })
                })
            })
            .collect();

        // Collect results in chunk order along the search direction; the
        // first hit wins. Cancellation of the rest is best-effort.
        let mut winner = None;
        for handle in handles {
            let result = handle.join().unwrap_or(None);
            if winner.is_none() {
                if let Some(hit) = result {
                    winner = Some(hit);
                    stop.store(true, Ordering::Relaxed);
                }
            }
        }
        winner
    })
}

fn scan_chunk(
    source: &dyn LineSource,
    search: &Search,
    ctx: &StyleContext,
    start: LineIndex,
    before: Option<LineIndex>,
    direction: SearchDirection,
    stop: &AtomicBool,
) -> Option<LineIndex> {
    let mut cache = SearchLineCache::default();
    let mut position = start;
    loop {
        if stop.load(Ordering::Relaxed) {
            // Some earlier chunk already won
            return None;
        }

        let line = cache.get_line(source, position, direction)?;

        if search.matches(line.plain(ctx)) {
            return Some(position);
        }

        match direction {
            SearchDirection::Forward => position = position.non_wrapping_add(1),
            SearchDirection::Backward => {
                if position.is_zero() {
                    // Reached the top without any match, give up
                    return None;
                }
                position = position.non_wrapping_add(-1);
            }
        }

        if before == Some(position) {
            // No match, give up
            return None;
        }
    }
}
