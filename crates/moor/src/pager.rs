#![forbid(unsafe_code)]

//! The pager controller: one thread, one event channel, all the state.
//!
//! Everything the user sees and touches funnels through here. Background
//! tasks (reader ingest, the spinner/throttle forwarder, search workers)
//! communicate exclusively by putting events on the channel this controller
//! drains.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{after, bounded, never, select, tick, unbounded, Receiver, Sender};
use moor_reader::{LineIndex, LineSource, Reader, DEFAULT_PAUSE_AFTER_LINES};
use moor_screen::{Event, KeyCode, MouseButton, Screen, StyledRune};
use moor_search::{Search, SearchHistory};
use moor_style::{AttrMask, Style};
use moor_text::{CellWithMetadata, StyleContext};
use tracing::{debug, info, warn};

use crate::filtering::{ActiveSource, FilteringReader};
use crate::help::help_reader;
use crate::modes::{self, InfoState, PagerMode};
use crate::scroll::ScrollPosition;
use crate::styling::UiStyles;

/// How the status bar should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusBarOption {
    #[default]
    Inverse,
    Plain,
    Bold,
}

/// Events produced by the pager's own background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PagerEvent {
    /// The active reader got more lines (throttled and coalesced).
    MoreLinesAvailable,
    /// Reading or highlighting finished; worth re-checking quit conditions.
    MaybeDone,
    /// A new spinner frame, empty once loading is done.
    SpinnerUpdate(String),
}

/// State to restore when leaving the help screen.
pub(crate) struct PreHelpState {
    pub scroll_position: ScrollPosition,
    pub left_column: usize,
    pub target_line: Option<LineIndex>,
}

/// The main on-screen pager.
pub struct Pager<'a> {
    pub(crate) screen: &'a mut dyn Screen,

    // Immutable since startup; the background task reads these too
    pub(crate) readers: Arc<Vec<Reader>>,
    pub(crate) current_reader: Arc<AtomicUsize>,
    pub(crate) reader_switched_tx: Sender<()>,
    pub(crate) reader_switched_rx: Receiver<()>,

    pub(crate) quit: bool,
    pub(crate) mode: PagerMode,
    pub(crate) scroll_position: ScrollPosition,
    pub(crate) left_column: usize,

    pub(crate) search: Search,
    pub(crate) filter: Search,
    pub search_history: SearchHistory,

    pub(crate) is_showing_help: bool,
    pub(crate) pre_help_state: Option<Box<PreHelpState>>,
    pub(crate) help_reader: Reader,

    /// The user's line number preference; left/right scrolling toggles it.
    pub show_line_numbers_pref: bool,
    /// What actually renders right now; search reveals may hide numbers
    /// temporarily.
    pub show_line_numbers: bool,

    pub statusbar_option: StatusBarOption,
    pub show_status_bar: bool,
    pub wrap_long_lines: bool,
    pub quit_if_one_screen: bool,

    pub scroll_left_hint: CellWithMetadata,
    pub scroll_right_hint: CellWithMetadata,
    pub side_scroll_amount: usize,

    /// Scroll here as soon as possible. `LineIndex::MAX` means follow the
    /// tail. Always set through `set_target_line()` so the reader fetches
    /// enough lines.
    pub(crate) target_line: Option<LineIndex>,

    /// If true, clear the screen on exit; if false, leave the content and
    /// keep this many lines free for the shell prompt.
    pub de_init: bool,
    pub de_init_false_margin: usize,

    /// Longest line rendered so far, for clamping rightward scrolling.
    pub(crate) longest_line_length: usize,

    pub(crate) bookmarks: HashMap<char, ScrollPosition>,

    /// Launched by the caller after the screen is restored ('v' for editor).
    pub after_exit: Option<std::process::Command>,

    pub styles: UiStyles,
    pub ctx: StyleContext,
}

impl<'a> Pager<'a> {
    /// A pager over the given readers. Needs at least one.
    #[must_use]
    pub fn new(screen: &'a mut dyn Screen, readers: Vec<Reader>) -> Self {
        assert!(!readers.is_empty(), "Pager needs at least one reader");

        let (switched_tx, switched_rx) = bounded(1);

        Self {
            screen,
            readers: Arc::new(readers),
            current_reader: Arc::new(AtomicUsize::new(0)),
            reader_switched_tx: switched_tx,
            reader_switched_rx: switched_rx,
            quit: false,
            mode: PagerMode::Viewing,
            scroll_position: ScrollPosition::top("Pager scroll position"),
            left_column: 0,
            search: Search::none(),
            filter: Search::none(),
            search_history: SearchHistory::default(),
            is_showing_help: false,
            pre_help_state: None,
            help_reader: help_reader(),
            show_line_numbers_pref: true,
            show_line_numbers: true,
            statusbar_option: StatusBarOption::default(),
            show_status_bar: true,
            wrap_long_lines: false,
            quit_if_one_screen: false,
            scroll_left_hint: CellWithMetadata::new(
                '<',
                Style::DEFAULT.with_attr(AttrMask::REVERSE),
            ),
            scroll_right_hint: CellWithMetadata::new(
                '>',
                Style::DEFAULT.with_attr(AttrMask::REVERSE),
            ),
            side_scroll_amount: 16,
            target_line: None,
            de_init: true,
            de_init_false_margin: 0,
            longest_line_length: 0,
            bookmarks: HashMap::new(),
            after_exit: None,
            styles: UiStyles::default(),
            ctx: StyleContext::default(),
        }
    }

    /// The reader currently being paged, filter not applied.
    #[must_use]
    pub fn active_reader(&self) -> &Reader {
        &self.readers[self.current_reader.load(Ordering::Relaxed)]
    }

    /// Where to scroll once enough input has arrived. Called before
    /// `start_paging()`; `LineIndex::MAX` follows the tail.
    pub fn set_initial_target_line(&mut self, target: Option<LineIndex>) {
        self.target_line = target;
    }

    /// Restore the terminal. Called by the launcher after the event loop.
    pub fn close_screen(&mut self) {
        self.screen.close();
    }

    /// Whether the alternate screen should be cleared on exit. False means
    /// the launcher reprints the content on the normal screen instead.
    #[must_use]
    pub fn clear_on_exit(&self) -> bool {
        self.de_init
    }

    /// What rendering and searching should read from: the help text when
    /// it's showing, otherwise the active reader seen through the filter.
    pub(crate) fn reader(&self) -> ActiveSource<'_> {
        if self.is_showing_help {
            return ActiveSource::Plain(&self.help_reader);
        }
        ActiveSource::Filtered(FilteringReader {
            backing: self.active_reader(),
            filter: &self.filter,
            ctx: &self.ctx,
        })
    }

    /// Content rows on screen: full height minus the status bar.
    #[must_use]
    pub fn visible_height(&self) -> usize {
        let (_, height) = self.screen.size();
        if self.show_status_bar {
            height.saturating_sub(1)
        } else {
            height
        }
    }

    /// Set the target line, and sync the reader so it actually fetches
    /// enough lines to get there.
    pub(crate) fn set_target_line(&mut self, target: Option<LineIndex>) {
        debug!("Setting target line to {target:?}");
        self.target_line = target;

        let reader = self.active_reader();
        match target {
            None => reader.set_pause_after_lines(DEFAULT_PAUSE_AFTER_LINES),
            Some(target) => {
                // Lookahead so we never fetch too few lines; 1000 is larger
                // than any realistic screen height
                let wanted = target
                    .index()
                    .saturating_add(1000)
                    .max(DEFAULT_PAUSE_AFTER_LINES);
                reader.set_pause_after_lines(wanted);
            }
        }
    }

    /// Leave the help screen, or quit the pager.
    pub fn quit(&mut self) {
        if !self.is_showing_help {
            self.quit = true;
            return;
        }

        self.is_showing_help = false;
        if let Some(pre_help) = self.pre_help_state.take() {
            self.scroll_position = pre_help.scroll_position;
            self.left_column = pre_help.left_column;
            self.set_target_line(pre_help.target_line);
        }
    }

    /// Scroll sideways; negative deltas move left. The first step right
    /// hides line numbers, the last step left brings them back.
    pub(crate) fn move_right(&mut self, delta: isize) {
        if self.show_line_numbers_pref && delta > 0 {
            self.show_line_numbers_pref = false;
            self.show_line_numbers = false;
            return;
        }

        if self.left_column == 0 && delta < 0 {
            self.show_line_numbers_pref = true;
            self.show_line_numbers = true;
            return;
        }

        let result = self.left_column as isize + delta;
        self.left_column = result.max(0) as usize;

        // Don't scroll infinitely into the void past the longest line
        if self.left_column > self.longest_line_length {
            self.left_column = self.longest_line_length;
        }
    }

    /// Any upward scroll stops tail following.
    pub(crate) fn handle_scrolled_up(&mut self) {
        self.set_target_line(None);
    }

    /// A downward scroll that hits the end starts tail following.
    pub(crate) fn handle_scrolled_down(&mut self) {
        if self.is_scrolled_to_end() {
            self.set_target_line(Some(LineIndex::MAX));
        } else {
            self.set_target_line(None);
        }
    }

    /// Toggle tab size between 8 and 4.
    pub(crate) fn cycle_tab_size(&mut self) {
        // less defaults to 8, so anything unexpected goes back to 8
        self.ctx.tab_size = if self.ctx.tab_size == 8 { 4 } else { 8 };
        self.mode = PagerMode::Info(InfoState::new(format!(
            "Tab size set to {}",
            self.ctx.tab_size
        )));
    }

    /// Dispatch a key press to the current mode.
    pub fn on_key(&mut self, key: KeyCode) {
        match self.mode {
            PagerMode::Viewing => modes::viewing::on_key(self, key),
            PagerMode::NotFound => modes::not_found::on_key(self, key),
            PagerMode::Mark => modes::marks::on_key_set(self, key),
            PagerMode::JumpToMark => modes::marks::on_key_jump(self, key),
            PagerMode::ColonCommand => modes::colon::on_key(self, key),
            PagerMode::Search(_) => {
                let PagerMode::Search(state) = std::mem::replace(&mut self.mode, PagerMode::Viewing)
                else {
                    unreachable!()
                };
                modes::search::on_key(self, state, key);
            }
            PagerMode::Filter(_) => {
                let PagerMode::Filter(state) = std::mem::replace(&mut self.mode, PagerMode::Viewing)
                else {
                    unreachable!()
                };
                modes::filter::on_key(self, state, key);
            }
            PagerMode::GotoLine(_) => {
                let PagerMode::GotoLine(state) =
                    std::mem::replace(&mut self.mode, PagerMode::Viewing)
                else {
                    unreachable!()
                };
                modes::goto_line::on_key(self, state, key);
            }
            PagerMode::Info(_) => {
                self.mode = PagerMode::Viewing;
                self.on_key(key);
            }
        }
    }

    /// Dispatch a typed rune to the current mode.
    pub fn on_rune(&mut self, rune: char) {
        match self.mode {
            PagerMode::Viewing => modes::viewing::on_rune(self, rune),
            PagerMode::NotFound => modes::not_found::on_rune(self, rune),
            PagerMode::Mark => modes::marks::on_rune_set(self, rune),
            PagerMode::JumpToMark => modes::marks::on_rune_jump(self, rune),
            PagerMode::ColonCommand => modes::colon::on_rune(self, rune),
            PagerMode::Search(_) => {
                let PagerMode::Search(state) = std::mem::replace(&mut self.mode, PagerMode::Viewing)
                else {
                    unreachable!()
                };
                modes::search::on_rune(self, state, rune);
            }
            PagerMode::Filter(_) => {
                let PagerMode::Filter(state) = std::mem::replace(&mut self.mode, PagerMode::Viewing)
                else {
                    unreachable!()
                };
                modes::filter::on_rune(self, state, rune);
            }
            PagerMode::GotoLine(_) => {
                let PagerMode::GotoLine(state) =
                    std::mem::replace(&mut self.mode, PagerMode::Viewing)
                else {
                    unreachable!()
                };
                modes::goto_line::on_rune(self, state, rune);
            }
            PagerMode::Info(_) => {
                self.mode = PagerMode::Viewing;
                self.on_rune(rune);
            }
        }
    }

    /// Paint one full frame: content rows, EOF marker, footer.
    pub fn redraw(&mut self, spinner: &str) {
        self.screen.clear();
        let rendered = self.render_lines();
        let (width, height) = self.screen.size();

        for (row_index, row) in rendered.lines.iter().enumerate() {
            let mut column = 0;
            for cell in &row.cells {
                column += self.screen.set_cell(
                    column,
                    row_index,
                    StyledRune::new(cell.rune, cell.style.clone()),
                );
            }
            if row.trailer != Style::DEFAULT {
                while column < width {
                    column += self.screen.set_cell(
                        column,
                        row_index,
                        StyledRune::new(' ', row.trailer.clone()),
                    );
                }
            }
        }

        // After the content: the spinner while loading, "---" when done
        let eof_row = rendered.lines.len();
        if eof_row < height {
            let marker = if spinner.is_empty() { "---" } else { spinner };
            let mut column = 0;
            for rune in marker.chars() {
                column += self.screen.set_cell(
                    column,
                    eof_row,
                    StyledRune::new(rune, self.styles.line_numbers.clone()),
                );
            }
        }

        self.draw_footer(&rendered.status_text, spinner);
        self.screen.show();
    }

    /// Draw the bottom row the way the current mode wants it.
    pub(crate) fn draw_footer(&mut self, status_text: &str, spinner: &str) {
        let mut mode = std::mem::replace(&mut self.mode, PagerMode::Viewing);
        match &mut mode {
            PagerMode::Viewing => self.draw_viewing_footer(status_text, spinner),
            PagerMode::NotFound => {
                let footer = format!("Not found: {}", self.search.as_str());
                self.set_footer(&footer, "Press 'n'/'p' to wrap the search");
            }
            PagerMode::Search(state) => {
                let prompt = match state.direction {
                    crate::linescan::SearchDirection::Forward => "Search: ",
                    crate::linescan::SearchDirection::Backward => "Search backwards: ",
                };
                state.input_box.draw(&mut *self.screen, prompt);
            }
            PagerMode::Filter(state) => {
                state.input_box.draw(&mut *self.screen, "Filter: ");
            }
            PagerMode::GotoLine(state) => {
                state.input_box.draw(&mut *self.screen, "Go to line number: ");
            }
            PagerMode::ColonCommand => {
                self.draw_prompt_footer("Go to [n]ext, [p]revious or first [x] file: ");
            }
            PagerMode::Mark => {
                self.draw_prompt_footer("Press any letter to label this mark: ");
            }
            PagerMode::JumpToMark => {
                self.draw_prompt_footer("Jump to mark: ");
            }
            PagerMode::Info(state) => {
                let text = state.text.clone();
                self.set_footer(&text, "");
            }
        }
        self.mode = mode;
    }

    fn draw_viewing_footer(&mut self, status_text: &str, spinner: &str) {
        if !self.show_status_bar {
            return;
        }

        let mut prefix = String::new();
        let mut colon_help = "";
        if self.readers.len() > 1 {
            prefix = format!(
                "[{}/{}] ",
                self.current_reader.load(Ordering::Relaxed) + 1,
                self.readers.len()
            );
            colon_help = "':' to switch, ";
        }

        let search_help = if self.search.inactive() {
            "'/' to search"
        } else {
            "'n'/'p' to search next/previous"
        };

        let mut help_text = format!(
            "Press 'ESC' / 'q' to exit, {colon_help}{search_help}, '&' to filter, 'h' for help"
        );
        if self.is_showing_help {
            help_text = format!("Press 'ESC' / 'q' to exit help, {search_help}");
            prefix = String::new();
        }

        let spinner_part = if spinner.is_empty() {
            String::new()
        } else {
            format!("  {spinner}")
        };
        let footer = format!("{prefix}{status_text}{spinner_part}");
        self.set_footer(&footer, &help_text);
    }

    /// A bare prompt on the bottom row with a reverse-video cursor cell.
    fn draw_prompt_footer(&mut self, prompt: &str) {
        let (width, height) = self.screen.size();
        if height == 0 {
            return;
        }
        let row = height - 1;

        let mut pos = 0;
        for rune in prompt.chars() {
            pos += self
                .screen
                .set_cell(pos, row, StyledRune::new(rune, Style::DEFAULT));
        }
        pos += self.screen.set_cell(
            pos,
            row,
            StyledRune::new(' ', Style::DEFAULT.with_attr(AttrMask::REVERSE)),
        );
        while pos < width {
            pos += self
                .screen
                .set_cell(pos, row, StyledRune::new(' ', Style::DEFAULT));
        }
    }

    /// Draw the status-bar line: footer text, then help with single-quoted
    /// keyboard shortcuts highlighted (quotes stripped).
    pub(crate) fn set_footer(&mut self, footer: &str, help: &str) {
        let (width, height) = self.screen.size();
        if height == 0 {
            return;
        }
        let row = height - 1;
        let statusbar = self.styles.statusbar.clone();

        let mut pos = 0;
        for rune in footer.chars().chain("  ".chars()) {
            pos += self
                .screen
                .set_cell(pos, row, StyledRune::new(rune, statusbar.clone()));
        }

        // Pick a highlight that is visible against the statusbar style
        let mut highlight_attr = AttrMask::BOLD;
        if statusbar.has_attr(highlight_attr) {
            highlight_attr = AttrMask::UNDERLINE;
        }
        if statusbar.has_attr(highlight_attr) {
            highlight_attr = AttrMask::REVERSE;
        }

        let highlighted = statusbar.clone().with_attr(highlight_attr);
        let mut style = statusbar.clone();
        for rune in help.chars() {
            if rune == '\'' {
                // Highlight things within single quotes
                style = if style == statusbar {
                    highlighted.clone()
                } else {
                    statusbar.clone()
                };
                continue;
            }
            pos += self
                .screen
                .set_cell(pos, row, StyledRune::new(rune, style.clone()));
        }

        while pos < width {
            pos += self
                .screen
                .set_cell(pos, row, StyledRune::new(' ', statusbar.clone()));
        }
    }

    /// The main loop: render when idle, then block for the next event.
    pub fn start_paging(&mut self) {
        info!("Pager starting");

        // Make sure the reader knows how many lines we want
        self.set_target_line(self.target_line);

        let (internal_tx, internal_rx) = unbounded();
        {
            let readers = Arc::clone(&self.readers);
            let current = Arc::clone(&self.current_reader);
            let switched = self.reader_switched_rx.clone();
            if let Err(error) = std::thread::Builder::new()
                .name("pager-background".into())
                .spawn(move || run_background(&readers, &current, &switched, &internal_tx))
            {
                warn!("Could not spawn the pager background task: {error}");
            }
        }

        info!("Entering pager main loop...");

        let mut spinner = String::new();
        while !self.quit {
            if self.screen.events().is_empty() && internal_rx.is_empty() {
                // Nothing more to process for now, redraw the screen
                self.redraw(&spinner);

                if self.should_quit_for_one_screen() {
                    // The line numbers setting needs a redraw to take effect
                    self.redraw(&spinner);
                    info!("Exiting, single screen of input and we're done reading it");
                    break;
                }
            }

            enum LoopEvent {
                Terminal(Event),
                Internal(PagerEvent),
            }

            let event = select! {
                recv(self.screen.events()) -> event => match event {
                    Ok(event) => LoopEvent::Terminal(event),
                    Err(_) => break,
                },
                recv(internal_rx) -> event => match event {
                    Ok(event) => LoopEvent::Internal(event),
                    Err(_) => break,
                },
            };

            match event {
                LoopEvent::Terminal(Event::Key(key)) => self.on_key(key),
                LoopEvent::Terminal(Event::Rune(rune)) => self.on_rune(rune),
                LoopEvent::Terminal(Event::Mouse(button)) => match button {
                    // Clipping is done when rendering
                    MouseButton::WheelUp => {
                        self.scroll_position = self.scroll_position.previous_line(1);
                    }
                    MouseButton::WheelDown => {
                        self.scroll_position = self.scroll_position.next_line(1);
                    }
                    MouseButton::WheelLeft => {
                        self.move_right(-(self.side_scroll_amount as isize));
                    }
                    MouseButton::WheelRight => {
                        self.move_right(self.side_scroll_amount as isize);
                    }
                },
                LoopEvent::Terminal(Event::Resize) => {
                    // Implicitly redrawn by taking another lap in the loop
                }
                LoopEvent::Terminal(Event::Exit) => {
                    info!("Terminal went away, exiting");
                    return;
                }
                LoopEvent::Internal(PagerEvent::MoreLinesAvailable) => {
                    self.handle_more_lines_available();
                }
                LoopEvent::Internal(PagerEvent::MaybeDone) => {
                    // Handled by the quit-if-one-screen check on the next
                    // idle redraw
                }
                LoopEvent::Internal(PagerEvent::SpinnerUpdate(frame)) => spinner = frame,
            }
        }
    }

    /// The user wants to get somewhere; chase the target as lines arrive.
    pub(crate) fn handle_more_lines_available(&mut self) {
        if !matches!(self.mode, PagerMode::Viewing) {
            return;
        }
        let Some(target) = self.target_line else {
            return;
        };

        let line_count = self.reader().line_count();
        let target_available =
            LineIndex::from_length(line_count).is_some_and(|last| !last.is_before(target));
        if target_available {
            // We can see the target, scroll to it and stop chasing
            self.scroll_position = ScrollPosition::from_index("goToTargetLine", target);
            self.set_target_line(None);
        } else {
            // Not there yet, keep scrolling. The target stays set, so tail
            // following (target = MAX) keeps chasing forever.
            let Some(last) = LineIndex::from_length(line_count) else {
                return;
            };
            self.scroll_position = ScrollPosition {
                line_index: Some(last),
                delta_screen_lines: isize::MAX / 2,
                name: "keepScrollingToTarget",
            };
        }
    }

    /// The `--quit-if-one-screen` early exit: a single fully-read reader
    /// whose contents fit on one screen.
    pub(crate) fn should_quit_for_one_screen(&mut self) -> bool {
        if self.readers.len() != 1 || !self.quit_if_one_screen || self.is_showing_help {
            return false;
        }

        // Cheap checks passed, now the atomic ones
        let reader = self.active_reader();
        if !reader.reading_done() || !reader.highlighting_done() {
            return false;
        }

        let (width, height) = self.screen.size();
        let height = height.saturating_sub(self.de_init_false_margin);
        if !fits_on_one_screen(reader, &self.ctx, width, height) {
            return false;
        }

        self.show_line_numbers_pref = false;
        self.show_line_numbers = false;
        self.de_init = false;
        self.quit = true;
        true
    }

    /// After the normal screen is back, print the pager contents again so
    /// they stay visible in the terminal scrollback.
    pub fn reprint_after_exit(&mut self) {
        let rendered = self.render_lines();
        let (_, screen_height) = self.screen.size();
        let keep_for_prompt = screen_height.saturating_sub(self.de_init_false_margin);
        let count = rendered.lines.len().min(keep_for_prompt);
        if count > 0 {
            self.screen.show_n_lines(count);
            println!();
        }
    }
}

/// True when every line of the (fully read) input fits on one screen.
///
/// The height has the user's shell prompt margin already subtracted, so
/// nothing scrolls away after we exit.
pub(crate) fn fits_on_one_screen(reader: &Reader, ctx: &StyleContext, width: usize, height: usize) -> bool {
    if reader.line_count() > height {
        return false;
    }

    let lines = reader.get_lines(LineIndex::from_zero_based(0), reader.line_count());
    for line in &lines.lines {
        if line.display_width(ctx) > width {
            // Too long to fit on one screen line, no fit
            return false;
        }
    }
    true
}

/// The spinner / more-lines forwarder task.
///
/// Forwards the active reader's coalescing signals onto the pager's event
/// channel, with a 200 ms mute after each more-lines pulse so a fast
/// producer can't flood the event loop. A reader switch resets the throttle
/// and forwards a synthetic more-lines event so the view refreshes.
fn run_background(
    readers: &Arc<Vec<Reader>>,
    current: &Arc<AtomicUsize>,
    switched: &Receiver<()>,
    events: &Sender<PagerEvent>,
) {
    const SPINNER_FRAMES: [&str; 4] = ["/.\\", "-o-", "\\O/", "| |"];
    const THROTTLE: Duration = Duration::from_millis(200);

    let spinner_tick = tick(Duration::from_millis(200));
    let mut spinner_index = 0usize;

    let mut reader = readers[current.load(Ordering::Relaxed)].clone();
    let mut more_lines = reader.more_lines_added();
    let mut maybe_done = reader.maybe_done();
    let never_pulse: Receiver<()> = never();
    let mut reenable: Receiver<std::time::Instant> = never();
    let mut muted = false;

    enum Wakeup {
        Switched,
        MoreLines(bool),
        Reenable,
        SpinnerTick,
        MaybeDone(bool),
    }

    loop {
        let throttled_more_lines = if muted { &never_pulse } else { &more_lines };

        let wakeup = select! {
            recv(switched) -> _ => Wakeup::Switched,
            recv(throttled_more_lines) -> pulse => Wakeup::MoreLines(pulse.is_ok()),
            recv(reenable) -> _ => Wakeup::Reenable,
            recv(spinner_tick) -> _ => Wakeup::SpinnerTick,
            recv(maybe_done) -> pulse => Wakeup::MaybeDone(pulse.is_ok()),
        };

        let to_send = match wakeup {
            Wakeup::Switched => {
                // A different reader is now active; look in the right place
                // for more lines
                reader = readers[current.load(Ordering::Relaxed)].clone();
                more_lines = reader.more_lines_added();
                maybe_done = reader.maybe_done();
                muted = false;
                reenable = never();

                // Tell the viewer to replace the view
                Some(PagerEvent::MoreLinesAvailable)
            }
            Wakeup::MoreLines(true) => {
                // Mute further pulses for a while so a firehose input can't
                // flood the event loop
                muted = true;
                reenable = after(THROTTLE);
                Some(PagerEvent::MoreLinesAvailable)
            }
            Wakeup::Reenable => {
                muted = false;
                reenable = never();
                None
            }
            Wakeup::SpinnerTick => {
                let frame = if reader.reading_done() {
                    String::new()
                } else {
                    SPINNER_FRAMES[spinner_index % SPINNER_FRAMES.len()].to_string()
                };
                spinner_index += 1;
                Some(PagerEvent::SpinnerUpdate(frame))
            }
            Wakeup::MoreLines(false) | Wakeup::MaybeDone(false) => None,
            Wakeup::MaybeDone(true) => Some(PagerEvent::MaybeDone),
        };

        if let Some(event) = to_send {
            if events.send(event).is_err() {
                // The pager is gone
                return;
            }
        }
    }
}
