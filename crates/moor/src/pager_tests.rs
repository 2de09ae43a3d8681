//! Pager-level tests: rendering, scrolling, filtering, following, quitting.

use std::io::Read;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver};
use moor_reader::{LineIndex, LineSource, Reader, ReaderOptions};
use moor_screen::{FakeScreen, KeyCode};
use moor_style::{AttrMask, Color, Style};
use moor_text::CellWithMetadata;

use crate::pager::{fits_on_one_screen, Pager};
use crate::scroll::ScrollPosition;

fn cells_to_string(cells: &[CellWithMetadata]) -> String {
    let text: String = cells.iter().map(|cell| cell.rune).collect();
    text.trim_end_matches(' ').to_string()
}

#[test]
fn empty_input_renders_nothing() {
    let reader = Reader::from_text(Some("test"), "");
    let mut screen = FakeScreen::new(99, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 0);
    assert_eq!(rendered.status_text, "test: <empty>");
    assert!(pager.line_index().is_none());
}

#[test]
fn overflow_scroll_down_clips_to_top() {
    let reader = Reader::from_text(Some("test"), "hej");
    let mut screen = FakeScreen::new(10, 2);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_line_numbers_pref = false;
    pager.show_line_numbers = false;

    // This position is nonsense and should get clipped
    pager.scroll_position =
        ScrollPosition::from_index("overflow test", LineIndex::from_one_based(42));

    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 1);
    assert_eq!(cells_to_string(&rendered.lines[0].cells), "hej");
    assert_eq!(rendered.status_text, "test: 1 line 100%");
    assert!(pager.line_index().unwrap().is_zero());
    assert_eq!(pager.delta_screen_lines(), 0);
}

#[test]
fn overflow_scroll_up_clips_to_top() {
    let reader = Reader::from_text(Some("test"), "hej");
    let mut screen = FakeScreen::new(10, 2);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_line_numbers_pref = false;
    pager.show_line_numbers = false;

    pager.scroll_position = ScrollPosition::top("overflow test").previous_line(42);

    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 1);
    assert_eq!(cells_to_string(&rendered.lines[0].cells), "hej");
    assert!(pager.line_index().unwrap().is_zero());
    assert_eq!(pager.delta_screen_lines(), 0);
}

#[test]
fn wrapping_end_to_end() {
    let reader = Reader::from_text(
        Some("test"),
        "first line\nline two will be wrapped\nhere's the last line",
    );
    let mut screen = FakeScreen::new(10, 99);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.wrap_long_lines = true;
    pager.show_line_numbers_pref = false;
    pager.show_line_numbers = false;

    // This is what we're testing really
    pager.scroll_to_end();
    pager.redraw("");
    drop(pager);

    let rows: Vec<String> = (0..8).map(|y| screen.row_to_string(y)).collect();
    assert_eq!(
        rows,
        [
            "first line",
            "line two",
            "will be",
            "wrapped",
            "here's the",
            "last line",
            "---",
            "",
        ]
    );
}

#[test]
fn one_line_terminal_with_status_bar_has_no_content_rows() {
    let reader = Reader::from_text(Some("test"), "hej");
    let mut screen = FakeScreen::new(20, 1);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_status_bar = true;

    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 0);
}

#[test]
fn search_hits_render_highlighted() {
    let reader = Reader::from_text(None, "x\"\"x");
    let mut screen = FakeScreen::new(100, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_line_numbers_pref = false;
    pager.show_line_numbers = false;
    pager.search.set("\"");

    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 1);
    let cells = &rendered.lines[0].cells;

    let reverse = Style::DEFAULT.with_attr(AttrMask::REVERSE);
    assert_eq!(cells[0].style, Style::DEFAULT);
    assert_eq!(cells[1].style, reverse);
    assert!(cells[1].starts_search_hit);
    assert_eq!(cells[2].style, reverse);
    assert!(!cells[2].starts_search_hit);
    assert_eq!(cells[3].style, Style::DEFAULT);
}

#[test]
fn hit_lines_get_the_mixed_background() {
    let reader = Reader::from_text(None, "hit here\nnothing\n");
    let mut screen = FakeScreen::new(40, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_line_numbers_pref = false;
    pager.show_line_numbers = false;
    pager.search.set("hit");
    let mixed = Color::rgb(20, 20, 20);
    pager.styles.search_hit_line_background = Some(mixed);

    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 2);

    for cell in &rendered.lines[0].cells {
        assert_eq!(cell.style.background(), mixed, "hit line cell {:?}", cell.rune);
    }
    assert_eq!(rendered.lines[0].trailer.background(), mixed);

    for cell in &rendered.lines[1].cells {
        assert_eq!(cell.style.background(), Color::Default);
    }
}

#[test]
fn filter_shortens_input() {
    // Scrolled to the bottom of a 1001 line file, then a filter matching
    // only the first line: we should end up as far down as possible, which
    // is the top.
    let text = format!("first\n{}", "line\n".repeat(1000));
    let reader = Reader::from_text(Some("test"), &text);
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_status_bar = false;
    pager.show_line_numbers_pref = false;
    pager.show_line_numbers = false;

    pager.scroll_to_end();
    assert_eq!(
        pager.line_index().unwrap().index(),
        991,
        "This should have been the effect of scrolling to the end"
    );

    pager.filter.set("first");

    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 1, "Should have rendered one line");
    assert_eq!(cells_to_string(&rendered.lines[0].cells), "first");
    assert_eq!(
        pager.line_index().unwrap().index(),
        0,
        "Should have scrolled to the first line"
    );
}

#[test]
fn filter_shortens_input_many_lines() {
    // 1000 lines, the first 100 after "first" matching. Scroll to the
    // bottom, filter, and the last matching lines should be visible.
    let mut lines = vec!["first".to_string()];
    for i in 0..999 {
        if i < 100 {
            lines.push(format!("match {i}"));
        } else {
            lines.push(format!("other {i}"));
        }
    }
    let reader = Reader::from_text(Some("test"), &lines.join("\n"));
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_line_numbers_pref = false;
    pager.show_line_numbers = false;

    pager.scroll_to_end();
    assert_eq!(
        pager.line_index().unwrap().index(),
        991,
        "Should be at the last line before filtering"
    );

    pager.filter.set("^match");

    let rendered = pager.render_lines();
    assert_eq!(
        rendered.lines.len(),
        9,
        "Should have rendered 9 lines (10 minus one status bar)"
    );
    for (i, row) in rendered.lines.iter().enumerate() {
        assert_eq!(cells_to_string(&row.cells), format!("match {}", 91 + i));
    }
    assert_eq!(pager.line_index().unwrap().index(), 91);
    assert_eq!(
        cells_to_string(&rendered.lines.last().unwrap().cells),
        "match 99"
    );
}

#[test]
fn filtered_out_everything_renders_empty() {
    let reader = Reader::from_text(Some("test"), "hej");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 1);

    pager.filter.set("x");
    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 0);
}

#[test]
fn filtering_empty_input_renders_empty() {
    let reader = Reader::from_text(Some("test"), "");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    pager.filter.set("x");
    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 0);
}

// --- Scroll position canonicalisation ---------------------------------

const SCREEN_HEIGHT: usize = 60;

#[test]
fn last_visible_position_tracks_the_top() {
    let reader = Reader::from_text(Some("test"), &"a\n".repeat(2000));
    let mut screen = FakeScreen::new(100, SCREEN_HEIGHT);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_line_numbers_pref = true;
    pager.show_line_numbers = true;
    pager.show_status_bar = true;

    for start_line in (0..1500).step_by(7) {
        pager.scroll_position =
            ScrollPosition::from_index("canonical test", LineIndex::from_zero_based(start_line));
        let last_visible = pager.last_visible_position();
        assert_eq!(
            last_visible.line_index.unwrap().index(),
            start_line + SCREEN_HEIGHT - 2,
            "start line {start_line}"
        );
    }
}

fn try_scroll_amount(scroll_from: usize, scroll_distance: isize) {
    // 1492 lines of single-char content on an 80 x 60 screen
    let reader = Reader::from_text(Some("test"), &"x\n".repeat(1492));
    let mut screen = FakeScreen::new(80, SCREEN_HEIGHT);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_line_numbers_pref = true;
    pager.show_line_numbers = true;

    pager.scroll_position = ScrollPosition {
        line_index: Some(LineIndex::from_zero_based(scroll_from)),
        delta_screen_lines: scroll_distance,
        name: "try_scroll_amount",
    };

    // Trigger rendering (and canonicalisation). A miscomputed number prefix
    // used to blow up while building the line prefix here.
    let rendered = pager.render_lines();

    assert_eq!(rendered.lines.len(), pager.visible_height());
    let expected_top = LineIndex::from_zero_based(scroll_from).non_wrapping_add(scroll_distance);
    assert_eq!(rendered.lines[0].input_line_index, Some(expected_top));
}

#[test]
fn fast_scroll_across_1000_does_not_panic() {
    // Rapid scroll crossing from 3 to 4 digits must not break on a
    // too-short number prefix
    try_scroll_amount(900, 200);
}

#[test]
fn backwards_scroll_across_1000() {
    try_scroll_amount(1000, -60);
}

#[test]
fn scroll_starts_across_1000_do_not_panic() {
    for scroll_from in (1000 - SCREEN_HEIGHT - 10)..=1000 {
        try_scroll_amount(scroll_from, SCREEN_HEIGHT as isize);
    }
}

#[test]
fn scroll_distances_across_1000_do_not_panic() {
    let scroll_from = 1000 - SCREEN_HEIGHT - 10;
    for scroll_distance in 0..=(3 * SCREEN_HEIGHT) {
        try_scroll_amount(scroll_from, scroll_distance as isize);
    }
}

#[test]
fn backwards_scroll_starts_across_1000_do_not_panic() {
    for scroll_from in 1000..=(1000 + SCREEN_HEIGHT + 10) {
        try_scroll_amount(scroll_from, -(SCREEN_HEIGHT as isize));
    }
}

#[test]
fn canonicalisation_is_idempotent() {
    let reader = Reader::from_text(Some("test"), &"x\n".repeat(100));
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    for (index, delta) in [(0, 0), (5, 3), (50, -20), (99, 1000)] {
        let position = ScrollPosition {
            line_index: Some(LineIndex::from_zero_based(index)),
            delta_screen_lines: delta,
            name: "idempotence",
        };
        let once = pager.canonical_position(position);
        let twice = pager.canonical_position(once);
        assert_eq!(once.line_index, twice.line_index, "from ({index}, {delta})");
        assert_eq!(
            once.delta_screen_lines, twice.delta_screen_lines,
            "from ({index}, {delta})"
        );
    }
}

#[test]
fn scroll_to_end_puts_the_last_line_at_the_bottom() {
    let reader = Reader::from_text(Some("test"), &"x\n".repeat(100));
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    pager.scroll_to_end();
    assert!(pager.is_scrolled_to_end());
    // 100 lines, 9 visible: the top is 91 so line 99 sits on the bottom row
    assert_eq!(pager.line_index().unwrap().index(), 91);

    // Scrolling further down doesn't go past the end
    pager.scroll_position = pager.scroll_position.next_line(10);
    assert_eq!(pager.line_index().unwrap().index(), 91);
}

// --- Mode machine -----------------------------------------------------

#[test]
fn search_not_found_wraps_to_top() {
    // Three lines scrolled to the end, searching for "a" which is above us
    let reader = Reader::from_text(None, "a\nb\nc\n");
    let mut screen = FakeScreen::new(20, 3);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.scroll_to_end();

    pager.search.set("a");

    pager.on_rune('n');
    assert_eq!(pager.mode.name(), "NotFound");

    pager.on_rune('n');
    assert_eq!(pager.mode.name(), "Viewing");
    assert!(pager.line_index().unwrap().is_zero());
}

#[test]
fn slash_enters_search_mode_and_esc_leaves() {
    let reader = Reader::from_text(None, "a\nb\nc\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    pager.on_rune('/');
    assert_eq!(pager.mode.name(), "Search");

    pager.on_key(KeyCode::Escape);
    assert_eq!(pager.mode.name(), "Viewing");
}

#[test]
fn colon_with_one_reader_shows_info() {
    let reader = Reader::from_text(None, "a\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    pager.on_rune(':');
    assert_eq!(pager.mode.name(), "Info");

    // Any key falls back to viewing
    pager.on_rune('x');
    assert_eq!(pager.mode.name(), "Viewing");
}

#[test]
fn colon_with_multiple_readers_enters_switch_mode() {
    let first = Reader::from_text(Some("first"), "a\n");
    let second = Reader::from_text(Some("second"), "b\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![first, second]);

    pager.on_rune(':');
    assert_eq!(pager.mode.name(), "ColonCommand");

    pager.on_rune('n');
    assert_eq!(pager.mode.name(), "Viewing");
    assert_eq!(pager.active_reader().display_name(), Some("second"));
}

#[test]
fn help_round_trip_restores_position() {
    let reader = Reader::from_text(None, &"x\n".repeat(100));
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    pager.scroll_position = pager.scroll_position.next_line(50);
    let before = pager.line_index().unwrap();

    pager.on_rune('h');
    assert!(pager.is_showing_help);
    assert!(pager.line_index().unwrap().is_zero());

    pager.on_rune('q');
    assert!(!pager.is_showing_help);
    assert!(!pager.quit);
    assert_eq!(pager.line_index().unwrap(), before);

    pager.on_rune('q');
    assert!(pager.quit);
}

#[test]
fn wrap_toggle_shows_info_banner() {
    let reader = Reader::from_text(None, "a\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    assert!(!pager.wrap_long_lines);
    pager.on_rune('w');
    assert!(pager.wrap_long_lines);
    assert_eq!(pager.mode.name(), "Info");
}

#[test]
fn tab_size_cycles_between_8_and_4() {
    let reader = Reader::from_text(None, "a\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    assert_eq!(pager.ctx.tab_size, 8);
    pager.on_rune('\x14');
    assert_eq!(pager.ctx.tab_size, 4);
    pager.on_rune('\x14');
    assert_eq!(pager.ctx.tab_size, 8);
}

#[test]
fn side_scroll_hides_and_reveals_line_numbers() {
    let reader = Reader::from_text(None, &format!("{}\n", "x".repeat(100)));
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    let _ = pager.render_lines(); // track the longest line

    assert!(pager.show_line_numbers_pref);

    // First step right just hides the numbers
    pager.on_key(KeyCode::Right);
    assert!(!pager.show_line_numbers_pref);
    assert_eq!(pager.left_column, 0);

    // Next step actually scrolls
    pager.on_key(KeyCode::Right);
    assert_eq!(pager.left_column, 16);

    // Alt steps one column
    pager.on_key(KeyCode::AltRight);
    assert_eq!(pager.left_column, 17);

    // Left all the way back reveals the numbers again
    pager.on_key(KeyCode::Left);
    assert_eq!(pager.left_column, 1);
    pager.on_key(KeyCode::AltLeft);
    assert_eq!(pager.left_column, 0);
    pager.on_key(KeyCode::Left);
    assert!(pager.show_line_numbers_pref);
}

#[test]
fn down_scroll_at_the_end_arms_tail_following() {
    let reader = Reader::from_text(None, "a\nb\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    pager.on_key(KeyCode::Down);
    assert_eq!(pager.target_line, Some(LineIndex::MAX));

    pager.on_key(KeyCode::Up);
    assert_eq!(pager.target_line, None);
}

// --- Line numbers in the rendered output ------------------------------

#[test]
fn line_numbers_render_right_aligned() {
    let reader = Reader::from_text(None, "a\nb\nc\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);

    let rendered = pager.render_lines();
    assert_eq!(rendered.number_prefix_width, 4);
    assert_eq!(cells_to_string(&rendered.lines[0].cells), "  1 a");
    assert_eq!(cells_to_string(&rendered.lines[1].cells), "  2 b");
}

#[test]
fn wrapped_continuation_rows_have_blank_prefixes() {
    let reader = Reader::from_text(None, "one two three\n");
    let mut screen = FakeScreen::new(10, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.wrap_long_lines = true;

    let rendered = pager.render_lines();
    assert!(rendered.lines.len() > 1);
    assert_eq!(cells_to_string(&rendered.lines[0].cells), "  1 one");
    assert_eq!(rendered.lines[1].wrap_index, 1);
    assert_eq!(cells_to_string(&rendered.lines[1].cells), "    two");
}

#[test]
fn filtered_views_show_original_line_numbers() {
    let reader = Reader::from_text(None, "miss\nhit\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.filter.set("hit");

    let rendered = pager.render_lines();
    assert_eq!(rendered.lines.len(), 1);
    // "hit" is input line 2 even though it's the only line in the view
    assert_eq!(cells_to_string(&rendered.lines[0].cells), "  2 hit");
}

// --- Footer -----------------------------------------------------------

#[test]
fn viewing_footer_with_spinner() {
    let reader = Reader::from_text(None, "text");
    let mut screen = FakeScreen::new(80, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_status_bar = true;

    pager.draw_footer("1 line 100%", "<->");
    drop(pager);

    let footer = screen.row_to_string(9);
    // Quotes around keyboard shortcuts are stripped in rendering
    let expected_help = "Press ESC / q to exit, / to search, & to filter, h for help";
    assert_eq!(footer, format!("1 line 100%  <->  {expected_help}"));
}

#[test]
fn footer_mentions_search_navigation_while_searching() {
    let reader = Reader::from_text(None, "text");
    let mut screen = FakeScreen::new(80, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.search.set("tex");

    pager.draw_footer("status", "");
    drop(pager);

    let footer = screen.row_to_string(9);
    assert!(
        footer.contains("n/p to search next/previous"),
        "footer was: {footer}"
    );
}

// --- Follow tail ------------------------------------------------------

/// A `Read` fed through a channel, for drip-feeding input to a reader.
struct ChannelStream {
    receiver: Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl Read for ChannelStream {
    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        if self.pending.is_empty() {
            match self.receiver.recv() {
                Ok(bytes) => self.pending = bytes,
                Err(_) => return Ok(0), // Sender gone, EOF
            }
        }
        let count = self.pending.len().min(buffer.len());
        buffer[..count].copy_from_slice(&self.pending[..count]);
        self.pending.drain(..count);
        Ok(count)
    }
}

#[test]
fn follow_tail_keeps_the_bottom_at_the_latest_line() {
    let (sender, receiver) = unbounded();
    let reader = Reader::from_stream(
        Box::new(ChannelStream {
            receiver,
            pending: Vec::new(),
        }),
        None,
        ReaderOptions::default(),
    );

    let mut screen = FakeScreen::new(20, 3);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.show_line_numbers_pref = false;
    pager.show_line_numbers = false;
    pager.set_target_line(Some(LineIndex::MAX));

    for i in 1..=5 {
        sender.send(format!("line {i}\n").into_bytes()).unwrap();

        // Wait for the ingest thread to pick the line up
        let deadline = Instant::now() + Duration::from_secs(5);
        while pager.reader().line_count() < i && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(pager.reader().line_count(), i, "line {i} never arrived");

        // This is what the event loop does on MoreLinesAvailable
        pager.handle_more_lines_available();

        let rendered = pager.render_lines();
        let bottom = rendered.lines.last().unwrap();
        assert_eq!(cells_to_string(&bottom.cells), format!("line {i}"));
        assert_eq!(
            pager.target_line,
            Some(LineIndex::MAX),
            "the follow target must stay armed"
        );
    }
}

// --- Quit if one screen -----------------------------------------------

#[test]
fn fits_on_one_screen_checks_both_dimensions() {
    let ctx = moor_text::StyleContext::default();

    let small = Reader::from_text(None, "a\nb\n");
    assert!(fits_on_one_screen(&small, &ctx, 10, 5));

    let too_tall = Reader::from_text(None, "a\nb\nc\nd\ne\nf\n");
    assert!(!fits_on_one_screen(&too_tall, &ctx, 10, 5));

    let too_wide = Reader::from_text(None, "this line is much too wide\n");
    assert!(!fits_on_one_screen(&too_wide, &ctx, 10, 5));
}

#[test]
fn quit_if_one_screen_quits_and_keeps_content() {
    let reader = Reader::from_text(Some("test"), "short\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![reader]);
    pager.quit_if_one_screen = true;

    assert!(pager.should_quit_for_one_screen());
    assert!(pager.quit);
    assert!(!pager.clear_on_exit());
    assert!(!pager.show_line_numbers_pref);
}

#[test]
fn quit_if_one_screen_needs_a_single_reader() {
    let first = Reader::from_text(None, "a\n");
    let second = Reader::from_text(None, "b\n");
    let mut screen = FakeScreen::new(20, 10);
    let mut pager = Pager::new(&mut screen, vec![first, second]);
    pager.quit_if_one_screen = true;

    assert!(!pager.should_quit_for_one_screen());
    assert!(!pager.quit);
}
