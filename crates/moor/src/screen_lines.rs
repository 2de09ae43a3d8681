#![forbid(unsafe_code)]

//! From input lines to screen rows.
//!
//! Each visible input line gets tokenized, optionally painted with the
//! search-hit line background, prefixed with its line number, and then
//! either cropped to the horizontal window (with scroll hints at cut edges)
//! or wrapped onto several rows.

use moor_reader::{LineIndex, LineNumber, LineSource, NumberedLine};
use moor_style::Style;
use moor_text::{CellSliceExt, CellWithMetadata};

use crate::pager::Pager;

/// One rendered screen row.
#[derive(Debug, Clone)]
pub struct RenderedLine {
    pub input_line_index: Option<LineIndex>,
    /// Which wrap sub-row of the input line this is (0 when not wrapping).
    pub wrap_index: usize,
    pub cells: Vec<CellWithMetadata>,
    /// Style for the rest of the screen row after the last cell.
    pub trailer: Style,
}

/// Everything one redraw needs.
#[derive(Debug, Clone, Default)]
pub struct RenderedScreenLines {
    pub lines: Vec<RenderedLine>,
    pub status_text: String,
    /// The input lines the rows came from, for hit scanning.
    pub input_lines: Vec<NumberedLine>,
    pub number_prefix_width: usize,
}

impl Pager<'_> {
    /// Render the visible screen rows at the current scroll position.
    pub(crate) fn render_lines(&mut self) -> RenderedScreenLines {
        self.canonicalize_scroll_position();

        let visible_height = self.visible_height();
        let source = self.reader();
        let line_count = source.line_count();

        let Some(top) = self.scroll_position.line_index else {
            // No lines at all
            let empty = source.get_lines(LineIndex::from_zero_based(0), 1);
            return RenderedScreenLines {
                status_text: empty.status_text,
                ..RenderedScreenLines::default()
            };
        };
        let delta = self.scroll_position.delta_screen_lines.max(0) as usize;

        let fetched = source.get_lines(top, visible_height.max(1));
        let prefix_width = self.prefix_width_at(&source, top.index(), line_count);
        drop(source);

        for line in &fetched.lines {
            let width = line.display_width(&self.ctx);
            if width > self.longest_line_length {
                self.longest_line_length = width;
            }
        }

        let mut rows = Vec::with_capacity(visible_height);
        'lines: for line in &fetched.lines {
            for row in self.render_line(line, prefix_width) {
                rows.push(row);
                if rows.len() >= delta + visible_height {
                    break 'lines;
                }
            }
        }
        let rows: Vec<RenderedLine> = rows.into_iter().skip(delta).take(visible_height).collect();

        RenderedScreenLines {
            lines: rows,
            status_text: fetched.status_text,
            input_lines: fetched.lines,
            number_prefix_width: prefix_width,
        }
    }

    /// Render one input line into one (cropped) or several (wrapped) rows.
    pub(crate) fn render_line(
        &self,
        line: &NumberedLine,
        prefix_width: usize,
    ) -> Vec<RenderedLine> {
        let tokenized = line.highlighted_tokens(
            &self.styles.plain_text,
            &self.styles.search_hit,
            &self.search,
            &self.ctx,
        );
        let mut cells = tokenized.cells;
        let mut trailer = tokenized.trailer;

        if tokenized.contains_search_hit {
            if let Some(background) = self.styles.search_hit_line_background {
                for cell in &mut cells {
                    cell.style = cell.style.clone().with_background(background);
                }
                trailer = trailer.with_background(background);
            }
        }

        let (screen_width, _) = self.screen.size();
        let available = screen_width.saturating_sub(prefix_width).max(1);

        if self.wrap_long_lines {
            wrap_cells(&cells, available)
                .into_iter()
                .enumerate()
                .map(|(wrap_index, row)| {
                    let number = if wrap_index == 0 { Some(line.number) } else { None };
                    let mut with_prefix =
                        self.create_line_prefix(number, prefix_width);
                    with_prefix.extend(row);
                    RenderedLine {
                        input_line_index: Some(line.index),
                        wrap_index,
                        cells: with_prefix,
                        trailer: trailer.clone(),
                    }
                })
                .collect()
        } else {
            let cropped = crop_cells(
                &cells,
                self.left_column,
                available,
                &self.scroll_left_hint,
                &self.scroll_right_hint,
            );
            let mut with_prefix = self.create_line_prefix(Some(line.number), prefix_width);
            with_prefix.extend(cropped);
            vec![RenderedLine {
                input_line_index: Some(line.index),
                wrap_index: 0,
                cells: with_prefix,
                trailer,
            }]
        }
    }

    /// The line-number prefix cells: the number right-aligned plus one
    /// space, or all spaces on wrap continuation rows.
    pub(crate) fn create_line_prefix(
        &self,
        number: Option<LineNumber>,
        prefix_width: usize,
    ) -> Vec<CellWithMetadata> {
        if prefix_width == 0 {
            return Vec::new();
        }

        let style = &self.styles.line_numbers;
        let Some(number) = number else {
            return vec![CellWithMetadata::new(' ', style.clone()); prefix_width];
        };

        let digits = number.format();
        let digit_count = digits.chars().count();
        let pad = prefix_width.saturating_sub(digit_count + 1);

        let mut prefix = Vec::with_capacity(prefix_width.max(digit_count + 1));
        for _ in 0..pad {
            prefix.push(CellWithMetadata::new(' ', style.clone()));
        }
        for digit in digits.chars() {
            prefix.push(CellWithMetadata::new(digit, style.clone()));
        }
        prefix.push(CellWithMetadata::new(' ', style.clone()));
        prefix
    }
}

/// A base cell plus any zero-width (combining) cells attached to it.
struct CellGroup {
    start_column: usize,
    width: usize,
    from: usize,
    to: usize,
}

fn cell_groups(cells: &[CellWithMetadata]) -> Vec<CellGroup> {
    let mut groups: Vec<CellGroup> = Vec::with_capacity(cells.len());
    let mut column = 0;
    for (i, cell) in cells.iter().enumerate() {
        let width = cell.width();
        if width == 0 {
            // Combining mark: attaches to the previous cell, no new column
            if let Some(last) = groups.last_mut() {
                last.to = i + 1;
            }
            continue;
        }
        groups.push(CellGroup {
            start_column: column,
            width,
            from: i,
            to: i + 1,
        });
        column += width;
    }
    groups
}

/// Crop a cell row to the columns `[left_column, left_column + width)`.
///
/// A cut on the left (any `left_column > 0`) replaces the first visible
/// column with the scroll-left hint; content extending past the right edge
/// replaces the last visible column with the scroll-right hint. A
/// double-width rune straddling either boundary turns into a blank in that
/// rune's style.
pub(crate) fn crop_cells(
    cells: &[CellWithMetadata],
    left_column: usize,
    width: usize,
    left_hint: &CellWithMetadata,
    right_hint: &CellWithMetadata,
) -> Vec<CellWithMetadata> {
    let width = width.max(1);
    let groups = cell_groups(cells);
    let total_columns = groups.last().map_or(0, |g| g.start_column + g.width);

    if left_column == 0 && total_columns <= width {
        return cells.to_vec();
    }

    // Map column -> group, with wide groups occupying two entries
    #[derive(Clone, Copy)]
    enum Occupancy {
        Start(usize),
        Continuation(usize),
    }
    let mut columns: Vec<Occupancy> = Vec::with_capacity(total_columns);
    for (group_index, group) in groups.iter().enumerate() {
        columns.push(Occupancy::Start(group_index));
        if group.width == 2 {
            columns.push(Occupancy::Continuation(group_index));
        }
    }

    let last_visible = left_column + width - 1;
    let cut_left = left_column > 0;
    let cut_right = total_columns > left_column + width;

    let mut emitted = vec![false; groups.len()];
    let mut out: Vec<CellWithMetadata> = Vec::with_capacity(width);

    for column in left_column..=last_visible {
        if cut_left && column == left_column {
            out.push(left_hint.clone());
            continue;
        }
        if cut_right && column == last_visible {
            out.push(right_hint.clone());
            continue;
        }

        let Some(occupancy) = columns.get(column) else {
            // Past the end of the line
            break;
        };

        match *occupancy {
            Occupancy::Start(group_index) => {
                let group = &groups[group_index];
                if group.width == 2 {
                    let second = column + 1;
                    let second_visible =
                        second <= last_visible && !(cut_right && second == last_visible);
                    if second_visible {
                        out.extend(cells[group.from..group.to].iter().cloned());
                        emitted[group_index] = true;
                    } else {
                        // Straddles the right edge: single-column blank in
                        // the rune's style
                        out.push(CellWithMetadata {
                            rune: ' ',
                            style: cells[group.from].style.clone(),
                            is_search_hit: cells[group.from].is_search_hit,
                            starts_search_hit: false,
                        });
                    }
                } else {
                    out.extend(cells[group.from..group.to].iter().cloned());
                    emitted[group_index] = true;
                }
            }
            Occupancy::Continuation(group_index) => {
                if !emitted[group_index] {
                    // The wide rune's first half is covered by a hint
                    out.push(CellWithMetadata {
                        rune: ' ',
                        style: cells[groups[group_index].from].style.clone(),
                        is_search_hit: cells[groups[group_index].from].is_search_hit,
                        starts_search_hit: false,
                    });
                }
            }
        }
    }

    out
}

/// Break a cell row into screen rows of at most `width` columns, preferring
/// to break after whitespace. Wide runes never straddle a row boundary and
/// combining marks stay with their base. Search-hit metadata rides along on
/// the cells, so a hit split across rows keeps its styling on both halves.
pub(crate) fn wrap_cells(cells: &[CellWithMetadata], width: usize) -> Vec<Vec<CellWithMetadata>> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut rest = cells;

    loop {
        let rest_width: usize = rest.iter().map(CellWithMetadata::width).sum();
        if rest_width <= width {
            rows.push(rest.to_vec());
            return rows;
        }

        // The longest prefix that fits
        let mut cut = 0;
        let mut used = 0;
        for (i, cell) in rest.iter().enumerate() {
            let cell_width = cell.width();
            if used + cell_width > width {
                break;
            }
            used += cell_width;
            cut = i + 1;
        }
        if cut == 0 {
            // A wide rune on a one-column screen still has to go somewhere
            cut = 1;
        }

        // Prefer breaking after whitespace instead of mid-word
        let mut split = cut;
        let breaking_mid_word = rest
            .get(cut)
            .is_some_and(|cell| !cell.rune.is_whitespace());
        if breaking_mid_word {
            if let Some(space) = rest[..cut]
                .iter()
                .rposition(|cell| cell.rune.is_whitespace())
            {
                if space > 0 {
                    split = space + 1;
                }
            }
        }

        rows.push(rest[..split].to_vec());
        rest = rest[split..].without_space_left();
        if rest.is_empty() {
            return rows;
        }
    }
}
