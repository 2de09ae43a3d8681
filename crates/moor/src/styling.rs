#![forbid(unsafe_code)]

//! Deriving the UI styles, once, at startup.
//!
//! Inputs: the detected terminal background (when available), a syntect
//! theme, the status-bar style option, `$LESS_TERMCAP_md/us/so`, and whether
//! the user wants the terminal's own foreground color. Output: one style per
//! UI element, plus the man-page styles threaded into the tokenizer context.

use moor_style::{AttrMask, Color, Style};
use moor_text::{styled_runes_from_string, StyleContext};
use syntect::highlighting::Theme;
use tracing::{debug, info, trace};

use crate::pager::StatusBarOption;

/// One style per piece of chrome.
#[derive(Debug, Clone)]
pub struct UiStyles {
    pub plain_text: Style,
    pub line_numbers: Style,
    pub statusbar: Style,
    pub statusbar_file: Style,
    pub search_hit: Style,
    /// Background for whole lines containing search hits, when both the
    /// plain and hit backgrounds are real colors.
    pub search_hit_line_background: Option<Color>,
}

impl Default for UiStyles {
    fn default() -> Self {
        Self {
            plain_text: Style::DEFAULT,
            line_numbers: Style::DEFAULT.with_attr(AttrMask::DIM),
            statusbar: Style::DEFAULT.with_attr(AttrMask::REVERSE),
            statusbar_file: Style::DEFAULT
                .with_attr(AttrMask::REVERSE)
                .with_attr(AttrMask::UNDERLINE),
            search_hit: Style::DEFAULT.with_attr(AttrMask::REVERSE),
            search_hit_line_background: None,
        }
    }
}

/// Parse a `$LESS_TERMCAP_*` value into a style by running it through the
/// tokenizer with a probe character appended.
pub fn termcap_to_style(termcap: &str) -> Result<Style, String> {
    let probed = format!("{termcap}x");
    let cells = styled_runes_from_string(&Style::DEFAULT, &probed, None, &StyleContext::default());
    if cells.cells.len() != 1 {
        return Err("Expected styling only and no text".to_string());
    }
    Ok(cells.cells[0].style.clone())
}

fn env_style(name: &str) -> Option<Style> {
    let value = std::env::var(name).ok()?;
    if value.is_empty() {
        return None;
    }
    match termcap_to_style(&value) {
        Ok(style) => {
            trace!("Style set from {name}");
            Some(style)
        }
        Err(problem) => {
            info!(
                "Ignoring invalid {name}: {}: {problem}",
                value.replace('\x1b', "ESC")
            );
            None
        }
    }
}

fn color_from_theme(color: Option<syntect::highlighting::Color>) -> Color {
    match color {
        Some(color) if color.a > 0 => Color::rgb(color.r, color.g, color.b),
        _ => Color::Default,
    }
}

/// Pretend the background is as far from this color as possible. Used when
/// we know a foreground but need a background to mix with.
fn opposite_color(base: Color) -> Color {
    let white = Color::rgb(255, 255, 255);
    let black = Color::rgb(0, 0, 0);
    if base.distance(white) > base.distance(black) {
        white
    } else {
        black
    }
}

/// Derive all UI styles. Also updates the tokenizer context's man-page
/// styles, since those belong to the same look.
#[must_use]
pub fn style_ui(
    terminal_background: Option<Color>,
    theme: Option<&Theme>,
    statusbar_option: StatusBarOption,
    with_terminal_fg: bool,
    configure_search_hit_line_background: bool,
    ctx: &mut StyleContext,
) -> UiStyles {
    let mut styles = UiStyles::default();

    let mut plain = Style::DEFAULT;
    if let Some(theme) = theme {
        if !with_terminal_fg {
            plain = plain.with_foreground(color_from_theme(theme.settings.foreground));
        }
        plain = plain.with_background(color_from_theme(theme.settings.background));
    }
    styles.plain_text = plain.clone();

    // Man page styles: theme-flavored defaults, LESS_TERMCAP overrides
    ctx.man_page_bold = env_style("LESS_TERMCAP_md")
        .unwrap_or_else(|| plain.clone().with_attr(AttrMask::BOLD));
    ctx.man_page_underline = env_style("LESS_TERMCAP_us")
        .unwrap_or_else(|| plain.clone().with_attr(AttrMask::UNDERLINE));
    ctx.man_page_heading = plain.clone().with_attr(AttrMask::BOLD);

    let standout = env_style("LESS_TERMCAP_so");

    styles.statusbar = match (&standout, statusbar_option) {
        (Some(standout), _) => standout.clone(),
        (None, StatusBarOption::Inverse) => plain.clone().with_attr(AttrMask::REVERSE),
        (None, StatusBarOption::Plain) => plain.clone(),
        (None, StatusBarOption::Bold) => Style::DEFAULT.with_attr(AttrMask::BOLD),
    };
    styles.statusbar_file = styles.statusbar.clone().with_attr(AttrMask::UNDERLINE);

    if let Some(standout) = standout {
        styles.search_hit = standout;
    }

    styles.search_hit_line_background = if configure_search_hit_line_background {
        search_hit_line_background(terminal_background, &styles.plain_text, &styles.search_hit)
    } else {
        trace!("Not configuring the search hit line background");
        None
    };

    styles
}

/// A 20% mix between the plain background and the hit background, when both
/// can be figured out. 0.2 is visible without being loud.
fn search_hit_line_background(
    terminal_background: Option<Color>,
    plain_text: &Style,
    search_hit: &Style,
) -> Option<Color> {
    let plain_bg = if let Some(background) = terminal_background {
        background
    } else if plain_text.has_attr(AttrMask::REVERSE) {
        plain_text.foreground()
    } else {
        plain_text.background()
    };

    let mut hit_bg = search_hit.background();
    let mut hit_fg = search_hit.foreground();
    if search_hit.has_attr(AttrMask::REVERSE) {
        std::mem::swap(&mut hit_bg, &mut hit_fg);
    }
    if !hit_bg.is_real() && hit_fg.is_real() {
        // We don't know the hit background, but knowing the foreground we
        // can cheat and pretend the background is as far away as possible
        hit_bg = opposite_color(hit_fg);
    }
    if !hit_bg.is_real() {
        if let Some(background) = terminal_background {
            hit_bg = opposite_color(background);
        }
    }

    if plain_bg.is_real() && hit_bg.is_real() {
        let mixed = plain_bg.mix(hit_bg, 0.2);
        trace!("Search hit line background set to {mixed}");
        Some(mixed)
    } else {
        debug!("Cannot set a search hit line background from {plain_bg} and {hit_bg}");
        None
    }
}

/// Pick a theme name for the detected terminal background: a dark theme
/// unless the background is clearly light.
#[must_use]
pub fn theme_name_for_background(terminal_background: Option<Color>) -> &'static str {
    const DARK_THEME: &str = "base16-ocean.dark";
    const LIGHT_THEME: &str = "InspiredGitHub";

    let Some(background) = terminal_background else {
        // Fall back to the dark theme if we can't detect the background
        return DARK_THEME;
    };

    let to_black = background.distance(Color::rgb(0, 0, 0));
    let to_white = background.distance(Color::rgb(255, 255, 255));
    if to_black < to_white {
        DARK_THEME
    } else {
        LIGHT_THEME
    }
}
