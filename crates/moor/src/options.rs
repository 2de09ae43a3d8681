#![forbid(unsafe_code)]

//! Command line options, including the `$MOOR`/`$MOAR` environment variable
//! merge and the less-style `+linenumber` argument.

use clap::Parser;
use moor_reader::LineIndex;
use moor_screen::MouseMode;
use moor_style::ColorCount;
use moor_text::UnprintableStyle;
use tracing::debug;

use crate::pager::StatusBarOption;

/// A pager that reads while you scroll.
#[derive(Debug, Parser)]
#[command(
    name = "moor",
    version,
    about = "Pages files and streams with search, filtering and highlighting",
    after_help = "Use +1234 anywhere on the command line to start at line 1234.\n\
                  Defaults can be put in the MOOR environment variable."
)]
pub struct Options {
    /// Files to page. With no files, stdin is paged.
    pub filenames: Vec<String>,

    /// Wrap long lines
    #[arg(long)]
    pub wrap: bool,

    /// Follow piped input just like "tail -f"
    #[arg(long)]
    pub follow: bool,

    /// Highlighting style name
    #[arg(long)]
    pub style: Option<String>,

    /// File contents language for highlighting, a file extension ("html").
    /// Default is to guess by file name.
    #[arg(long)]
    pub lang: Option<String>,

    /// Use the terminal foreground color rather than the style foreground
    /// for plain text
    #[arg(long = "terminal-fg")]
    pub terminal_fg: bool,

    /// Do not highlight the background of lines with search hits
    #[arg(long = "no-search-line-highlight")]
    pub no_search_line_highlight: bool,

    /// Highlighting palette size: 8, 16, 256, 16M or auto
    #[arg(long, default_value = "auto", value_parser = parse_colors)]
    pub colors: ColorCount,

    /// Hide line numbers on startup, press left arrow key to show
    #[arg(long = "no-linenumbers")]
    pub no_linenumbers: bool,

    /// Hide the status bar, toggle with '='
    #[arg(long = "no-statusbar")]
    pub no_statusbar: bool,

    /// Reformat some input files (JSON)
    #[arg(long)]
    pub reformat: bool,

    /// Don't page if the contents fit on one screen
    #[arg(long = "quit-if-one-screen")]
    pub quit_if_one_screen: bool,

    /// Don't clear the screen on exit
    #[arg(long = "no-clear-on-exit")]
    pub no_clear_on_exit: bool,

    /// With --no-clear-on-exit, leave this many lines for the shell prompt
    #[arg(long = "no-clear-on-exit-margin", default_value_t = 0)]
    pub no_clear_on_exit_margin: usize,

    /// Status bar style: inverse, plain or bold
    #[arg(long, default_value = "inverse", value_parser = parse_statusbar)]
    pub statusbar: StatusBarOption,

    /// How unprintable characters render: highlight or whitespace
    #[arg(long = "render-unprintable", default_value = "highlight", value_parser = parse_unprintable)]
    pub render_unprintable: UnprintableStyle,

    /// One character (optionally styled with ANSI colors, "ESC" allowed)
    /// hinting there is content off-screen to the left
    #[arg(long = "scroll-left-hint", default_value = "ESC[7m<")]
    pub scroll_left_hint: String,

    /// Same as --scroll-left-hint, but for the right edge
    #[arg(long = "scroll-right-hint", default_value = "ESC[7m>")]
    pub scroll_right_hint: String,

    /// Horizontal scroll amount, in columns
    #[arg(long, default_value_t = 16, value_parser = at_least_one)]
    pub shift: usize,

    /// Tab stop distance
    #[arg(long = "tab-size", default_value_t = 8, value_parser = at_least_one)]
    pub tab_size: usize,

    /// Mouse mode: auto, select (leave the mouse for selection) or scroll
    #[arg(long = "mousemode", default_value = "auto", value_parser = parse_mouse_mode)]
    pub mouse_mode: MouseMode,

    /// Print debug logs after exiting
    #[arg(long)]
    pub debug: bool,

    /// Print trace logs after exiting
    #[arg(long)]
    pub trace: bool,
}

fn parse_colors(value: &str) -> Result<ColorCount, String> {
    let mut value = value.to_string();
    if value.eq_ignore_ascii_case("auto") {
        // xterm-256color as used by the macOS Terminal gets 256 colors;
        // anything claiming truecolor gets the real thing
        value = "16M".to_string();
        let colorterm = std::env::var("COLORTERM").unwrap_or_default();
        let term = std::env::var("TERM").unwrap_or_default();
        if colorterm != "truecolor" && term.contains("256") {
            value = "256".to_string();
        }
    }

    match value.to_uppercase().as_str() {
        "8" => Ok(ColorCount::Ansi8),
        "16" => Ok(ColorCount::Ansi16),
        "256" => Ok(ColorCount::Ansi256),
        "16M" => Ok(ColorCount::TrueColor),
        _ => Err("Valid counts are 8, 16, 256, 16M or auto".to_string()),
    }
}

fn parse_statusbar(value: &str) -> Result<StatusBarOption, String> {
    match value {
        "inverse" => Ok(StatusBarOption::Inverse),
        "plain" => Ok(StatusBarOption::Plain),
        "bold" => Ok(StatusBarOption::Bold),
        _ => Err("Good ones are inverse, plain and bold".to_string()),
    }
}

fn parse_unprintable(value: &str) -> Result<UnprintableStyle, String> {
    match value {
        "highlight" => Ok(UnprintableStyle::Highlight),
        "whitespace" => Ok(UnprintableStyle::Whitespace),
        _ => Err("Good ones are highlight and whitespace".to_string()),
    }
}

fn parse_mouse_mode(value: &str) -> Result<MouseMode, String> {
    match value {
        "auto" => Ok(MouseMode::Auto),
        "select" | "mark" => Ok(MouseMode::Select),
        "scroll" => Ok(MouseMode::Scroll),
        _ => Err("Valid modes are auto, select and scroll".to_string()),
    }
}

fn at_least_one(value: &str) -> Result<usize, String> {
    let number: usize = value.parse().map_err(|_| "Not a number".to_string())?;
    if number < 1 {
        return Err("Must be at least 1".to_string());
    }
    Ok(number)
}

/// Which environment variable carries default options. MOOR is preferred;
/// MOAR is its legacy spelling.
#[must_use]
pub fn moor_env_var_name() -> &'static str {
    if !std::env::var("MOOR").unwrap_or_default().trim().is_empty() {
        return "MOOR";
    }
    if !std::env::var("MOAR").unwrap_or_default().trim().is_empty() {
        // Legacy, kept for backwards compatibility
        return "MOAR";
    }
    "MOOR"
}

/// Merge `$MOOR` (or `$MOAR`) in front of the real arguments, program name
/// excluded.
#[must_use]
pub fn args_with_env(real_args: &[String]) -> Vec<String> {
    let env_value = std::env::var(moor_env_var_name()).unwrap_or_default();
    let mut merged: Vec<String> = env_value.split_whitespace().map(String::from).collect();
    merged.extend(real_args.iter().cloned());
    merged
}

/// Extract a less-style `+linenumber` from anywhere on the command line.
/// Returns the one-based target (if any) and the remaining arguments.
/// `+0` is ignored, because that's what less does.
#[must_use]
pub fn extract_target_line(args: Vec<String>) -> (Option<LineIndex>, Vec<String>) {
    for (position, arg) in args.iter().enumerate() {
        let Some(digits) = arg.strip_prefix('+') else {
            continue;
        };
        let Ok(line_number) = digits.parse::<u32>() else {
            // Let's pretend this is a file name
            continue;
        };

        let mut remaining = args.clone();
        remaining.remove(position);

        if line_number == 0 {
            debug!("Ignoring +0, like less does");
            return (None, remaining);
        }
        return (
            Some(LineIndex::from_one_based(line_number as usize)),
            remaining,
        );
    }

    (None, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn target_line_extraction() {
        let (target, rest) = extract_target_line(strings(&["file.txt", "+123"]));
        assert_eq!(target, Some(LineIndex::from_one_based(123)));
        assert_eq!(rest, strings(&["file.txt"]));
    }

    #[test]
    fn plus_zero_is_ignored() {
        let (target, rest) = extract_target_line(strings(&["+0", "file.txt"]));
        assert_eq!(target, None);
        assert_eq!(rest, strings(&["file.txt"]));
    }

    #[test]
    fn plus_non_number_is_a_file_name() {
        let (target, rest) = extract_target_line(strings(&["+notanumber"]));
        assert_eq!(target, None);
        assert_eq!(rest, strings(&["+notanumber"]));
    }

    #[test]
    fn no_target_line() {
        let (target, rest) = extract_target_line(strings(&["a", "b"]));
        assert_eq!(target, None);
        assert_eq!(rest, strings(&["a", "b"]));
    }

    #[test]
    fn options_parse() {
        let options =
            Options::try_parse_from(["moor", "--wrap", "--shift", "8", "file.txt"]).unwrap();
        assert!(options.wrap);
        assert_eq!(options.shift, 8);
        assert_eq!(options.filenames, ["file.txt"]);
    }

    #[test]
    fn bad_shift_is_rejected() {
        assert!(Options::try_parse_from(["moor", "--shift", "0"]).is_err());
    }

    #[test]
    fn statusbar_parsing() {
        let options = Options::try_parse_from(["moor", "--statusbar", "bold"]).unwrap();
        assert_eq!(options.statusbar, StatusBarOption::Bold);
        assert!(Options::try_parse_from(["moor", "--statusbar", "fancy"]).is_err());
    }
}
