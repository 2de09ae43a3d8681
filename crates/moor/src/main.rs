#![forbid(unsafe_code)]

//! Command line launcher for moor.

use std::io::{IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Parser;
use moor::options::{args_with_env, extract_target_line, Options};
use moor::pager::Pager;
use moor::styling::{style_ui, theme_name_for_background};
use moor_reader::{Reader, ReaderOptions};
use moor_reader::highlight::HighlightSettings;
use moor_screen::{Screen, TerminalScreen};
use moor_search::SearchHistory;
use moor_style::Style;
use moor_text::{styled_runes_from_string, CellWithMetadata, StyleContext};
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use tracing::{info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Logs accumulate here and go to stderr after the terminal is restored, so
/// they never land on the alternate screen.
#[derive(Clone, Default)]
struct LogBuffer {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    fn dump_to_stderr(&self) {
        let buffer = self
            .buffer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if buffer.is_empty() {
            return;
        }
        let _ = std::io::stderr().write_all(&buffer);
    }
}

impl Write for LogBuffer {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// For git output and man pages, disable line numbers by default: both
/// format for the full terminal width, and line numbers would push the
/// rightmost part of the page out of view.
fn no_line_numbers_default() -> bool {
    if !std::env::var("MAN_PN").unwrap_or_default().is_empty() {
        info!("MAN_PN is set, skipping line numbers for man page");
        return true;
    }
    if !std::env::var("GIT_EXEC_PATH").unwrap_or_default().is_empty() {
        info!("GIT_EXEC_PATH is set, skipping line numbers for git output");
        return true;
    }
    false
}

/// Parse a scroll hint option: one (optionally ANSI-styled) character, with
/// "ESC" as a readable stand-in for the escape byte.
fn parse_scroll_hint(hint: &str) -> Result<CellWithMetadata> {
    let hint = hint.replace("ESC", "\x1b");
    let cells = styled_runes_from_string(&Style::DEFAULT, &hint, None, &StyleContext::default());
    if cells.cells.len() != 1 {
        bail!("Expected exactly one (optionally highlighted) character, for example 'ESC[2m<'");
    }
    Ok(cells.cells[0].clone())
}

/// When stdout is not a terminal, just pump the input through.
fn pump_to_stdout(filenames: &[String]) -> Result<()> {
    let mut stdout = std::io::stdout();

    if filenames.is_empty() {
        std::io::copy(&mut std::io::stdin().lock(), &mut stdout)
            .context("Failed to copy stdin to stdout")?;
        return Ok(());
    }

    let mut stdin_done = false;
    for filename in filenames {
        if filename == "-" && !std::io::stdin().is_terminal() {
            if stdin_done {
                // Already drained, don't do it again
                continue;
            }
            std::io::copy(&mut std::io::stdin().lock(), &mut stdout)
                .context("Failed to copy stdin to stdout")?;
            stdin_done = true;
            continue;
        }

        let mut file = std::fs::File::open(filename)
            .with_context(|| format!("Failed to open {filename}"))?;
        std::io::copy(&mut file, &mut stdout)
            .with_context(|| format!("Failed to copy {filename} to stdout"))?;
    }
    Ok(())
}

/// The terminal couldn't be set up; dump all readers' contents instead.
fn dump_readers(readers: &[Reader]) {
    use moor_reader::{LineIndex, LineSource};

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    for reader in readers {
        if let Err(error) = reader.wait() {
            warn!("{error}");
        }
        let lines = reader.get_lines(LineIndex::from_zero_based(0), reader.line_count());
        for line in lines.lines {
            let _ = writeln!(stdout, "{}", line.line.raw());
        }
    }
}

/// Restore the terminal before any panic output, so the message survives
/// leaving the alternate screen.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        moor_screen::terminal::emergency_restore();
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    let logs = LogBuffer::default();

    let real_args: Vec<String> = std::env::args().skip(1).collect();
    let merged = args_with_env(&real_args);
    let (target_line, remaining) = extract_target_line(merged);

    let options = match Options::try_parse_from(
        std::iter::once("moor".to_string()).chain(remaining),
    ) {
        Ok(options) => options,
        Err(error) => {
            // clap renders --help and --version as "errors" with exit 0
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let log_level = if options.trace {
        "trace"
    } else if options.debug {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(logs.clone())
        .init();

    let outcome = run(&options, target_line);
    logs.dump_to_stderr();

    match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("ERROR: {error:#}");
            ExitCode::from(1)
        }
    }
}

fn run(options: &Options, target_line: Option<moor_reader::LineIndex>) -> Result<ExitCode> {
    let stdin_is_terminal = std::io::stdin().is_terminal();
    let stdout_is_terminal = std::io::stdout().is_terminal();

    if options.filenames.is_empty() && stdin_is_terminal {
        bail!("Nothing to page: pipe something into moor or give it a file name");
    }

    if !stdout_is_terminal {
        // Not a terminal on the other end, be a very expensive cat
        pump_to_stdout(&options.filenames)?;
        return Ok(ExitCode::SUCCESS);
    }

    // Syntax highlighting setup
    let syntax_set = Arc::new(SyntaxSet::load_defaults_newlines());
    let theme_set = ThemeSet::load_defaults();
    let theme_name = match &options.style {
        Some(name) => name.as_str(),
        None => theme_name_for_background(None),
    };
    let Some(theme) = theme_set.themes.get(theme_name) else {
        bail!("Unknown style {theme_name:?}, pick one of: {:?}", {
            let mut names: Vec<&String> = theme_set.themes.keys().collect();
            names.sort();
            names
        });
    };
    let theme = Arc::new(theme.clone());

    let reader_options = ReaderOptions {
        highlight: Some(HighlightSettings {
            syntax_set: Arc::clone(&syntax_set),
            theme: Arc::clone(&theme),
            language: options.lang.clone(),
        }),
        reformat_json: options.reformat,
        ..ReaderOptions::default()
    };

    // Open all inputs before touching the terminal; a bad first argument
    // should fail fast with a plain error message.
    let mut readers = Vec::new();
    if options.filenames.is_empty() {
        let label = std::env::var("PAGER_LABEL").ok().filter(|label| !label.is_empty());
        readers.push(Reader::from_stream(
            Box::new(std::io::stdin()),
            label,
            reader_options.clone(),
        ));
    } else {
        for filename in &options.filenames {
            if filename == "-" && !stdin_is_terminal {
                readers.push(Reader::from_stream(
                    Box::new(std::io::stdin()),
                    None,
                    reader_options.clone(),
                ));
                continue;
            }
            let reader = Reader::from_file(Path::new(filename), reader_options.clone())
                .with_context(|| format!("Failed to open {filename}"))?;
            readers.push(reader);
        }
    }

    // From here on the terminal is ours
    install_panic_hook();
    let mut screen = match TerminalScreen::open(options.mouse_mode, options.colors) {
        Ok(screen) => screen,
        Err(error) => {
            // No terminal to page on: print the contents and call it a day
            warn!("Terminal setup failed, dumping contents: {error}");
            dump_readers(&readers);
            return Ok(ExitCode::SUCCESS);
        }
    };

    let terminal_background = screen.terminal_background();
    let mut pager = Pager::new(&mut screen, readers);

    pager.ctx.tab_size = options.tab_size;
    pager.ctx.unprintable = options.render_unprintable;
    pager.styles = style_ui(
        terminal_background,
        Some(&theme),
        options.statusbar,
        options.terminal_fg,
        !options.no_search_line_highlight,
        &mut pager.ctx,
    );

    pager.wrap_long_lines = options.wrap;
    pager.show_line_numbers_pref = !(options.no_linenumbers || no_line_numbers_default());
    pager.show_line_numbers = pager.show_line_numbers_pref;
    pager.statusbar_option = options.statusbar;
    pager.show_status_bar = !options.no_statusbar;
    pager.quit_if_one_screen = options.quit_if_one_screen;
    pager.side_scroll_amount = options.shift;
    pager.de_init = !options.no_clear_on_exit;
    pager.de_init_false_margin = options.no_clear_on_exit_margin;
    pager.scroll_left_hint = parse_scroll_hint(&options.scroll_left_hint)?;
    pager.scroll_right_hint = parse_scroll_hint(&options.scroll_right_hint)?;
    pager.search_history = SearchHistory::load();

    if options.follow && target_line.is_none() {
        pager.set_initial_target_line(Some(moor_reader::LineIndex::MAX));
    } else {
        pager.set_initial_target_line(target_line);
    }

    pager.start_paging();

    if let Some(error) = pager.active_reader().error() {
        warn!("Reader reported an error: {error}");
    }

    let keep_content = !pager.clear_on_exit();
    let mut after_exit = pager.after_exit.take();

    pager.close_screen();
    if keep_content {
        pager.reprint_after_exit();
    }
    drop(pager);
    drop(screen);

    if let Some(command) = &mut after_exit {
        let status = command.status().context("Failed to launch the editor")?;
        if !status.success() {
            warn!("Editor exited with {status}");
        }
    }

    Ok(ExitCode::SUCCESS)
}
