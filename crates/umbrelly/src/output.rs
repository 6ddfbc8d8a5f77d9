//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::{OwoColorize, Style as Paint};
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Tone of a status word in table views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Warn,
    Bad,
    Muted,
}

/// Paint `text` in `tone` when color is enabled.
pub fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    let style = match tone {
        Tone::Good => Paint::new().green(),
        Tone::Warn => Paint::new().yellow(),
        Tone::Bad => Paint::new().red().bold(),
        Tone::Muted => Paint::new().dimmed(),
    };
    text.style(style).to_string()
}

/// Format an optional value with a suffix, `-` when absent.
pub fn or_dash(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.1}{suffix}"))
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list in the chosen format.
///
/// Tables are built from `to_row`; plain output is one `id_fn` per line.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => render_table(&data.iter().map(to_row).collect::<Vec<R>>()),
        OutputFormat::Plain => data.iter().map(id_fn).collect::<Vec<_>>().join("\n"),
        structured => render_structured(structured, data),
    }
}

/// Render one item; `detail_fn` supplies the table view.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Plain => id_fn(data),
        structured => render_structured(structured, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status line on stderr, suppressed by `--quiet`.
pub fn notice(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Compact single-line JSON.
pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).expect("serialization should not fail")
}

fn render_structured<T: serde::Serialize + ?Sized>(format: &OutputFormat, data: &T) -> String {
    match format {
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => serde_yaml::to_string(data).expect("serialization should not fail"),
        _ => serde_json::to_string_pretty(data).expect("serialization should not fail"),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize, Tabled)]
    struct Row {
        id: String,
        state: String,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: "bitcoin".into(),
                state: "running".into(),
            },
            Row {
                id: "plex".into(),
                state: "stopped".into(),
            },
        ]
    }

    fn as_row(r: &Row) -> Row {
        Row {
            id: r.id.clone(),
            state: r.state.clone(),
        }
    }

    #[test]
    fn plain_emits_one_id_per_line() {
        let out = render_list(&OutputFormat::Plain, &rows(), as_row, |r| r.id.clone());
        assert_eq!(out, "bitcoin\nplex");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(&OutputFormat::JsonCompact, &rows(), as_row, |r| r.id.clone());
        assert_eq!(
            out,
            r#"[{"id":"bitcoin","state":"running"},{"id":"plex","state":"stopped"}]"#
        );
    }

    #[test]
    fn table_has_headers_and_rows() {
        let out = render_list(&OutputFormat::Table, &rows(), as_row, |r| r.id.clone());
        assert!(out.contains("id"));
        assert!(out.contains("plex"));
    }

    #[test]
    fn paint_is_identity_without_color() {
        assert_eq!(paint("on", Tone::Good, false), "on");
        assert_ne!(paint("on", Tone::Good, true), "on");
        assert_eq!(or_dash(None, "%"), "-");
        assert_eq!(or_dash(Some(41.26), "%"), "41.3%");
    }
}
