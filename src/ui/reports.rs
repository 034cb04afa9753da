use anyhow::{Context, Result};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use url::Url;

use crate::models::Symbol;
use crate::ui::{components, View};

/// Where reports go when they leave the dashboard
pub trait ReportOpener: Send {
    /// Open the backend-rendered report in an external viewer
    fn open_url(&mut self, url: &Url) -> Result<()>;

    /// Open report markup returned in place of a PDF
    fn open_markup(&mut self, symbol: &Symbol, markup: &str) -> Result<()>;

    /// Save a PDF report, returning where it landed
    fn save_pdf(&mut self, symbol: &Symbol, bytes: &[u8]) -> Result<PathBuf>;
}

/// Markup files kept alive for viewers that are still reading them
const KEEP_OPENED: usize = 5;

pub fn pdf_file_name(symbol: &Symbol) -> String {
    format!("{}_investment_report.pdf", file_stem(symbol))
}

/// Symbol text that is safe as a single path component
fn file_stem(symbol: &Symbol) -> String {
    let stem: String = symbol
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=') {
                c
            } else {
                '_'
            }
        })
        .collect();
    stem.replace("..", "_")
}

/// Opens reports with the desktop's default handler and saves PDFs to a directory
pub struct SystemOpener {
    download_dir: PathBuf,
    // markup files stay on disk while a viewer may still be reading them
    opened: Vec<NamedTempFile>,
}

impl SystemOpener {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            opened: Vec::new(),
        }
    }

    fn keep_opened(&mut self, file: NamedTempFile) {
        self.opened.push(file);
        if self.opened.len() > KEEP_OPENED {
            let stale = self.opened.len() - KEEP_OPENED;
            // dropping a NamedTempFile deletes it
            self.opened.drain(..stale);
        }
    }

    fn launch(target: &str) -> Result<()> {
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        } else {
            Command::new("xdg-open")
        };

        command
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch a viewer for {}", target))?;
        Ok(())
    }
}

impl ReportOpener for SystemOpener {
    fn open_url(&mut self, url: &Url) -> Result<()> {
        info!("Opening report {}", url);
        Self::launch(url.as_str())
    }

    fn open_markup(&mut self, symbol: &Symbol, markup: &str) -> Result<()> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}_report_", file_stem(symbol)))
            .suffix(".html")
            .tempfile()
            .context("Failed to create a temporary report file")?;
        file.write_all(markup.as_bytes())?;
        file.flush()?;

        let path = file.path().to_string_lossy().into_owned();
        debug!("Opening report markup from {}", path);
        Self::launch(&path)?;
        self.keep_opened(file);
        Ok(())
    }

    fn save_pdf(&mut self, symbol: &Symbol, bytes: &[u8]) -> Result<PathBuf> {
        save_pdf_in(&self.download_dir, symbol, bytes)
    }
}

/// Stage the PDF next to its destination, then move it into place
pub fn save_pdf_in(dir: &Path, symbol: &Symbol, bytes: &[u8]) -> Result<PathBuf> {
    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to stage report in {}", dir.display()))?;
    staged.write_all(bytes)?;
    staged.flush()?;

    let target = dir.join(pdf_file_name(symbol));
    staged
        .persist(&target)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to save report to {}", target.display()))?;

    info!("Saved report to {}", target.display());
    Ok(target)
}

/// Readable text for report markup.
///
/// Only strips tags for display in the terminal; this is not a sanitizer.
pub fn markup_to_lines(markup: &str) -> Vec<String> {
    let mut text = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let after = &rest[start..];
        let Some(end) = after.find('>') else {
            rest = "";
            break;
        };

        let tag = after[1..end].trim().to_ascii_lowercase();
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        rest = &after[end + 1..];

        if !tag.starts_with('/') && (name == "script" || name == "style") {
            // skip everything up to the closing tag
            let closing = format!("</{}", name);
            match rest.to_ascii_lowercase().find(&closing) {
                Some(pos) => {
                    rest = &rest[pos..];
                    if let Some(close_end) = rest.find('>') {
                        rest = &rest[close_end + 1..];
                    }
                }
                None => rest = "",
            }
            continue;
        }

        if matches!(
            name.as_str(),
            "br" | "p" | "div" | "li" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "section" | "table"
        ) {
            text.push('\n');
        } else if matches!(name.as_str(), "td" | "th") {
            text.push(' ');
        }
    }
    text.push_str(rest);

    let mut lines = Vec::new();
    for raw in decode_entities(&text).lines() {
        let line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().map_or(true, |l: &String| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Reports tab: renders a report inline from a typed symbol
#[derive(Debug, Default)]
pub struct ReportPanel {
    pub symbol_input: String,
    pub editing: bool,
    pub loading: bool,
    pub symbol: Option<Symbol>,
    /// Report body exactly as the backend returned it
    pub markup: Option<String>,
    pub lines: Vec<String>,
    pub scroll: u16,
    pub error: Option<String>,
}

impl ReportPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_report(&mut self, symbol: Symbol, markup: String) {
        self.lines = markup_to_lines(&markup);
        self.markup = Some(markup);
        self.symbol = Some(symbol);
        self.scroll = 0;
        self.error = None;
    }

    pub fn scroll_down(&mut self) {
        if (self.scroll as usize) + 1 < self.lines.len() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

impl View for ReportPanel {
    fn render(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let (input, style) = if self.editing {
            (format!("{}_", self.symbol_input), Style::default().fg(Color::Yellow))
        } else if self.symbol_input.is_empty() {
            ("Press / to enter a symbol".to_string(), Style::default().fg(Color::DarkGray))
        } else {
            (self.symbol_input.clone(), Style::default().fg(Color::White))
        };
        f.render_widget(
            Paragraph::new(input)
                .style(style)
                .block(Block::default().borders(Borders::ALL).title("Report symbol")),
            chunks[0],
        );

        if self.loading {
            components::render_loading_indicator(f, chunks[1], "Report", "Generating report...");
            return;
        }
        if let Some(error) = &self.error {
            components::render_error(f, chunks[1], "Report", error);
            return;
        }

        let title = match &self.symbol {
            Some(symbol) => format!("Report: {}", symbol),
            None => "Report".to_string(),
        };
        let body = if self.lines.is_empty() {
            Paragraph::new("No report loaded").style(Style::default().fg(Color::DarkGray))
        } else {
            Paragraph::new(self.lines.join("\n"))
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0))
        };
        f.render_widget(body.block(Block::default().borders(Borders::ALL).title(title)), chunks[1]);
    }

    fn get_title(&self) -> String {
        "Reports".to_string()
    }

    fn get_status(&self) -> String {
        if self.editing {
            "Enter generate • Esc cancel".to_string()
        } else {
            "/ symbol • ↑/↓ scroll".to_string()
        }
    }

    fn is_editing(&self) -> bool {
        self.editing
    }
}
