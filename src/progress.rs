//! Progress bars for uploads and watches, plus a log writer that prints above
//! them instead of tearing through.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

static BARS: OnceLock<MultiProgress> = OnceLock::new();

fn bars() -> &'static MultiProgress {
    BARS.get_or_init(|| {
        let bars = MultiProgress::new();
        bars.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        bars
    })
}

/// Stage of a single file upload; the value is its completion percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Started,
    UrlIssued,
    Stored,
    Registered,
}

impl UploadStage {
    pub fn percent(&self) -> u64 {
        match self {
            UploadStage::Started => 0,
            UploadStage::UrlIssued => 25,
            UploadStage::Stored => 75,
            UploadStage::Registered => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadStage::Started => "requesting upload URL",
            UploadStage::UrlIssued => "uploading",
            UploadStage::Stored => "registering",
            UploadStage::Registered => "done",
        }
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .progress_chars("=> ")
}

/// Percentage bar for one file; hidden when `visible` is false
pub fn upload_bar(file_name: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = bars().add(ProgressBar::new(100));
    bar.set_style(style(
        "{spinner:.green} [{bar:30.cyan/blue}] {pos:>3}% {prefix} {msg}",
    ));
    bar.set_prefix(file_name.to_string());
    bar.set_message(UploadStage::Started.label());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub fn advance(bar: &ProgressBar, stage: UploadStage) {
    bar.set_position(stage.percent());
    bar.set_message(stage.label());
}

/// Spinner used while polling a document
pub fn watch_spinner(message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let spinner = bars().add(ProgressBar::new_spinner());
    spinner.set_style(style("{spinner:.green} [{elapsed_precise}] {msg}"));
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print `line` above the bars, or to `fallback` when the bars are not
/// drawn (stderr is not a terminal)
fn write_line(bars: &MultiProgress, fallback: &mut impl Write, line: &str) {
    let line = line.trim_end_matches('\r');
    if bars.is_hidden() {
        let _ = writeln!(fallback, "{}", line);
    } else {
        let _ = bars.println(line);
    }
}

fn emit_line(line: &str) {
    write_line(bars(), &mut io::stderr().lock(), line);
}

/// `MakeWriter` for tracing-subscriber that routes log lines through the
/// progress bar renderer
#[derive(Default, Clone)]
pub struct LogWriterFactory;

pub struct LogWriter {
    pending: String,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.push_str(&String::from_utf8_lossy(buf));
        while let Some(end) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=end).collect();
            emit_line(line.trim_end_matches('\n'));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            emit_line(rest.trim_end_matches('\n'));
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            pending: String::new(),
        }
    }
}
