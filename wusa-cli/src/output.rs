//! Terminal output
//!
//! Renders lifecycle progress, container output and runner lists.

use colored::*;
use wusa_core::domain::runner::{Runner, RunnerStatus};
use wusa_runner::service::{LogLine, OutputSink};

/// Sink printing lifecycle output to the terminal
#[derive(Debug, Default)]
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn step(&mut self, message: &str) {
        println!("{} {}", "▸".cyan(), message.bold());
    }

    fn line(&mut self, line: LogLine<'_>) {
        match line {
            LogLine::Output(text) => println!("  {}", text.dimmed()),
            LogLine::Reconnecting(text) => println!("  {}", text.yellow()),
            LogLine::Listening(text) => println!("  {}", text.green()),
        }
    }
}

/// Prints runners as an aligned table
///
/// The status column is only shown for runners whose status came from GitHub.
pub fn print_runners(runners: &[Runner]) {
    let with_status = runners
        .iter()
        .any(|runner| runner.status != RunnerStatus::Unknown);
    let name_width = column_width("NAME", runners.iter().map(|r| r.name.as_str()));
    let repo_width = column_width("REPOSITORY", runners.iter().map(|r| r.repo.as_str()));

    let mut header = format!("{:<name_width$}  {:<repo_width$}", "NAME", "REPOSITORY");
    if with_status {
        header.push_str(&format!("  {:<7}", "STATUS"));
    }
    header.push_str("  LABELS");
    println!("{}", header.bold());

    for runner in runners {
        let mut row = format!(
            "{:<name_width$}  {:<repo_width$}",
            runner.name, runner.repo
        );
        if with_status {
            // Pad before coloring, escape codes would break the alignment
            let status = format!("{:<7}", runner.status.as_str());
            row.push_str(&format!("  {}", colorize_status(&runner.status, &status)));
        }
        row.push_str(&format!("  {}", runner.labels_csv().dimmed()));
        println!("{}", row);
    }
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).fold(header.len(), usize::max)
}

fn colorize_status(status: &RunnerStatus, text: &str) -> ColoredString {
    match status {
        RunnerStatus::Online => text.green(),
        RunnerStatus::Idle => text.cyan(),
        RunnerStatus::Offline => text.red(),
        RunnerStatus::Unknown => text.normal(),
    }
}
