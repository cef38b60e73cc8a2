//! Output sink
//!
//! Lifecycle operations report progress and container output through an
//! [`OutputSink`]. The CLI renders it to the terminal; tests collect it with
//! [`BufferedSink`].

/// A line of container output, classified by the lifecycle service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLine<'a> {
    /// Regular output
    Output(&'a str),

    /// The runner lost its connection and is retrying
    Reconnecting(&'a str),

    /// The runner is connected and waiting for jobs
    Listening(&'a str),
}

impl<'a> LogLine<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            LogLine::Output(text) | LogLine::Reconnecting(text) | LogLine::Listening(text) => text,
        }
    }
}

/// Receiver of lifecycle progress and container output
pub trait OutputSink: Send {
    /// Reports the start of a lifecycle step
    fn step(&mut self, message: &str);

    /// Forwards a line of container output
    fn line(&mut self, line: LogLine<'_>);
}

/// Sink that keeps everything in memory
#[derive(Debug, Clone, Default)]
pub struct BufferedSink {
    pub steps: Vec<String>,
    pub lines: Vec<String>,
    pub reconnects: usize,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for BufferedSink {
    fn step(&mut self, message: &str) {
        self.steps.push(message.to_string());
    }

    fn line(&mut self, line: LogLine<'_>) {
        if matches!(line, LogLine::Reconnecting(_)) {
            self.reconnects += 1;
        }
        self.lines.push(line.text().to_string());
    }
}
