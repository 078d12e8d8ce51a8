//! User-facing output channel.
//!
//! Compiler diagnostics and platform listings are printed for the user rather than
//! logged, so they go through a [`Reporter`] that tests can capture.

/// Sink for text the user is meant to read.
pub trait Reporter {
    fn report(&mut self, text: &str);
}

/// Prints each report on its own line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn report(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Collects reports in memory.
impl Reporter for Vec<String> {
    fn report(&mut self, text: &str) {
        self.push(text.to_string());
    }
}
