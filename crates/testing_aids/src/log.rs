// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::Write;
use std::sync::{Arc, Mutex, Once};

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::is_mutation_testing;

/// Enables logging of test output at INFO and above to the standard output stream.
///
/// Logging is global state and lasts until the end of the process. Calling this more than once
/// is harmless. Under mutation testing, this is a no-op.
pub fn log_to_stdout() {
    if is_mutation_testing() {
        return;
    }

    STDOUT_LOGGING.call_once(|| {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_filter(LevelFilter::from_level(Level::INFO)))
            .try_init()
            .expect("this can only happen if something else besides testing_aids has configured logging");
    });
}

static STDOUT_LOGGING: Once = Once::new();

/// Captures formatted log output in memory so tests can inspect it.
///
/// Install the subscriber from [`subscriber()`][Self::subscriber] for the current thread via
/// `tracing::subscriber::set_default()`.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Creates an empty capture buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured log output.
    ///
    /// # Panics
    ///
    /// Panics if a thread panicked while writing to the capture buffer.
    #[must_use]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Asserts that the captured log output contains `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the captured log output does not contain the expected string.
    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(output.contains(expected), "log output does not contain '{expected}', got:\n{output}");
    }

    /// A subscriber that writes events of all levels to this capture buffer.
    #[must_use]
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_writer(self.clone())
                .with_ansi(false)
                .with_filter(LevelFilter::TRACE),
        )
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// Appends formatted log output to the buffer of a [`LogCapture`].
#[derive(Debug)]
pub struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tracing::{Level, event};

    use super::*;

    #[test]
    fn capture_records_events() {
        let capture = LogCapture::new();

        tracing::subscriber::with_default(capture.subscriber(), || {
            event!(Level::DEBUG, message = "captured event", answer = 42);
        });

        capture.assert_contains("captured event");
        capture.assert_contains("answer=42");
    }
}
