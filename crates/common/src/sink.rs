use std::io::Write;
use std::sync::Mutex;

/// Receives human-readable status lines from the poller.
pub trait StatusSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Line-oriented console output. Every line is flushed as soon as it is written.
pub struct ConsoleSink<W: Write + Send = std::io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> StatusSink for ConsoleSink<W> {
    fn line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // A closed stdout must not take the poll loop down with it.
        if writeln!(out, "{line}").and_then(|_| out.flush()).is_err() {
            tracing::debug!("console sink write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_sink_writes_one_line_per_call() {
        let sink = ConsoleSink::new(Vec::new());
        sink.line("first");
        sink.line("second");
        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(written, "first\nsecond\n");
    }
}
