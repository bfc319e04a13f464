use std::sync::Arc;

use crate::{
    log_writer::{ConsoleWriter, LogLine, LogWriter},
    rolling::{RollingConfig, RollingFile},
    utils::{LogSender, spawn_log_thread},
};

/// The single destination every channel writes to: one writer thread per
/// output, each line fanned out to all of them.
pub struct Sink {
    senders: Vec<LogSender>,
}

impl Sink {
    /// Rolling file output, optionally duplicated to the console.
    pub fn rolling(config: RollingConfig, console: bool) -> Result<Self, std::io::Error> {
        let mut sink = Self::empty();
        sink.add_writer(RollingFile::new(config)?);
        if console {
            sink.add_writer(ConsoleWriter);
        }
        Ok(sink)
    }

    pub fn empty() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    pub fn add_writer<W: LogWriter + Send + 'static>(&mut self, writer: W) {
        self.senders.push(spawn_log_thread(writer));
    }

    /// Queues `line` on every output. Returns `false` if any output refused
    /// it because the sink has been shut down.
    pub fn write(&self, line: LogLine) -> bool {
        let line = Arc::new(line);
        let mut accepted = true;
        for sender in &self.senders {
            accepted &= sender.send_line(Arc::clone(&line));
        }
        accepted
    }

    /// Waits for every output to write and flush what was queued so far.
    pub fn flush(&self) {
        for sender in &self.senders {
            sender.flush();
        }
    }

    /// Drains, flushes and stops every writer thread.
    pub fn shutdown(&self) {
        for sender in &self.senders {
            sender.shutdown();
        }
    }
}
