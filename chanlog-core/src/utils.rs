use std::{
    sync::{Arc, Mutex, PoisonError, RwLock},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use crossbeam_channel::{RecvTimeoutError, Sender, bounded, unbounded};

use crate::{
    config::CHANLOG_SETTINGS,
    log_writer::{LogLine, LogWriter},
};

/// Messages understood by a writer thread.
#[derive(Debug)]
pub enum LogMessage {
    /// A line to write.
    Line(Arc<LogLine>),
    /// Flush the writer, then acknowledge on the enclosed sender.
    Flush(Sender<()>),
}

/// Sending half of a writer thread. Dropping it shuts the thread down.
///
/// Shutting down closes the channel: the thread writes everything queued
/// before that point and exits, and later sends are refused.
pub struct LogSender {
    sender: RwLock<Option<Sender<LogMessage>>>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for LogSender {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl LogSender {
    pub fn new(sender: Sender<LogMessage>, handler: JoinHandle<()>) -> Self {
        Self {
            sender: RwLock::new(Some(sender)),
            handler: Mutex::new(Some(handler)),
        }
    }

    fn send(&self, message: LogMessage) -> bool {
        let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Queues a line. Returns `false` when the sender has been shut down and
    /// the line will never be written.
    pub fn send_line(&self, line: Arc<LogLine>) -> bool {
        self.send(LogMessage::Line(line))
    }

    /// Blocks until every line queued before this call has been written and flushed.
    pub fn flush(&self) {
        let (ack, done) = bounded(1);
        if self.send(LogMessage::Flush(ack)) {
            let _ = done.recv();
        }
    }

    /// Stops the writer thread after it has drained and flushed. Idempotent.
    pub fn shutdown(&self) {
        let mut guard = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = guard.take() {
            self.sender
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if handle.join().is_err() {
                eprintln!("chanlog: writer thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handler
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

/// Reports the first write failure of a streak on stderr.
struct FailureReporter {
    failing: bool,
}

impl FailureReporter {
    fn check(&mut self, result: std::io::Result<()>) {
        match result {
            Ok(()) => self.failing = false,
            Err(e) => {
                if !self.failing {
                    eprintln!("chanlog: log write failed: {e}");
                }
                self.failing = true;
            }
        }
    }
}

/// Spawns a thread that owns `writer` and drains lines sent through the
/// returned [`LogSender`], batching them and flushing every
/// `CHANLOG_FLUSH_INTERVAL_MS`. The thread exits once the sender is shut
/// down and the queue is empty.
pub fn spawn_log_thread<W: LogWriter + Send + 'static>(mut writer: W) -> LogSender {
    let (sender, receiver) = unbounded::<LogMessage>();
    let handler = std::thread::spawn(move || {
        let mut batch = Vec::with_capacity(32);
        let flush_interval = CHANLOG_SETTINGS.flush_interval();
        let mut last_flush = Instant::now();
        let mut reporter = FailureReporter { failing: false };
        loop {
            // Calculate timeout until next flush
            let elapsed = last_flush.elapsed();
            let timeout = if elapsed >= flush_interval {
                Duration::from_millis(1)
            } else {
                flush_interval - elapsed
            };

            match receiver.recv_timeout(timeout) {
                Ok(msg) => {
                    batch.push(msg);
                    while let Ok(msg) = receiver.try_recv() {
                        batch.push(msg);
                        if batch.len() >= 32 {
                            break;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if last_flush.elapsed() >= flush_interval {
                        reporter.check(writer.flush());
                        last_flush = Instant::now();
                    }
                    continue;
                }
                // every queued message has been received
                Err(RecvTimeoutError::Disconnected) => {
                    reporter.check(writer.flush());
                    break;
                }
            }

            for message in batch.drain(..) {
                match message {
                    LogMessage::Line(line) => reporter.check(writer.write_line(&line)),
                    LogMessage::Flush(ack) => {
                        reporter.check(writer.flush());
                        last_flush = Instant::now();
                        let _ = ack.send(());
                    }
                }
            }

            if last_flush.elapsed() >= flush_interval {
                reporter.check(writer.flush());
                last_flush = Instant::now();
            }
        }
    });
    LogSender::new(sender, handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Level,
        rolling::{RollingConfig, RollingFile},
    };
    use std::{
        fs,
        path::{Path, PathBuf},
    };

    fn rolling_file(name: &str) -> (RollingFile, PathBuf) {
        let dir = PathBuf::from(format!("/tmp/chanlog_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let file = RollingFile::new(RollingConfig {
            folder: dir.clone(),
            filename: "thread.log".into(),
            max_size: 1 << 20,
            max_rolls: 1,
        })
        .unwrap();
        (file, dir.join("thread.log"))
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l[19..].to_string())
            .collect()
    }

    fn line(level: Level, text: &str) -> Arc<LogLine> {
        Arc::new(LogLine::new(level, text.into()))
    }

    #[test]
    fn test_flush_is_synchronous() {
        let (file, path) = rolling_file("thread_flush");
        let sender = spawn_log_thread(file);
        for i in 0..100 {
            assert!(sender.send_line(line(Level::Info, &format!("msg{i}"))));
        }
        sender.flush();
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[0], " [INFO] msg0");
        assert_eq!(lines[99], " [INFO] msg99");
        sender.shutdown();
    }

    #[test]
    fn test_shutdown_drains_and_is_idempotent() {
        let (file, path) = rolling_file("thread_shutdown");
        let sender = spawn_log_thread(file);
        for i in 0..500 {
            sender.send_line(line(Level::Warn, &format!("queued{i}")));
        }
        assert!(sender.is_running());
        sender.shutdown();
        assert!(!sender.is_running());
        sender.shutdown();
        assert!(!sender.send_line(line(Level::Warn, "late")));
        sender.flush();
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 500);
        assert_eq!(lines[499], " [WARN] queued499");
    }

    #[test]
    fn test_drop_flushes() {
        let (file, path) = rolling_file("thread_drop");
        {
            let sender = spawn_log_thread(file);
            sender.send_line(line(Level::Error, "dropped"));
        }
        assert_eq!(read_lines(&path), vec![" [ERROR] dropped".to_string()]);
    }
}
