use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::log_writer::{LogLine, LogWriter};

#[cfg(not(test))]
pub mod limits {
    pub const MIN_FILE_SIZE: u64 = 4_096;
    pub const MIN_COUNT: u32 = 1;
}


/// Configuration for a size-rotated log file.
#[derive(Debug, Clone)]
pub struct RollingConfig {
    pub folder: PathBuf,
    /// Bare file name of the live log inside `folder`.
    pub filename: String,
    /// Rotation threshold in bytes.
    pub max_size: u64,
    /// Number of rolled files (`<filename>.1` .. `<filename>.<max_rolls>`) kept.
    pub max_rolls: u32,
}

/// A log file writer that rolls `<filename>` over to `<filename>.1` once the
/// next line would take it past `max_size` bytes, shifting older rolls up by
/// one and deleting whatever falls off the end.
///
/// A rotation that fails (a rename or a removal refused by the filesystem)
/// turns rotation off: later lines are appended to the live file and no
/// further roll is touched.
pub struct RollingFile {
    folder: PathBuf,
    filename: String,
    max_size: u64,
    max_rolls: u32,
    current_file: BufWriter<File>,
    current_size: u64,
    // rolled files present, `<filename>.1` up to `<filename>.<rolls>`
    rolls: u32,
    rotation_failed: bool,
}

impl RollingFile {
    pub fn new(config: RollingConfig) -> Result<Self, io::Error> {
        if config.max_size < limits::MIN_FILE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("max_size must be at least {} bytes", limits::MIN_FILE_SIZE),
            ));
        }
        if config.max_rolls < limits::MIN_COUNT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("max_rolls must be at least {}", limits::MIN_COUNT),
            ));
        }
        if config.filename.is_empty() || config.filename.contains(['/', '\\']) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "filename must be a bare file name",
            ));
        }
        let path = config.folder.join(&config.filename);
        let (current_file, current_size) = open_append(&path)?;
        let mut writer = Self {
            folder: config.folder,
            filename: config.filename,
            max_size: config.max_size,
            max_rolls: config.max_rolls,
            current_file,
            current_size,
            rolls: 0,
            rotation_failed: false,
        };
        while writer.rolls < writer.max_rolls && writer.roll_path(writer.rolls + 1).exists() {
            writer.rolls += 1;
        }
        Ok(writer)
    }

    /// Path of the live log file.
    pub fn path(&self) -> PathBuf {
        self.folder.join(&self.filename)
    }

    fn roll_path(&self, index: u32) -> PathBuf {
        self.folder.join(format!("{}.{index}", self.filename))
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        !self.rotation_failed
            && self.current_size > 0
            && self.current_size + incoming > self.max_size
    }

    /// Shifts only the rolls that exist, so the cost does not depend on
    /// `max_rolls`.
    fn rotate(&mut self) -> io::Result<()> {
        self.current_file.flush()?;
        if self.rolls >= self.max_rolls {
            remove_if_exists(&self.roll_path(self.max_rolls))?;
        }
        let top = self.rolls.min(self.max_rolls - 1);
        for index in (1..=top).rev() {
            let from = self.roll_path(index);
            if from.exists() {
                fs::rename(&from, self.roll_path(index + 1))?;
            }
        }
        fs::rename(self.path(), self.roll_path(1))?;
        self.rolls = top + 1;
        let (file, size) = open_append(&self.path())?;
        self.current_file = file;
        self.current_size = size;
        Ok(())
    }
}

impl LogWriter for RollingFile {
    fn write_line(&mut self, line: &LogLine) -> io::Result<()> {
        let text = line.plain();
        let incoming = text.len() as u64 + 1;
        let rotated = if self.should_rotate(incoming) {
            self.rotate()
        } else {
            Ok(())
        };
        if rotated.is_err() {
            self.rotation_failed = true;
        }
        writeln!(self.current_file, "{text}")?;
        self.current_size += incoming;
        rotated
    }

    fn flush(&mut self) -> io::Result<()> {
        self.current_file.flush()
    }
}

fn open_append(path: &Path) -> Result<(BufWriter<File>, u64), io::Error> {
    let file = File::options().create(true).append(true).open(path)?;
    let size = file.metadata()?.len();
    Ok((BufWriter::new(file), size))
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
