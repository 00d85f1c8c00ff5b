use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fs, io};

use crate::data_path;

const LOG_FILE: &str = "stockwatch-current.log";
const PREVIOUS_LOG_FILE: &str = "stockwatch-previous.log";

pub const MAX_LOG_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Full path of the current log file, creating its folder if needed
pub fn path() -> Result<PathBuf, Error> {
    let full_path = data_path(Some(LOG_FILE));

    let parent = full_path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file path"))?;

    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    Ok(full_path)
}

/// Moves the last run's log aside so each run starts with an empty file
pub fn rotate(log_path: &Path) -> io::Result<()> {
    let dir = log_path.parent().unwrap_or(Path::new("."));
    let previous_log_path = dir.join(PREVIOUS_LOG_FILE);

    if previous_log_path.exists() {
        fs::remove_file(&previous_log_path)?;
    }

    if log_path.exists() {
        fs::rename(log_path, &previous_log_path)?;
    }

    Ok(())
}

/// Append-only log file that moves itself aside once it would outgrow `max_size`
pub struct RotatingFile {
    path: PathBuf,
    file: fs::File,
    size: u64,
    max_size: u64,
}

impl RotatingFile {
    pub fn open(path: PathBuf, max_size: u64) -> io::Result<Self> {
        let file = open_append(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            file,
            size,
            max_size,
        })
    }

    fn roll(&mut self) -> io::Result<()> {
        self.file.flush()?;
        rotate(&self.path)?;

        self.file = open_append(&self.path)?;
        self.size = 0;

        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // an oversized write into an empty file goes through as is
        if self.size > 0 && self.size + buf.len() as u64 > self.max_size {
            self.roll()?;
        }

        let written = self.file.write(buf)?;
        self.size += written as u64;

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().create(true).append(true).open(path)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    SetLog(#[from] log::SetLoggerError),
    #[error(transparent)]
    ParseLevel(#[from] log::ParseLevelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_keeps_one_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join(LOG_FILE);

        fs::write(&current, "first run").unwrap();
        rotate(&current).unwrap();
        assert!(!current.exists());

        fs::write(&current, "second run").unwrap();
        rotate(&current).unwrap();

        let previous = fs::read_to_string(dir.path().join(PREVIOUS_LOG_FILE)).unwrap();
        assert_eq!(previous, "second run");
    }

    #[test]
    fn full_log_file_rolls_over_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join(LOG_FILE);

        let mut file = RotatingFile::open(current.clone(), 16).unwrap();
        file.write_all(b"first line\n").unwrap();
        file.write_all(b"second line\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&current).unwrap(), "second line\n");
        assert_eq!(
            fs::read_to_string(dir.path().join(PREVIOUS_LOG_FILE)).unwrap(),
            "first line\n"
        );
    }

    #[test]
    fn oversized_line_still_lands_in_an_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join(LOG_FILE);

        let mut file = RotatingFile::open(current.clone(), 4).unwrap();
        file.write_all(b"longer than the cap\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&current).unwrap(), "longer than the cap\n");
        assert!(!dir.path().join(PREVIOUS_LOG_FILE).exists());
    }
}
