use std::{
    io::{self, Write},
    path::PathBuf,
    sync::mpsc,
    thread,
};

use data::log::{MAX_LOG_FILE_SIZE, RotatingFile};

pub use data::log::Error;

enum LogMessage {
    Content(Vec<u8>),
    Flush,
    Shutdown,
}

/// Installs the global logger: stdout in debug builds, a rotated file otherwise.
/// `RUST_LOG` overrides the level of the workspace crates.
pub fn setup(is_debug: bool) -> Result<(), Error> {
    let default_level = if is_debug {
        log::Level::Debug
    } else {
        log::Level::Info
    };

    let level_filter = std::env::var("RUST_LOG")
        .ok()
        .as_deref()
        .map(str::parse::<log::Level>)
        .transpose()?
        .unwrap_or(default_level)
        .to_level_filter();

    let mut io_sink = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}:{} [{}] -- {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            message
        ));
    });

    if is_debug {
        io_sink = io_sink.chain(std::io::stdout());
    } else {
        let log_path = data::log::path()?;
        data::log::rotate(&log_path)?;

        let logger: Box<dyn Write + Send> = Box::new(BackgroundLogger::new(log_path)?);

        io_sink = io_sink.chain(logger);
    }

    fern::Dispatch::new()
        .level(log::LevelFilter::Off)
        .level_for("panic", log::LevelFilter::Error)
        .level_for("iced_wgpu", log::LevelFilter::Warn)
        .level_for("stockwatch_data", level_filter)
        .level_for("stockwatch_exchange", level_filter)
        .level_for("stockwatch", level_filter)
        .chain(io_sink)
        .apply()?;

    Ok(())
}

/// Hands log lines to a dedicated thread so the UI never waits on disk
struct BackgroundLogger {
    sender: mpsc::Sender<LogMessage>,
    _thread_handle: thread::JoinHandle<()>,
}

impl BackgroundLogger {
    fn new(path: PathBuf) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();

        let thread_handle = thread::Builder::new()
            .name("logger-thread".to_string())
            .spawn(move || {
                let mut file = match RotatingFile::open(path.clone(), MAX_LOG_FILE_SIZE) {
                    Ok(file) => file,
                    Err(e) => {
                        eprintln!("Failed to open log file {}: {e}", path.display());
                        return;
                    }
                };

                loop {
                    match receiver.recv() {
                        Ok(LogMessage::Content(data)) => {
                            if let Err(e) = file.write_all(&data) {
                                eprintln!("Logging error: {e}");
                            }
                        }
                        Ok(LogMessage::Flush) => {
                            if let Err(e) = file.flush() {
                                eprintln!("Error flushing logs: {e}");
                            }
                        }
                        Ok(LogMessage::Shutdown) | Err(_) => break,
                    }
                }
            })?;

        Ok(BackgroundLogger {
            sender,
            _thread_handle: thread_handle,
        })
    }

    fn send(&self, message: LogMessage) -> io::Result<()> {
        self.sender
            .send(message)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "Logger thread disconnected"))
    }
}

impl Write for BackgroundLogger {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(LogMessage::Content(buf.to_vec()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send(LogMessage::Flush)
    }
}

impl Drop for BackgroundLogger {
    fn drop(&mut self) {
        let _ = self.sender.send(LogMessage::Shutdown);
    }
}
