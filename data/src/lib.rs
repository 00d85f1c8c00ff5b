pub mod chart;
pub mod config;
pub mod log;
pub mod snapshot;
pub mod tickers_table;
pub mod util;
pub mod watchlist;

pub use config::ScaleMode;
pub use config::state::State;
pub use watchlist::WatchlistStore;

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

pub const SAVED_STATE_PATH: &str = "saved-state.json";

const APP_DIR: &str = "stockwatch";
const DATA_PATH_ENV: &str = "STOCKWATCH_DATA_PATH";

#[derive(thiserror::Error, Debug, Clone)]
pub enum InternalError {
    #[error("Fetch error: {0}")]
    Fetch(String),
    #[error("Watchlist error: {0}")]
    Watchlist(String),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub fn write_json_to_file(json: &str, file_name: &str) -> Result<(), Error> {
    let path = data_path(Some(file_name));

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

pub fn read_from_file(file_name: &str) -> Result<State, Error> {
    let path = data_path(Some(file_name));

    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    Ok(serde_json::from_str(&contents)?)
}

/// Loads the saved state, or defaults when it is missing or unreadable
pub fn load_saved_state() -> State {
    match read_from_file(SAVED_STATE_PATH) {
        Ok(state) => state,
        Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            ::log::info!("No saved state found, starting with defaults");
            State::default()
        }
        Err(e) => {
            ::log::error!("Failed to load saved state, starting with defaults: {e}");
            State::default()
        }
    }
}

pub fn save_state(state: &State) {
    match serde_json::to_string_pretty(state) {
        Ok(json) => {
            if let Err(e) = write_json_to_file(&json, SAVED_STATE_PATH) {
                ::log::error!("Failed to write state to file: {e}");
            } else {
                ::log::info!("Persisted state to {SAVED_STATE_PATH}");
            }
        }
        Err(e) => ::log::error!("Failed to serialize state: {e}"),
    }
}

pub fn data_path(path_name: Option<&str>) -> PathBuf {
    let base = if let Ok(path) = std::env::var(DATA_PATH_ENV) {
        PathBuf::from(path)
    } else {
        dirs_next::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    };

    match path_name {
        Some(name) => base.join(name),
        None => base,
    }
}
