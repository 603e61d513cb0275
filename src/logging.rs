//! File logging. The terminal belongs to the UI, so log lines only go to a
//! file given with `--log-file`; without one, tracing events are dropped.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;

/// Install a global subscriber appending to `path`. `debug` lowers the level
/// from INFO to DEBUG.
pub fn init_file_logging(path: &Path, debug: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))?;

    let level = if debug { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sepviz starting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = init_file_logging(&dir.path().join("missing").join("sepviz.log"), false)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to open log file"));
    }
}
