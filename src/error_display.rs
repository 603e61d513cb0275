//! User-facing error message formatting.
//!
//! Matches on typed causes (LoadError, PolarsError variants, io::ErrorKind)
//! rather than parsing strings.

use color_eyre::eyre::Report;
use polars::prelude::PolarsError;
use std::io;

use crate::loader::{DataSource, LoadError};

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!(
            "Column not found: {}. Check the header row of the data file.",
            msg
        ),
        PE::Duplicate(msg) => format!("Duplicate column in data file: {}", msg),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::InvalidOperation(msg) => format!("Operation not allowed: {}", msg),
        PE::OutOfBounds(msg) => format!("Index or row out of bounds: {}", msg),
        PE::ComputeError(msg) => simplify_compute_message(msg),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::Interrupted => "Operation interrupted.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        ErrorKind::IsADirectory => "Path is a directory, not a file.".to_string(),
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain for LoadError, PolarsError or io::Error.
pub fn user_message_from_report(report: &Report, source: Option<&DataSource>) -> String {
    let with_source = |msg: String| match source {
        Some(s) => format!("Failed to load {}: {}", s, msg),
        None => msg,
    };

    for cause in report.chain() {
        if let Some(load_err) = cause.downcast_ref::<LoadError>() {
            // Already phrased for the user; the source is part of the message where relevant.
            return load_err.to_string();
        }
        if let Some(pe) = cause.downcast_ref::<PolarsError>() {
            return with_source(user_message_from_polars(pe));
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return with_source(user_message_from_io(io_err, None));
        }
    }

    // Fallback: first line of display to avoid long tracebacks
    let display = report.to_string();
    let first_line = display
        .lines()
        .next()
        .map(str::trim)
        .unwrap_or("An error occurred");
    with_source(first_line.to_string())
}

/// Keep the first paragraph of a polars compute error; later paragraphs are
/// parser hints about options sepviz does not expose.
fn simplify_compute_message(msg: &str) -> String {
    msg.split("\n\n")
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(msg)
        .to_string()
}
