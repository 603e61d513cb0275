//! Read the score table: delimited text → validated, filtered, coerced `DataFrame`.

use color_eyre::Result;
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use crate::labels::{LabelRegistry, DISRUPTIONS, SUBSETS};
use crate::selection::CellKey;
use crate::FileFormat;

pub const UMAP1: &str = "UMAP1";
pub const UMAP2: &str = "UMAP2";
pub const SHOW_LABEL: &str = "SHOW_LABEL";
pub const SIL_SCORE: &str = "SIL_SCORE";
pub const SUBSET: &str = "SUBSET";
pub const DISRUPTION: &str = "DISRUPTION";
pub const SEASON: &str = "SEASON";
pub const EPISODE: &str = "EPISODE";

pub const REQUIRED_COLUMNS: [&str; 6] = [UMAP1, UMAP2, SHOW_LABEL, SIL_SCORE, SUBSET, DISRUPTION];

/// Columns shown in a plot point's tooltip, in display order, when present.
pub const TOOLTIP_COLUMNS: [&str; 5] = [SEASON, EPISODE, SIL_SCORE, SUBSET, DISRUPTION];

/// Where the table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Stdin,
}

impl DataSource {
    /// Pick the data source: explicit path (`-` for stdin), else the default path if it exists.
    pub fn resolve(
        explicit: Option<&Path>,
        default_path: &Path,
    ) -> std::result::Result<Self, LoadError> {
        match explicit {
            Some(p) if p == Path::new("-") => Ok(Self::Stdin),
            Some(p) => Ok(Self::Path(p.to_path_buf())),
            None if default_path.exists() => Ok(Self::Path(default_path.to_path_buf())),
            None => Err(LoadError::NoDataSource {
                default_path: default_path.to_path_buf(),
            }),
        }
    }

    pub fn format(&self) -> Option<FileFormat> {
        match self {
            Self::Path(p) => FileFormat::from_path(p),
            Self::Stdin => None,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Stdin => write!(f, "<stdin>"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Overrides extension-based format detection.
    pub format: Option<FileFormat>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Delimiter for `source`: explicit format, then extension, then comma.
    pub fn delimiter_for(&self, source: &DataSource) -> u8 {
        self.format
            .or_else(|| source.format())
            .unwrap_or(FileFormat::Csv)
            .delimiter()
    }
}

/// Fatal conditions that stop the dashboard from rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    NoDataSource { default_path: PathBuf },
    MissingColumns(Vec<String>),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDataSource { default_path } => write!(
                f,
                "No data file. Put your data file at `{}`, pass a path, or pipe it on stdin with `-`.",
                default_path.display()
            ),
            Self::MissingColumns(cols) => {
                let quoted: Vec<String> = cols.iter().map(|c| format!("'{}'", c)).collect();
                write!(f, "Missing required columns: [{}]", quoted.join(", "))
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// The loaded, immutable table of observations.
pub struct ScoreTable {
    df: DataFrame,
    source: DataSource,
    dropped_rows: usize,
    coerced_missing: usize,
}

impl ScoreTable {
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Rows dropped because their subset or disruption is not registered.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Score values present in the file that could not be read as numbers.
    pub fn coerced_missing(&self) -> usize {
        self.coerced_missing
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| c.as_str() == name)
    }

    /// Tooltip columns present in this table.
    pub fn tooltip_columns(&self) -> Vec<&'static str> {
        TOOLTIP_COLUMNS
            .iter()
            .copied()
            .filter(|c| self.has_column(c))
            .collect()
    }

    /// Rows whose subset and disruption both equal `key`.
    pub fn rows_matching(&self, key: &CellKey) -> Result<DataFrame> {
        let df = self
            .df
            .clone()
            .lazy()
            .filter(
                col(SUBSET)
                    .eq(lit(key.subset.as_str()))
                    .and(col(DISRUPTION).eq(lit(key.disruption.as_str()))),
            )
            .collect()?;
        Ok(df)
    }
}

/// Expression keeping rows whose `column` is one of the registry's keys.
fn registered_keys(column: &str, registry: &LabelRegistry) -> Expr {
    registry
        .keys()
        .into_iter()
        .map(|key| col(column).eq(lit(key)))
        .reduce(|acc, e| acc.or(e))
        .unwrap_or(lit(false))
}

/// Fail with the sorted list of required columns absent from `df`.
pub fn validate_columns(df: &DataFrame) -> std::result::Result<(), LoadError> {
    let present: HashSet<&str> = df
        .get_column_names()
        .into_iter()
        .map(|c| c.as_str())
        .collect();
    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        missing.sort();
        Err(LoadError::MissingColumns(missing))
    }
}

/// Validate, drop unregistered conditions and coerce numeric columns.
pub fn prepare(df: DataFrame, source: DataSource) -> Result<ScoreTable> {
    validate_columns(&df)?;

    let total = df.height();
    let filtered = df
        .lazy()
        .filter(registered_keys(SUBSET, &SUBSETS).and(registered_keys(DISRUPTION, &DISRUPTIONS)))
        .collect()?;
    let dropped_rows = total - filtered.height();

    let raw_scores = filtered.column(SIL_SCORE)?;
    let present_scores = raw_scores.len() - raw_scores.null_count();

    let df = filtered
        .lazy()
        .with_columns([numeric(UMAP1), numeric(UMAP2), numeric(SIL_SCORE)])
        .collect()?;

    let scores = df.column(SIL_SCORE)?;
    let numeric_scores = scores.len() - scores.null_count();
    let coerced_missing = present_scores.saturating_sub(numeric_scores);
    if coerced_missing > 0 {
        tracing::debug!(
            count = coerced_missing,
            "non-numeric {} values treated as missing",
            SIL_SCORE
        );
    }

    Ok(ScoreTable {
        df,
        source,
        dropped_rows,
        coerced_missing,
    })
}

/// Non-strict f64 parse of a text column. Surrounding whitespace is ignored;
/// text that does not parse, and non-finite results, become null.
fn numeric(name: &str) -> Expr {
    let parsed = col(name)
        .str()
        .strip_chars(lit(NULL))
        .cast(DataType::Float64);
    when(parsed.clone().is_finite())
        .then(parsed)
        .otherwise(lit(NULL))
        .alias(name)
}

fn read_options(delimiter: u8) -> CsvReadOptions {
    // Read every column as text; numeric columns are coerced in `prepare`.
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(delimiter))
}

/// Parse delimited text already in memory.
pub fn load_table_from_bytes(
    bytes: Vec<u8>,
    delimiter: u8,
    source: DataSource,
) -> Result<ScoreTable> {
    let df = CsvReader::new(Cursor::new(bytes))
        .with_options(read_options(delimiter))
        .finish()?;
    prepare(df, source)
}

/// Load the table from a file or stdin.
pub fn load_table(source: &DataSource, options: &LoadOptions) -> Result<ScoreTable> {
    let delimiter = options.delimiter_for(source);
    let table = match source {
        DataSource::Path(path) => {
            let file = File::open(path)?;
            let df = CsvReader::new(file)
                .with_options(read_options(delimiter))
                .finish()?;
            prepare(df, source.clone())?
        }
        DataSource::Stdin => {
            let mut bytes = Vec::new();
            std::io::stdin().read_to_end(&mut bytes)?;
            load_table_from_bytes(bytes, delimiter, source.clone())?
        }
    };

    tracing::info!(
        source = %source,
        rows = table.height(),
        dropped = table.dropped_rows(),
        "loaded score table"
    );
    Ok(table)
}
