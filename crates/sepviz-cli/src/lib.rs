//! Shared CLI definitions for sepviz.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::Path;

/// Delimited text format of the data file.
/// When `--format` is not specified, format is detected from the file extension.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values
    Csv,
    /// Tab-separated values (.tsv or .txt)
    Tsv,
}

impl FileFormat {
    /// Detect file format from path extension. Returns None when extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from extension string (e.g. "csv", "tsv").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "txt" => Some(Self::Tsv),
            _ => None,
        }
    }

    pub fn delimiter(self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

/// Which categorical dimension runs down the rows of the score grid.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OrientationArg {
    /// Subsets as rows, disruptions as columns
    SubsetRows,
    /// Disruptions as rows, subsets as columns
    DisruptionRows,
}

/// How subset and disruption keys are labelled in the grid.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LabelStyleArg {
    /// Short labels such as "E+Tx" or "C+PS"
    Abbr,
    /// Full labels such as "Emotion + Toxicity"
    Full,
}

/// Command-line arguments for sepviz
#[derive(Clone, Parser, Debug)]
#[command(
    name = "sepviz",
    version,
    about = "Semantic Separation Visualization in the Terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Path to the data file (.csv, .tsv or .txt). Use "-" to read from standard input.
    /// When omitted, SEPVIZ_DATA and then the configured default path are tried.
    #[arg(value_name = "PATH", env = "SEPVIZ_DATA")]
    pub path: Option<std::path::PathBuf>,

    /// Force the file format (csv, tsv) instead of detecting it from the extension
    #[arg(long = "format", value_enum)]
    pub format: Option<FileFormat>,

    /// Grid orientation (default: subset-rows)
    #[arg(long = "orientation", value_enum)]
    pub orientation: Option<OrientationArg>,

    /// Grid label style (default: abbr)
    #[arg(long = "labels", value_enum)]
    pub labels: Option<LabelStyleArg>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Write a log of loading, selection changes and exports to this file
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Generate default configuration file at ~/.config/sepviz/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_format_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("data.csv")),
            Some(FileFormat::Csv)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("data.TSV")),
            Some(FileFormat::Tsv)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("data.txt")),
            Some(FileFormat::Tsv)
        );
        assert_eq!(FileFormat::from_path(Path::new("noext")), None);
        assert_eq!(FileFormat::from_path(Path::new("data.parquet")), None);
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(FileFormat::Csv.delimiter(), b',');
        assert_eq!(FileFormat::Tsv.delimiter(), b'\t');
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["sepviz", "--force"]).is_err());
        let args = Args::try_parse_from(["sepviz", "--generate-config", "--force"]).unwrap();
        assert!(args.generate_config && args.force);
    }

    #[test]
    fn test_parse_orientation_and_labels() {
        let args = Args::try_parse_from([
            "sepviz",
            "scores.tsv",
            "--orientation",
            "disruption-rows",
            "--labels",
            "full",
        ])
        .unwrap();
        assert_eq!(args.orientation, Some(OrientationArg::DisruptionRows));
        assert_eq!(args.labels, Some(LabelStyleArg::Full));
        assert_eq!(
            args.path.as_deref(),
            Some(std::path::Path::new("scores.tsv"))
        );
    }

    #[test]
    fn test_options_markdown_lists_flags() {
        let md = render_options_markdown();
        assert!(md.contains("--orientation"));
        assert!(md.contains("--log-file"));
        assert!(!md.contains("`--help`"));
    }
}
