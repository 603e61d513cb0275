use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const HEADER: [&str; 8] = [
    "UMAP1",
    "UMAP2",
    "SHOW_LABEL",
    "SIL_SCORE",
    "SUBSET",
    "DISRUPTION",
    "SEASON",
    "EPISODE",
];

/// Rows used by most tests: one scored Emotion/RAW row, a Topics/C
/// duplicate pair, a non-numeric score and two rows with unknown keys.
pub fn sample_rows() -> Vec<[&'static str; 8]> {
    vec![
        ["1.0", "2.0", "South Park", "0.4567", "Emotion", "RAW", "1", "2"],
        ["3.5", "-1.25", "The Office", "0.1", "Topics", "C", "4", "10"],
        ["0.5", "0.5", "Always Sunny", "0.9", "Topics", "C", "5", "1"],
        ["2.0", "2.0", "South Park", "n/a", "Toxicity", "CS", "2", "3"],
        ["9.0", "9.0", "South Park", "0.3", "Mystery", "RAW", "1", "1"],
        ["9.0", "9.0", "South Park", "0.3", "Emotion", "SHOUT", "1", "1"],
    ]
}

pub fn write_delimited(
    dir: &TempDir,
    name: &str,
    delimiter: char,
    header: &[&str],
    rows: &[[&str; 8]],
) -> PathBuf {
    let sep = delimiter.to_string();
    let mut content = header.join(&sep);
    content.push('\n');
    for row in rows {
        content.push_str(&row.join(&sep));
        content.push('\n');
    }
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write sample data");
    path
}

pub fn sample_csv(dir: &TempDir) -> PathBuf {
    write_delimited(dir, "scores.csv", ',', &HEADER, &sample_rows())
}

pub fn sample_tsv(dir: &TempDir, name: &str) -> PathBuf {
    write_delimited(dir, name, '\t', &HEADER, &sample_rows())
}
