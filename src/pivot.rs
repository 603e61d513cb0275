//! Subset × disruption score matrix.
//!
//! The grid is keyed by canonical keys only; display labels are attached for
//! rendering and never used to resolve clicks or the selection highlight.

use color_eyre::Result;
use polars::lazy::frame::pivot::pivot_stable;
use polars::prelude::*;
use std::collections::HashMap;

use crate::labels::{LabelRegistry, LabelStyle};
use crate::loader::{ScoreTable, DISRUPTION, SIL_SCORE, SUBSET};
use crate::selection::{CellKey, Selection};
use crate::OrientationArg;

/// Which dimension runs down the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Rows are subsets, columns are disruptions.
    #[default]
    SubsetRows,
    /// Rows are disruptions, columns are subsets.
    DisruptionRows,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Self::SubsetRows => Self::DisruptionRows,
            Self::DisruptionRows => Self::SubsetRows,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SubsetRows => "subset-rows",
            Self::DisruptionRows => "disruption-rows",
        }
    }

    /// Map a (row-key, column-key) pair to (subset-key, disruption-key).
    pub fn subset_disruption<'a>(self, row_key: &'a str, col_key: &'a str) -> (&'a str, &'a str) {
        match self {
            Self::SubsetRows => (row_key, col_key),
            Self::DisruptionRows => (col_key, row_key),
        }
    }
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::SubsetRows => Self::SubsetRows,
            OrientationArg::DisruptionRows => Self::DisruptionRows,
        }
    }
}

/// Observed score bounds used to scale the cell gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl ScoreRange {
    /// Min/max of `SIL_SCORE` over the whole frame, or the 0..1 default when
    /// no score is present.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let stats = df
            .clone()
            .lazy()
            .select([
                col(SIL_SCORE).min().alias("min"),
                col(SIL_SCORE).max().alias("max"),
            ])
            .collect()?;
        let min = stats.column("min")?.f64()?.get(0);
        let max = stats.column("max")?.f64()?.get(0);
        Ok(match (min, max) {
            (Some(min), Some(max)) => Self { min, max },
            _ => Self::default(),
        })
    }
}

/// Wide score frame: one row per subset, one column per disruption. Each
/// cell holds the first non-missing score of its pair in source order.
pub fn pivot_first_scores(df: &DataFrame) -> Result<DataFrame> {
    let scored = df
        .clone()
        .lazy()
        .select([col(SUBSET), col(DISRUPTION), col(SIL_SCORE)])
        .filter(col(SIL_SCORE).is_not_null())
        .collect()?;
    if scored.height() == 0 {
        return Ok(DataFrame::empty());
    }

    // Stable pivot keeps source order inside each group, so first() is the
    // first scored row.
    let wide = pivot_stable(
        &scored,
        [DISRUPTION],
        Some([SUBSET]),
        Some([SIL_SCORE]),
        false,
        Some(col(PlSmallStr::from_static("")).first()),
        None,
    )?;
    Ok(wide)
}

/// (subset, disruption) → score lookup over a frame from [`pivot_first_scores`].
fn score_lookup(wide: &DataFrame) -> Result<HashMap<(String, String), f64>> {
    let mut lookup = HashMap::new();
    if wide.height() == 0 {
        return Ok(lookup);
    }

    let subsets = wide.column(SUBSET)?.str()?;
    for column in wide.get_columns() {
        if column.name().as_str() == SUBSET {
            continue;
        }
        let values = column.cast(&DataType::Float64)?;
        for (subset, value) in subsets.into_iter().zip(values.f64()?) {
            if let (Some(subset), Some(value)) = (subset, value) {
                lookup.insert((subset.to_string(), column.name().to_string()), value);
            }
        }
    }
    Ok(lookup)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Scale each channel by `factor` (0..=1).
    pub fn darken(self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f64 * f).round() as u8;
        Self(scale(self.0), scale(self.1), scale(self.2))
    }
}

/// Red → yellow → green gradient position of `value` within `[min, max]`.
/// A degenerate range maps everything to the midpoint (yellow).
pub fn color_for(value: f64, min: f64, max: f64) -> Rgb {
    let t = if max == min {
        0.5
    } else {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    };
    if t < 0.5 {
        Rgb(255, (255.0 * t * 2.0).round() as u8, 0)
    } else {
        Rgb((255.0 * (1.0 - (t - 0.5) * 2.0)).round() as u8, 255, 0)
    }
}

/// Whether the cell for (subset, disruption) is the current selection.
pub fn is_selected(subset_key: &str, disruption_key: &str, selection: &Selection) -> bool {
    selection.matches(subset_key, disruption_key)
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Cell text: three decimals, or empty for a missing value.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}", v),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub key: String,
    pub label: String,
    /// One value per grid column, rounded to three decimals.
    pub values: Vec<Option<f64>>,
}

/// The pivoted score matrix in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotGrid {
    pub orientation: Orientation,
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
    pub range: ScoreRange,
}

impl PivotGrid {
    /// Pivot the `SUBSET`, `DISRUPTION` and `SIL_SCORE` columns of `df` into
    /// a grid laid out in canonical order.
    pub fn build(
        df: &DataFrame,
        subsets: &LabelRegistry,
        disruptions: &LabelRegistry,
        orientation: Orientation,
        style: LabelStyle,
    ) -> Result<Self> {
        let first = score_lookup(&pivot_first_scores(df)?)?;
        let range = ScoreRange::from_frame(df)?;

        let (row_registry, col_registry) = match orientation {
            Orientation::SubsetRows => (subsets, disruptions),
            Orientation::DisruptionRows => (disruptions, subsets),
        };

        let columns: Vec<GridColumn> = col_registry
            .keys()
            .into_iter()
            .map(|key| GridColumn {
                key: key.to_string(),
                label: col_registry.label(key, style).to_string(),
            })
            .collect();

        let rows = row_registry
            .keys()
            .into_iter()
            .map(|row_key| {
                let values = columns
                    .iter()
                    .map(|column| {
                        let (subset, disruption) =
                            orientation.subset_disruption(row_key, column.key.as_str());
                        first
                            .get(&(subset.to_string(), disruption.to_string()))
                            .copied()
                            .map(round3)
                    })
                    .collect();
                GridRow {
                    key: row_key.to_string(),
                    label: row_registry.label(row_key, style).to_string(),
                    values,
                }
            })
            .collect();

        Ok(Self {
            orientation,
            columns,
            rows,
            range,
        })
    }

    pub fn from_table(
        table: &ScoreTable,
        subsets: &LabelRegistry,
        disruptions: &LabelRegistry,
        orientation: Orientation,
        style: LabelStyle,
    ) -> Result<Self> {
        Self::build(table.df(), subsets, disruptions, orientation, style)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.values.get(col).copied().flatten())
    }

    /// (subset-key, disruption-key) addressed by a cell, regardless of its value.
    pub fn keys_at(&self, row: usize, col: usize) -> Option<(&str, &str)> {
        let row_key = self.rows.get(row)?.key.as_str();
        let col_key = self.columns.get(col)?.key.as_str();
        Some(self.orientation.subset_disruption(row_key, col_key))
    }

    /// Resolve a click on (row, col). Empty cells and out-of-range positions
    /// resolve to the empty pair.
    pub fn resolve(&self, row: usize, col: usize) -> CellKey {
        if self.value(row, col).is_none() {
            return CellKey::empty();
        }
        match self.keys_at(row, col) {
            Some((subset, disruption)) => CellKey::new(subset, disruption),
            None => CellKey::empty(),
        }
    }

    pub fn is_cell_selected(&self, row: usize, col: usize, selection: &Selection) -> bool {
        self.keys_at(row, col)
            .map(|(s, d)| is_selected(s, d, selection))
            .unwrap_or(false)
    }

    /// Grid position of the selected pair, if it is on the grid.
    pub fn position_of(&self, selection: &Selection) -> Option<(usize, usize)> {
        (0..self.num_rows())
            .flat_map(|r| (0..self.num_columns()).map(move |c| (r, c)))
            .find(|&(r, c)| self.is_cell_selected(r, c, selection))
    }

    pub fn cell_color(&self, row: usize, col: usize) -> Option<Rgb> {
        self.value(row, col)
            .map(|v| color_for(v, self.range.min, self.range.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{DISRUPTIONS, SUBSETS};
    use polars::df;

    type Row<'a> = (&'a str, &'a str, Option<f64>);

    fn score<'a>(subset: &'a str, disruption: &'a str, score: Option<f64>) -> Row<'a> {
        (subset, disruption, score)
    }

    fn frame(rows: &[Row]) -> DataFrame {
        let subsets: Vec<&str> = rows.iter().map(|r| r.0).collect();
        let disruptions: Vec<&str> = rows.iter().map(|r| r.1).collect();
        let scores: Vec<Option<f64>> = rows.iter().map(|r| r.2).collect();
        df!(
            SUBSET => subsets,
            DISRUPTION => disruptions,
            SIL_SCORE => scores
        )
        .unwrap()
    }

    fn grid(rows: &[Row], orientation: Orientation) -> PivotGrid {
        PivotGrid::build(
            &frame(rows),
            &SUBSETS,
            &DISRUPTIONS,
            orientation,
            LabelStyle::Abbr,
        )
        .unwrap()
    }

    #[test]
    fn first_scored_row_wins() {
        let g = grid(
            &[
                score("Topics", "C", None),
                score("Topics", "C", Some(0.4)),
                score("Topics", "C", Some(0.9)),
                score("Emotion", "C", Some(0.2)),
            ],
            Orientation::SubsetRows,
        );
        let topics = SUBSETS.position("Topics").unwrap();
        let col = DISRUPTIONS.position("C").unwrap();
        assert_eq!(g.value(topics, col), Some(0.4));
        assert_eq!(g.value(0, col), Some(0.2));

        let wide = pivot_first_scores(&frame(&[
            score("Topics", "C", Some(0.4)),
            score("Topics", "RAW", Some(0.1)),
        ]))
        .unwrap();
        assert_eq!(wide.height(), 1);
        assert_eq!(wide.width(), 3);
    }

    #[test]
    fn first_match_wins() {
        let g = grid(
            &[
                score("Topics", "C", Some(0.1)),
                score("Topics", "C", Some(0.9)),
            ],
            Orientation::SubsetRows,
        );
        let row = SUBSETS.position("Topics").unwrap();
        let col = DISRUPTIONS.position("C").unwrap();
        assert_eq!(g.value(row, col), Some(0.1));
    }

    #[test]
    fn rounds_to_three_decimals() {
        let g = grid(&[score("Emotion", "RAW", Some(0.4567))], Orientation::SubsetRows);
        assert_eq!(g.value(0, 0), Some(0.457));
        assert_eq!(format_value(g.value(0, 0)), "0.457");
        assert_eq!(format_value(g.value(0, 1)), "");
    }

    #[test]
    fn missing_score_renders_empty() {
        let g = grid(&[score("Emotion", "RAW", None)], Orientation::SubsetRows);
        assert_eq!(g.value(0, 0), None);
        assert_eq!(g.resolve(0, 0), CellKey::empty());
    }

    #[test]
    fn canonical_shape_and_labels() {
        let g = grid(&[], Orientation::SubsetRows);
        assert_eq!(g.num_rows(), 7);
        assert_eq!(g.num_columns(), 5);
        assert_eq!(g.rows[3].label, "E+Tx");
        assert_eq!(g.rows[3].key, "Emotion + Toxicity");
        assert_eq!(g.columns[2].label, "C+PS");
        assert_eq!(g.columns[2].key, "CS");

        let t = grid(&[], Orientation::DisruptionRows);
        assert_eq!(t.num_rows(), 5);
        assert_eq!(t.num_columns(), 7);
        assert_eq!(t.rows[0].key, "RAW");
    }

    #[test]
    fn full_labels() {
        let g = PivotGrid::build(
            &frame(&[]),
            &SUBSETS,
            &DISRUPTIONS,
            Orientation::SubsetRows,
            LabelStyle::Full,
        )
        .unwrap();
        assert_eq!(g.columns[3].label, "Clean + Full Shuffle");
    }

    #[test]
    fn resolve_follows_orientation() {
        let scores = [score("Toxicity", "CFS", Some(0.3))];
        let g = grid(&scores, Orientation::SubsetRows);
        assert_eq!(g.resolve(1, 3), CellKey::new("Toxicity", "CFS"));

        let t = grid(&scores, Orientation::DisruptionRows);
        assert_eq!(t.resolve(3, 1), CellKey::new("Toxicity", "CFS"));
        assert_eq!(t.resolve(99, 1), CellKey::empty());
    }

    #[test]
    fn range_spans_whole_table() {
        let g = grid(
            &[
                score("Topics", "C", Some(0.1)),
                score("Topics", "C", Some(0.9)),
                score("Emotion", "RAW", None),
            ],
            Orientation::SubsetRows,
        );
        assert_eq!(g.range, ScoreRange { min: 0.1, max: 0.9 });
        assert_eq!(
            ScoreRange::from_frame(&frame(&[score("Emotion", "RAW", None)])).unwrap(),
            ScoreRange::default()
        );
    }

    #[test]
    fn gradient_endpoints_and_midpoint() {
        assert_eq!(color_for(0.0, 0.0, 1.0), Rgb(255, 0, 0));
        assert_eq!(color_for(1.0, 0.0, 1.0), Rgb(0, 255, 0));
        assert_eq!(color_for(0.5, 0.0, 1.0), Rgb(255, 255, 0));
        assert_eq!(color_for(0.25, 0.0, 1.0), Rgb(255, 128, 0));
        assert_eq!(color_for(0.3, 0.3, 0.3), Rgb(255, 255, 0));
    }

    #[test]
    fn selection_highlight_uses_keys() {
        let scores = [score("Emotion + Topics", "SAP", Some(0.2))];
        let g = grid(&scores, Orientation::SubsetRows);
        let mut sel = Selection::init(&SUBSETS, &DISRUPTIONS);
        assert!(g.is_cell_selected(0, 0, &sel));
        assert!(sel.click_received(CellKey::new("Emotion + Topics", "SAP")));
        assert_eq!(g.position_of(&sel), Some((4, 4)));
        assert!(is_selected("Emotion + Topics", "SAP", &sel));
        assert!(!is_selected("E+Tp", "SAP", &sel));
    }

    #[test]
    fn darken_scales_channels() {
        assert_eq!(Rgb(200, 100, 0).darken(0.5), Rgb(100, 50, 0));
    }
}
