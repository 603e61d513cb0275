//! Prepare scatter data for the selected condition: filter rows, split by show,
//! and carry tooltip fields along with each point.

use color_eyre::Result;
use polars::prelude::*;

use crate::loader::{ScoreTable, SHOW_LABEL, UMAP1, UMAP2};
use crate::selection::CellKey;

/// One drawable point.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub show: String,
    /// (column, value) pairs shown when the point is hovered.
    pub tooltip: Vec<(String, String)>,
}

/// Points of one show, drawn in one color.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotGroup {
    pub show: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PlotBounds {
    /// Widen by `fraction` of the span on each side; a zero span gets a unit window.
    pub fn padded(self, fraction: f64) -> Self {
        let pad = |lo: f64, hi: f64| {
            let span = hi - lo;
            if span <= 0.0 {
                (lo - 0.5, hi + 0.5)
            } else {
                (lo - span * fraction, hi + span * fraction)
            }
        };
        let (x_min, x_max) = pad(self.x_min, self.x_max);
        let (y_min, y_max) = pad(self.y_min, self.y_max);
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

/// Scatter content for one selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotData {
    pub key: CellKey,
    pub points: Vec<PlotPoint>,
    /// Groups in first-seen show order.
    pub groups: Vec<PlotGroup>,
    row_count: usize,
}

impl PlotData {
    pub fn from_table(table: &ScoreTable, key: &CellKey) -> Result<Self> {
        let df = table.rows_matching(key)?;
        Self::from_frame(&df, key.clone(), &table.tooltip_columns())
    }

    /// Build from rows already filtered to `key`.
    pub fn from_frame(df: &DataFrame, key: CellKey, tooltip_columns: &[&str]) -> Result<Self> {
        let row_count = df.height();
        if row_count == 0 {
            return Ok(Self {
                key,
                ..Self::default()
            });
        }

        let mut exprs = vec![
            col(UMAP1).cast(DataType::Float64),
            col(UMAP2).cast(DataType::Float64),
            col(SHOW_LABEL).cast(DataType::String),
        ];
        for name in tooltip_columns {
            exprs.push(col(*name).cast(DataType::String));
        }
        let selected = df.clone().lazy().select(exprs).collect()?;

        let xs = selected.column(UMAP1)?.f64()?;
        let ys = selected.column(UMAP2)?.f64()?;
        let shows = selected.column(SHOW_LABEL)?.str()?;
        let tooltip_values = tooltip_columns
            .iter()
            .map(|name| selected.column(name).and_then(|c| c.str()))
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut points = Vec::with_capacity(row_count);

        for i in 0..row_count {
            let (Some(x), Some(y)) = (xs.get(i), ys.get(i)) else {
                continue;
            };
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            let show = shows.get(i).unwrap_or_default().to_string();

            let mut tooltip: Vec<(String, String)> = tooltip_columns
                .iter()
                .zip(&tooltip_values)
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        values.get(i).unwrap_or_default().to_string(),
                    )
                })
                .collect();
            tooltip.push((UMAP1.to_string(), format!("{:.3}", x)));
            tooltip.push((UMAP2.to_string(), format!("{:.3}", y)));

            points.push(PlotPoint {
                x,
                y,
                show,
                tooltip,
            });
        }

        let mut data = Self::from_points(key, points);
        data.row_count = row_count;
        Ok(data)
    }

    /// Group `points` by show. Every point counts as one matching row.
    pub fn from_points(key: CellKey, points: Vec<PlotPoint>) -> Self {
        let mut groups: Vec<PlotGroup> = Vec::new();
        for p in &points {
            match groups.iter_mut().find(|g| g.show == p.show) {
                Some(group) => group.points.push((p.x, p.y)),
                None => groups.push(PlotGroup {
                    show: p.show.clone(),
                    points: vec![(p.x, p.y)],
                }),
            }
        }
        Self {
            key,
            row_count: points.len(),
            points,
            groups,
        }
    }

    /// Number of source rows matching the selection (drawn or not).
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<PlotBounds> {
        let first = self.points.first()?;
        let init = PlotBounds {
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
        };
        Some(self.points.iter().fold(init, |b, p| PlotBounds {
            x_min: b.x_min.min(p.x),
            x_max: b.x_max.max(p.x),
            y_min: b.y_min.min(p.y),
            y_max: b.y_max.max(p.y),
        }))
    }

    /// Index of the point closest to (x, y). `x_scale`/`y_scale` convert data
    /// units to screen units so distances are measured as the user sees them.
    pub fn nearest(&self, x: f64, y: f64, x_scale: f64, y_scale: f64) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let dx = (p.x - x) * x_scale;
                let dy = (p.y - y) * y_scale;
                (i, dx * dx + dy * dy)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{DISRUPTION, EPISODE, SEASON, SIL_SCORE, SUBSET};

    fn frame() -> DataFrame {
        df!(
            UMAP1 => &[1.0_f64, 2.0, 3.0, 4.0],
            UMAP2 => &[Some(10.0_f64), Some(20.0), None, Some(40.0)],
            SHOW_LABEL => &["South Park", "The Office", "South Park", "South Park"],
            SIL_SCORE => &[0.5_f64, 0.5, 0.5, 0.5],
            SUBSET => &["Emotion", "Emotion", "Emotion", "Emotion"],
            DISRUPTION => &["RAW", "RAW", "RAW", "RAW"],
            SEASON => &["1", "2", "3", "4"],
            EPISODE => &["5", "6", "7", "8"]
        )
        .unwrap()
    }

    #[test]
    fn groups_by_show_in_first_seen_order() {
        let data = PlotData::from_frame(
            &frame(),
            CellKey::new("Emotion", "RAW"),
            &[SEASON, EPISODE, SIL_SCORE, SUBSET, DISRUPTION],
        )
        .unwrap();
        assert_eq!(data.row_count(), 4);
        assert_eq!(data.points.len(), 3);
        assert_eq!(data.groups.len(), 2);
        assert_eq!(data.groups[0].show, "South Park");
        assert_eq!(data.groups[0].points, vec![(1.0, 10.0), (4.0, 40.0)]);
        assert_eq!(data.groups[1].show, "The Office");
    }

    #[test]
    fn tooltip_carries_auxiliary_fields() {
        let data =
            PlotData::from_frame(&frame(), CellKey::new("Emotion", "RAW"), &[SEASON, EPISODE])
                .unwrap();
        let tooltip = &data.points[1].tooltip;
        assert_eq!(tooltip[0], ("SEASON".to_string(), "2".to_string()));
        assert_eq!(tooltip[1], ("EPISODE".to_string(), "6".to_string()));
        assert_eq!(tooltip[2], ("UMAP1".to_string(), "2.000".to_string()));
    }

    #[test]
    fn empty_frame_is_an_empty_plot() {
        let empty = frame().head(Some(0));
        let data = PlotData::from_frame(&empty, CellKey::new("Topics", "C"), &[]).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.row_count(), 0);
        assert_eq!(data.bounds(), None);
    }

    #[test]
    fn bounds_and_nearest() {
        let data = PlotData::from_frame(&frame(), CellKey::new("Emotion", "RAW"), &[]).unwrap();
        let b = data.bounds().unwrap();
        assert_eq!((b.x_min, b.x_max, b.y_min, b.y_max), (1.0, 4.0, 10.0, 40.0));
        assert_eq!(data.nearest(3.9, 39.0, 1.0, 1.0), Some(2));
        assert_eq!(data.nearest(1.1, 11.0, 1.0, 1.0), Some(0));
    }

    #[test]
    fn padded_bounds() {
        let b = PlotBounds {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 5.0,
            y_max: 5.0,
        }
        .padded(0.1);
        assert_eq!((b.x_min, b.x_max), (-1.0, 11.0));
        assert_eq!((b.y_min, b.y_max), (4.5, 5.5));
    }
}
