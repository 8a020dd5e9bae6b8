use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A column of [`ExtractedSeries`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Timestamp,
    Position,
    #[default]
    Velocity,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Timestamp, Column::Position, Column::Velocity];

    pub fn name(self) -> &'static str {
        match self {
            Column::Timestamp => "timestamp",
            Column::Position => "position",
            Column::Velocity => "velocity",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown column {s:?} (expected timestamp, position or velocity)"))
    }
}

/// Time series of one joint extracted from a bag.
///
/// The three columns are aligned by index and always have the same length.
/// `timestamp` is in seconds relative to the first extracted record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedSeries {
    timestamp: Vec<f64>,
    position: Vec<f64>,
    velocity: Vec<f64>,
}

impl ExtractedSeries {
    pub(crate) fn push(&mut self, timestamp: f64, position: f64, velocity: f64) {
        self.timestamp.push(timestamp);
        self.position.push(position);
        self.velocity.push(velocity);
    }

    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    pub fn timestamp(&self) -> &[f64] {
        &self.timestamp
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn column(&self, column: Column) -> &[f64] {
        match column {
            Column::Timestamp => &self.timestamp,
            Column::Position => &self.position,
            Column::Velocity => &self.velocity,
        }
    }

    /// Returns `(timestamp, position, velocity)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.timestamp
            .iter()
            .zip(&self.position)
            .zip(&self.velocity)
            .map(|((&t, &p), &v)| (t, p, v))
    }

    /// Returns `[timestamp, value]` pairs of `column`, ready to be plotted.
    pub fn points(&self, column: Column) -> Vec<[f64; 2]> {
        self.timestamp
            .iter()
            .zip(self.column(column))
            .map(|(&t, &y)| [t, y])
            .collect()
    }

    /// Returns the elapsed time between the first and the last row in seconds.
    pub fn duration(&self) -> f64 {
        match (self.timestamp.first(), self.timestamp.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> ExtractedSeries {
        let mut series = ExtractedSeries::default();
        series.push(0.0, 0.1, 1.0);
        series.push(1.5, 0.2, 2.0);
        series
    }

    #[test]
    fn test_columns() {
        let series = series();
        assert_eq!(series.len(), 2);
        assert!(!series.is_empty());
        assert_eq!(series.column(Column::Timestamp), &[0.0, 1.5]);
        assert_eq!(series.column(Column::Position), series.position());
        assert_eq!(series.column(Column::Velocity), &[1.0, 2.0]);
        assert_eq!(series.duration(), 1.5);
    }

    #[test]
    fn test_rows_and_points() {
        let series = series();
        let rows: Vec<_> = series.rows().collect();
        assert_eq!(rows, vec![(0.0, 0.1, 1.0), (1.5, 0.2, 2.0)]);
        assert_eq!(series.points(Column::Velocity), vec![[0.0, 1.0], [1.5, 2.0]]);
    }

    #[test]
    fn test_empty() {
        let series = ExtractedSeries::default();
        assert!(series.is_empty());
        assert_eq!(series.rows().count(), 0);
        assert!(series.points(Column::Position).is_empty());
        assert_eq!(series.duration(), 0.0);
    }

    #[test]
    fn test_column_names() {
        let names: Vec<_> = Column::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["timestamp", "position", "velocity"]);
        assert_eq!(Column::default(), Column::Velocity);
        assert_eq!("Position".parse::<Column>().unwrap(), Column::Position);
        assert!("effort".parse::<Column>().is_err());
    }
}
