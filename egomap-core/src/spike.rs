//! Neural event tables and frame-aligned spike trains.

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Event rows for every cell recorded in a session.
///
/// Stored as parallel columns; row order follows the source file.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventTable {
    /// Event time in seconds.
    pub time_s: Vec<f64>,
    /// Cell label exactly as recorded (e.g. `" C07"`).
    pub cell: Vec<String>,
}

impl EventTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one event.
    pub fn push(&mut self, time_s: f64, cell: impl Into<String>) {
        self.time_s.push(time_s);
        self.cell.push(cell.into());
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    /// Returns true if the table holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    /// Distinct cell labels in sorted order.
    #[must_use]
    pub fn cell_names(&self) -> Vec<String> {
        self.cell
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Event times recorded for one cell.
    #[must_use]
    pub fn timestamps_for(&self, cell: &str) -> Vec<f64> {
        self.time_s
            .iter()
            .zip(&self.cell)
            .filter(|(_, name)| name.as_str() == cell)
            .map(|(&t, _)| t)
            .collect()
    }

    /// Returns true if at least one event belongs to `cell`.
    #[must_use]
    pub fn contains_cell(&self, cell: &str) -> bool {
        self.cell.iter().any(|name| name == cell)
    }
}

/// Binary per-frame event indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpikeTrain {
    values: Vec<u8>,
}

impl SpikeTrain {
    /// All-zero train of `len` frames.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0; len],
        }
    }

    /// Builds a train from raw 0/1 values; any non-zero value becomes 1.
    #[must_use]
    pub fn from_values(values: &[u8]) -> Self {
        Self {
            values: values.iter().map(|&v| u8::from(v != 0)).collect(),
        }
    }

    /// Marks a frame as containing an event.
    ///
    /// # Panics
    /// Panics if `frame` is out of range.
    pub fn mark(&mut self, frame: usize) {
        self.values[frame] = 1;
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the train covers no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `frame` as a float weight.
    #[inline]
    #[must_use]
    pub fn weight(&self, frame: usize) -> f64 {
        f64::from(self.values[frame])
    }

    /// Raw 0/1 values.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }

    /// Number of frames marked with an event.
    #[must_use]
    pub fn spike_count(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0).count()
    }

    /// Indices of frames marked with an event.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_table_cells() {
        let mut table = EventTable::new();
        table.push(0.5, " C02");
        table.push(1.0, " C00");
        table.push(1.5, " C02");

        assert_eq!(table.len(), 3);
        assert_eq!(table.cell_names(), vec![" C00", " C02"]);
        assert_eq!(table.timestamps_for(" C02"), vec![0.5, 1.5]);
        assert!(table.contains_cell(" C00"));
        assert!(!table.contains_cell("C00"));
        assert!(table.timestamps_for(" C09").is_empty());
    }

    #[test]
    fn test_spike_train_marks() {
        let mut train = SpikeTrain::zeros(4);
        train.mark(2);
        train.mark(2);

        assert_eq!(train.as_slice(), &[0, 0, 1, 0]);
        assert_eq!(train.spike_count(), 1);
        assert_eq!(train.indices(), vec![2]);
        assert!((train.weight(2) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_spike_train_from_values_binarizes() {
        let train = SpikeTrain::from_values(&[0, 3, 1, 0]);
        assert_eq!(train.as_slice(), &[0, 1, 1, 0]);
    }
}
