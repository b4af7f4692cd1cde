//! Dense trial-result storage.

/// Trials × entities point-value table, row-major. The only large structure
/// a run keeps; write-once during the Running phase, immutable afterwards.
#[derive(Debug, Clone)]
pub struct TrialMatrix {
    n_trials: usize,
    n_entities: usize,
    values: Vec<f64>,
}

impl TrialMatrix {
    pub(crate) fn from_rows(rows: Vec<Vec<f64>>, n_entities: usize) -> Self {
        let n_trials = rows.len();
        let mut values = Vec::with_capacity(n_trials * n_entities);
        for row in rows {
            debug_assert_eq!(row.len(), n_entities);
            values.extend(row);
        }
        Self { n_trials, n_entities, values }
    }

    pub fn n_trials(&self) -> usize {
        self.n_trials
    }

    pub fn n_entities(&self) -> usize {
        self.n_entities
    }

    /// One trial's point values across all entities.
    pub fn row(&self, trial: usize) -> &[f64] {
        let start = trial * self.n_entities;
        &self.values[start..start + self.n_entities]
    }

    /// All trial values for one entity, in trial order.
    pub fn column(&self, entity: usize) -> Vec<f64> {
        (0..self.n_trials).map(|t| self.values[t * self.n_entities + entity]).collect()
    }

    pub fn value(&self, trial: usize, entity: usize) -> f64 {
        self.values[trial * self.n_entities + entity]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_column_addressing() {
        let matrix = TrialMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]], 2);
        assert_eq!(matrix.n_trials(), 2);
        assert_eq!(matrix.n_entities(), 2);
        assert_eq!(matrix.row(1), &[3.0, 4.0]);
        assert_eq!(matrix.column(0), vec![1.0, 3.0]);
        assert_eq!(matrix.value(1, 0), 3.0);
    }
}
