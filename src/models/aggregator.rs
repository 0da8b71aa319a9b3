//! Vote aggregation for tree ensembles

/// Accumulates per-tree class distributions into a single averaged distribution.
pub struct VoteAggregator {
    /// Running weighted sum per class
    sums: Vec<f64>,
    /// Sum of weights added so far
    total_weight: f64,
}

impl VoteAggregator {
    /// Create an aggregator for `n_classes` classes.
    pub fn new(n_classes: usize) -> Self {
        Self {
            sums: vec![0.0; n_classes],
            total_weight: 0.0,
        }
    }

    /// Add one tree's leaf values with weight 1.
    pub fn add(&mut self, leaf_values: &[f64]) {
        self.add_weighted(leaf_values, 1.0);
    }

    /// Add one tree's leaf values.
    ///
    /// Leaf values are raw class weights (sample counts or fractions); they are
    /// normalized to sum to 1 before being averaged in.
    pub fn add_weighted(&mut self, leaf_values: &[f64], weight: f64) {
        let total: f64 = leaf_values.iter().sum();
        if total <= 0.0 || weight <= 0.0 {
            return;
        }

        for (sum, value) in self.sums.iter_mut().zip(leaf_values) {
            *sum += weight * value / total;
        }
        self.total_weight += weight;
    }

    /// Averaged class distribution.
    ///
    /// Uniform when nothing has been added.
    pub fn distribution(&self) -> Vec<f64> {
        if self.sums.is_empty() {
            return Vec::new();
        }

        if self.total_weight > 0.0 {
            self.sums.iter().map(|s| s / self.total_weight).collect()
        } else {
            let uniform = 1.0 / self.sums.len() as f64;
            vec![uniform; self.sums.len()]
        }
    }

    /// Index of the highest value; ties resolve to the lowest index.
    pub fn argmax(values: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in values.iter().enumerate() {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| i)
    }
}
