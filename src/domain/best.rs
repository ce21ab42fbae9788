// ============================================================
// Layer 3 — Best Checkpoint Rule
// ============================================================
// Decides, epoch by epoch, whether the current model should
// replace the stored checkpoint.
//
// A new score only wins when it is STRICTLY greater than the
// best so far. Ties keep the earlier epoch, so the stored
// checkpoint is always the first epoch that reached the
// running maximum.

/// Running best validation score and the epoch that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BestTracker {
    best: Option<(usize, f64)>,
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `score` for `epoch`; returns true if it is a new best.
    ///
    /// The first observed score always wins. NaN never wins.
    pub fn observe(&mut self, epoch: usize, score: f64) -> bool {
        let improved = match self.best {
            None          => !score.is_nan(),
            Some((_, b))  => score > b,
        };
        if improved {
            self.best = Some((epoch, score));
        }
        improved
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best.map(|(_, s)| s)
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best.map(|(e, _)| e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_score_is_best() {
        let mut t = BestTracker::new();
        assert!(t.observe(1, 0.0));
        assert_eq!(t.best_epoch(), Some(1));
    }

    #[test]
    fn test_ties_keep_earlier_epoch() {
        let mut t = BestTracker::new();
        t.observe(1, 70.0);
        assert!(!t.observe(2, 70.0));
        assert_eq!(t.best_epoch(), Some(1));
    }

    #[test]
    fn test_saved_epoch_tracks_running_maximum() {
        let accs = [61.0, 64.5, 63.0, 64.5, 66.0, 65.9];
        let mut t     = BestTracker::new();
        let mut saved = Vec::new();
        for (i, &a) in accs.iter().enumerate() {
            if t.observe(i + 1, a) {
                saved.push(i + 1);
            }
            // After every epoch the stored epoch holds the max so far
            let max_so_far = accs[..=i].iter().cloned().fold(f64::MIN, f64::max);
            assert_eq!(t.best_score(), Some(max_so_far));
        }
        assert_eq!(saved, vec![1, 2, 5]);
        assert_eq!(t.best_epoch(), Some(5));
    }

    #[test]
    fn test_nan_never_wins() {
        let mut t = BestTracker::new();
        assert!(!t.observe(1, f64::NAN));
        assert!(t.observe(2, 50.0));
        assert!(!t.observe(3, f64::NAN));
    }
}
