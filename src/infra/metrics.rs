// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two things live here:
//
//   MetricsLogger   — appends one CSV row per epoch so learning
//                     curves can be plotted after the run
//   ConfusionMatrix — counts (true label, predicted label) pairs
//                     for the final evaluation printout
//
// Example CSV output (sentiment; chirp leaves the accuracy
// columns empty):
//   epoch,train_loss,val_loss,train_acc,val_acc
//   1,0.512300,0.468100,78.120000,79.010000
//   2,0.401900,0.451700,82.410000,80.280000

use anyhow::{Context, Result};
use std::{
    fmt,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch:      usize,
    /// Mean batch loss over the epoch
    pub train_loss: f64,
    pub val_loss:   f64,
    /// Accuracy in percent, when the task is a classification
    pub train_acc:  Option<f64>,
    pub val_acc:    Option<f64>,
}

impl EpochMetrics {
    pub fn regression(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss, train_acc: None, val_acc: None }
    }

    pub fn classification(
        epoch:      usize,
        train_loss: f64,
        train_acc:  f64,
        val_loss:   f64,
        val_acc:    f64,
    ) -> Self {
        Self { epoch, train_loss, val_loss, train_acc: Some(train_acc), val_acc: Some(val_acc) }
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Start a fresh `<dir>/<file_name>`, replacing any previous run's log.
    pub fn create(dir: &Path, file_name: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join(file_name);

        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,val_loss,train_acc,val_acc")?;

        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
        writeln!(
            f,
            "{},{:.6},{:.6},{},{}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            opt(m.train_acc),
            opt(m.val_acc),
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

/// Percentage of positions where `predicted == actual`.
pub fn accuracy_percent(predicted: &[usize], actual: &[usize]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    100.0 * correct as f64 / actual.len() as f64
}

// ─── Confusion Matrix ─────────────────────────────────────────────────────────
/// Rows are true labels, columns are predicted labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self { counts: vec![vec![0; num_classes]; num_classes] }
    }

    /// Labels at or beyond `num_classes` are ignored.
    pub fn from_labels(num_classes: usize, actual: &[usize], predicted: &[usize]) -> Self {
        let mut m = Self::new(num_classes);
        for (&a, &p) in actual.iter().zip(predicted) {
            m.add(a, p);
        }
        m
    }

    pub fn add(&mut self, actual: usize, predicted: usize) {
        if let Some(cell) = self.counts.get_mut(actual).and_then(|r| r.get_mut(predicted)) {
            *cell += 1;
        }
    }

    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual][predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Correct predictions (the diagonal).
    pub fn trace(&self) -> usize {
        (0..self.counts.len()).map(|i| self.get(i, i)).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);
        for (i, row) in self.counts.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|c| format!("{c:>width$}")).collect();
            let open  = if i == 0 { "[[" } else { " [" };
            let close = if i + 1 == self.counts.len() { "]]" } else { "]" };
            writeln!(f, "{open}{}{close}", cells.join(" "))?;
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_counts() {
        let actual    = [0, 0, 1, 1, 1];
        let predicted = [0, 1, 1, 1, 0];
        let m = ConfusionMatrix::from_labels(2, &actual, &predicted);
        assert_eq!(m.get(0, 0), 1);
        assert_eq!(m.get(0, 1), 1);
        assert_eq!(m.get(1, 0), 1);
        assert_eq!(m.get(1, 1), 2);
        assert_eq!(m.total(), 5);
        assert_eq!(m.trace(), 3);
    }

    #[test]
    fn test_trace_matches_accuracy() {
        let actual    = [1, 0, 1, 0];
        let predicted = [1, 1, 1, 0];
        let m   = ConfusionMatrix::from_labels(2, &actual, &predicted);
        let acc = accuracy_percent(&predicted, &actual);
        assert!((acc - 100.0 * m.trace() as f64 / m.total() as f64).abs() < 1e-12);
    }

    #[test]
    fn test_display_layout() {
        let m = ConfusionMatrix::from_labels(2, &[0, 1, 1], &[0, 1, 0]);
        assert_eq!(m.to_string(), "[[1 0]\n [1 1]]\n");
    }

    #[test]
    fn test_logger_writes_header_and_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::create(dir.path(), "m.csv").unwrap();
        logger.log(&EpochMetrics::regression(1, 0.5, 0.25)).unwrap();
        logger.log(&EpochMetrics::classification(2, 0.4, 80.0, 0.3, 75.5)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,val_loss,train_acc,val_acc");
        assert_eq!(lines[1], "1,0.500000,0.250000,,");
        assert_eq!(lines[2], "2,0.400000,0.300000,80.000000,75.500000");
    }
}
