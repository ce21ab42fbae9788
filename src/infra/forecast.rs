// Writes one row per time step:
//
//   time,signal,train_prediction,test_prediction
//   0.012002,0.999716,,
//   ...
//
// Prediction cells are empty where no window ends at that step.

use anyhow::{bail, Context, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Predictions keyed by the index of the time step they forecast.
pub type IndexedPredictions = Vec<(usize, f32)>;

pub fn write_forecast_csv(
    path:       &Path,
    times:      &[f64],
    signal:     &[f32],
    train_pred: &IndexedPredictions,
    test_pred:  &IndexedPredictions,
) -> Result<()> {
    if times.len() != signal.len() {
        bail!("{} time steps but {} signal values", times.len(), signal.len());
    }

    let mut train_col = vec![None; times.len()];
    let mut test_col  = vec![None; times.len()];
    for (col, preds) in [(&mut train_col, train_pred), (&mut test_col, test_pred)] {
        for &(idx, value) in preds {
            match col.get_mut(idx) {
                Some(cell) => *cell = Some(value),
                None => bail!("prediction for step {idx} is past the end of the signal"),
            }
        }
    }

    let file = File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "time,signal,train_prediction,test_prediction")?;

    let cell = |v: Option<f32>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
    for i in 0..times.len() {
        writeln!(
            w,
            "{:.6},{:.6},{},{}",
            times[i], signal[i], cell(train_col[i]), cell(test_col[i])
        )?;
    }
    w.flush()?;

    tracing::info!("Wrote forecast to '{}'", path.display());
    Ok(())
}
