// ============================================================
// Layer 4 — Chirp Signal
// ============================================================
// Synthesises the time series the GRU learns to forecast: a
// linear chirp whose frequency sweeps from f0 at t = 0 to f1 at
// t = t1,
//
//   x(t) = cos(2π · (f0·t + (f1 − f0) / (2·t1) · t²))
//
// and cuts it into fixed-length windows.
//
// Windowing with seq_len = 3 over [a b c d e]:
//   window 0: a b c
//   window 1: b c d
// (len − seq_len windows; the last full window is left out so
// every window has a successor to act as its target)

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy)]
pub struct ChirpParams {
    pub f0:       f64,
    pub f1:       f64,
    pub t1:       f64,
    pub t_end:    f64,
    pub n_points: usize,
}

impl Default for ChirpParams {
    fn default() -> Self {
        Self { f0: 1.0, f1: 0.1, t1: 10.0, t_end: 10.0, n_points: 5000 }
    }
}

/// `n` evenly spaced points over `[start, end]`, both ends included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Time axis and signal values.
pub fn chirp_signal(p: &ChirpParams) -> (Vec<f64>, Vec<f32>) {
    let times  = linspace(0.0, p.t_end, p.n_points);
    let sweep  = (p.f1 - p.f0) / (2.0 * p.t1);
    let values = times
        .iter()
        .map(|&t| (2.0 * PI * (p.f0 * t + sweep * t * t)).cos() as f32)
        .collect();
    (times, values)
}

/// Every window of `seq_len` consecutive values that has a successor.
pub fn windows(series: &[f32], seq_len: usize) -> Vec<Vec<f32>> {
    if seq_len == 0 || series.len() <= seq_len {
        return Vec::new();
    }
    (0..series.len() - seq_len)
        .map(|i| series[i..i + seq_len].to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints() {
        let t = linspace(0.0, 10.0, 5);
        assert_eq!(t, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_chirp_starts_at_one() {
        let (t, x) = chirp_signal(&ChirpParams::default());
        assert_eq!(t.len(), 5000);
        assert_eq!(x.len(), 5000);
        assert!((x[0] - 1.0).abs() < 1e-6);
        assert!(x.iter().all(|v| v.abs() <= 1.0 + 1e-6));
    }

    #[test]
    fn test_window_count_and_contents() {
        let series = [0.0f32, 1.0, 2.0, 3.0, 4.0];
        let w      = windows(&series, 3);
        assert_eq!(w.len(), 2);
        assert_eq!(w[1], vec![1.0f32, 2.0, 3.0]);
    }

    #[test]
    fn test_windows_of_short_series() {
        assert!(windows(&[1.0, 2.0], 2).is_empty());
        assert!(windows(&[1.0, 2.0], 0).is_empty());
    }
}
