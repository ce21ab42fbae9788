// ============================================================
// Layer 4 — Ordered Train/Test Splitter
// ============================================================
// Splits a sequence at a fraction of its length WITHOUT
// shuffling. Time series must keep their order (the test part
// is the future of the training part), and the sentiment splits
// come pre-divided, so nothing here is random.
//
//   split_at_fraction([a b c d], 0.75) → ([a b c], [d])
//
// The split index is floor(len · fraction), clamped to len.

pub fn split_at_fraction<T>(mut items: Vec<T>, fraction: f64) -> (Vec<T>, Vec<T>) {
    let total    = items.len();
    let split_at = ((total as f64) * fraction.clamp(0.0, 1.0)).floor() as usize;
    let split_at = split_at.min(total);

    let rest = items.split_off(split_at);

    tracing::debug!("Ordered split: {} / {}", items.len(), rest.len());
    (items, rest)
}
