// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the
// other layers:
//
//   checkpoint.rs  — Saving and loading model weights
//                    Uses Burn's named MessagePack recorder to
//                    store the best model so far. Also saves the run
//                    configuration as JSON so evaluation can
//                    rebuild the same architecture.
//
//   prep_cache.rs  — Preprocessing cache
//                    Stores the vocabulary, the padding length
//                    and the encoded splits so later runs skip
//                    tokenisation. Stale or corrupt files are
//                    recomputed.
//
//   metrics.rs     — Training metrics
//                    Per-epoch CSV log plus the confusion matrix
//                    printed after evaluation.
//
//   forecast.rs    — Chirp forecast dump
//                    Writes the real signal next to the train and
//                    test predictions for plotting elsewhere.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary and encoded-split cache
pub mod prep_cache;

/// Epoch metrics CSV and confusion matrix
pub mod metrics;

/// Chirp prediction CSV
pub mod forecast;
