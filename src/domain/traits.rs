// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The application layer talks to data sources through these
// traits, so a TSV file, an in-memory fixture or any other
// source can feed the same pipeline.

use anyhow::Result;

use crate::domain::sentence::LabelledSentence;

// ─── SentenceSource ───────────────────────────────────────────────────────────
/// Anything that can produce a labelled sentence split.
///
/// Implementations:
///   - TsvLoader → SST-2 style `sentence<TAB>label` files
pub trait SentenceSource {
    fn load_all(&self) -> Result<Vec<LabelledSentence>>;
}

// ─── Tokenize ─────────────────────────────────────────────────────────────────
/// Splits raw text into word tokens.
///
/// The vocabulary, the cache and the encoder must all use the
/// same implementation, otherwise ids drift between runs.
pub trait Tokenize {
    fn tokenize(&self, text: &str) -> Vec<String>;
}
