// ============================================================
// Layer 4 — Pretrained Word Vectors
// ============================================================
// Reads a GloVe-format text file and turns it into the initial
// weights of the embedding layer.
//
// File format, one token per line:
//
//   the 0.418 0.24968 -0.41242 ...   (embedding_dim floats)
//
// Only tokens present in the vocabulary are kept, so loading
// the 400k-line glove.6B file costs one pass and a small map.
//
// Table layout (rows = vocab.table_rows()):
//   row 0        → zeros        (padding)
//   token rows   → pretrained vector, or all-ones if absent
//   unknown row  → all-ones
//
// The table only INITIALISES the embedding; the weight stays
// trainable.

use anyhow::{bail, Context, Result};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::domain::vocab::{Vocabulary, PAD_ID};

/// Value every component of the fallback vector takes.
pub const FALLBACK_VALUE: f32 = 1.0;

/// Pretrained vectors keyed by vocabulary id.
pub type PretrainedVectors = HashMap<u32, Vec<f32>>;

/// Load vectors for the tokens of `vocab` from a GloVe text file.
///
/// A missing file is not an error: training proceeds from the
/// fallback vectors, which is what a fresh checkout without the
/// 800 MB download needs.
pub fn load_pretrained(path: &Path, vocab: &Vocabulary, dim: usize) -> Result<PretrainedVectors> {
    if !path.exists() {
        tracing::warn!(
            "Pretrained vectors '{}' not found — every token starts from the fallback vector",
            path.display()
        );
        return Ok(HashMap::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    let vectors = read_vectors(BufReader::new(file), vocab, dim)
        .with_context(|| format!("Cannot read vectors from '{}'", path.display()))?;

    tracing::info!(
        "Found pretrained vectors for {}/{} tokens ({:.1}%)",
        vectors.len(),
        vocab.len(),
        100.0 * vectors.len() as f64 / vocab.len().max(1) as f64,
    );
    Ok(vectors)
}

/// Parse vectors from any line reader.
pub fn read_vectors<R: BufRead>(reader: R, vocab: &Vocabulary, dim: usize) -> Result<PretrainedVectors> {
    let mut vectors = HashMap::new();
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(token) = parts.next() else { continue };

        // Skip the float parsing entirely for tokens we'll never look up
        let Some(id) = vocab.id(token) else { continue };

        let values: Result<Vec<f32>, _> = parts.map(str::parse::<f32>).collect();
        match values {
            Ok(v) if v.len() == dim => {
                vectors.insert(id, v);
            }
            Ok(v) => {
                skipped += 1;
                tracing::debug!("line {}: '{}' has {} values, expected {}", line_no + 1, token, v.len(), dim);
            }
            Err(e) => {
                skipped += 1;
                tracing::debug!("line {}: '{}' is not numeric: {}", line_no + 1, token, e);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} malformed vector lines", skipped);
    }
    Ok(vectors)
}

// ─── Embedding Table ──────────────────────────────────────────────────────────
/// Dense row-major `[rows, dim]` lookup table indexed by token id.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    pub rows:   usize,
    pub dim:    usize,
    pub values: Vec<f32>,
}

impl EmbeddingTable {
    pub fn build(vocab: &Vocabulary, pretrained: &PretrainedVectors, dim: usize) -> Result<Self> {
        if dim == 0 {
            bail!("embedding dimension must be positive");
        }
        let rows       = vocab.table_rows();
        let mut values = vec![FALLBACK_VALUE; rows * dim];

        for (&id, vector) in pretrained {
            let id = id as usize;
            if id == PAD_ID as usize || id >= rows || vector.len() != dim {
                continue;
            }
            values[id * dim..(id + 1) * dim].copy_from_slice(vector);
        }

        // Padding row is always zero, whatever the inputs said
        values[..dim].fill(0.0);

        Ok(Self { rows, dim, values })
    }

    #[cfg(test)]
    pub fn row(&self, id: usize) -> &[f32] {
        &self.values[id * self.dim..(id + 1) * self.dim]
    }
}
