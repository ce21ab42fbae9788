// ============================================================
// Layer 6 — Preprocessing Cache
// ============================================================
// Tokenising SST-2 and encoding 67k sentences is the slow part
// of a run, so the results are kept on disk and reused:
//
//   example_prep_data/
//     vocab_dict.json            ← token → id map
//     max_sequence_length.json   ← padding target, one number
//     prep_train_len52.json      ← encoded train split
//     prep_dev_len52.json        ← encoded dev split
//
// Encoded splits are keyed by sequence length in the file name
// AND carry the fingerprint of the vocabulary they were encoded
// with. A file built for another vocabulary is rejected even if
// the length matches.
//
// Any cache file that is missing, unreadable or malformed counts
// as a miss: the value is recomputed and the file rewritten.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::domain::vocab::{CorpusVocab, Vocabulary};

const VOCAB_FILE:   &str = "vocab_dict.json";
const MAX_LEN_FILE: &str = "max_sequence_length.json";

#[derive(Debug, Serialize, Deserialize)]
struct EncodedSplit {
    vocab_fingerprint: String,
    seq_len:           usize,
    sequences:         Vec<Vec<u32>>,
}

pub struct PrepCache {
    dir: PathBuf,
}

impl PrepCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn encoded_path(&self, split: &str, seq_len: usize) -> PathBuf {
        self.dir.join(format!("prep_{split}_len{seq_len}.json"))
    }

    // ─── Vocabulary ───────────────────────────────────────────────────────────

    /// Load the cached vocabulary, or build and store a new one.
    pub fn load_or_build_vocab<F>(&self, build: F) -> Result<CorpusVocab>
    where
        F: FnOnce() -> CorpusVocab,
    {
        if let Some(cached) = self.load_vocab() {
            tracing::info!(
                "Loaded cached vocabulary ({} tokens, max length {})",
                cached.vocab.len(),
                cached.max_seq_len
            );
            return Ok(cached);
        }

        tracing::info!("Tokenizing all the examples to get a vocab dict and the maximum sequence length...");
        let built = build();
        self.save_vocab(&built)?;
        Ok(built)
    }

    pub fn load_vocab(&self) -> Option<CorpusVocab> {
        let map: BTreeMap<String, u32> = read_json(&self.dir.join(VOCAB_FILE))?;
        let max_seq_len: usize         = read_json(&self.dir.join(MAX_LEN_FILE))?;

        match Vocabulary::from_map(map) {
            Ok(vocab) => Some(CorpusVocab { vocab, max_seq_len }),
            Err(e) => {
                tracing::warn!("Ignoring cached vocabulary: {e}");
                None
            }
        }
    }

    pub fn save_vocab(&self, built: &CorpusVocab) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create cache dir '{}'", self.dir.display()))?;
        write_json(&self.dir.join(VOCAB_FILE), built.vocab.as_map())?;
        write_json(&self.dir.join(MAX_LEN_FILE), &built.max_seq_len)?;
        Ok(())
    }

    // ─── Encoded splits ───────────────────────────────────────────────────────

    /// Load a cached encoding of `split`, or encode and store it.
    ///
    /// `expected_rows` guards against a cache written for a
    /// different version of the split file.
    pub fn load_or_encode<F>(
        &self,
        split:         &str,
        seq_len:       usize,
        vocab:         &Vocabulary,
        expected_rows: usize,
        encode:        F,
    ) -> Result<Vec<Vec<u32>>>
    where
        F: FnOnce() -> Vec<Vec<u32>>,
    {
        let fingerprint = vocab.fingerprint();
        if let Some(cached) = self.load_encoded(split, seq_len, &fingerprint, expected_rows) {
            tracing::info!("Loaded cached '{}' encoding ({} rows)", split, cached.len());
            return Ok(cached);
        }

        tracing::info!("Converting '{}' sentences to sequences of token ids...", split);
        let sequences = encode();
        self.save_encoded(split, seq_len, &fingerprint, &sequences)?;
        Ok(sequences)
    }

    pub fn load_encoded(
        &self,
        split:         &str,
        seq_len:       usize,
        fingerprint:   &str,
        expected_rows: usize,
    ) -> Option<Vec<Vec<u32>>> {
        let path = self.encoded_path(split, seq_len);
        let cached: EncodedSplit = read_json(&path)?;

        if cached.vocab_fingerprint != fingerprint {
            tracing::warn!("'{}' was encoded with a different vocabulary; re-encoding", path.display());
            return None;
        }
        if cached.seq_len != seq_len
            || cached.sequences.len() != expected_rows
            || cached.sequences.iter().any(|s| s.len() != seq_len)
        {
            tracing::warn!("'{}' has unexpected shape; re-encoding", path.display());
            return None;
        }
        Some(cached.sequences)
    }

    pub fn save_encoded(
        &self,
        split:       &str,
        seq_len:     usize,
        fingerprint: &str,
        sequences:   &[Vec<u32>],
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create cache dir '{}'", self.dir.display()))?;
        let record = EncodedSplit {
            vocab_fingerprint: fingerprint.to_string(),
            seq_len,
            sequences: sequences.to_vec(),
        };
        write_json(&self.encoded_path(split, seq_len), &record)
    }
}

/// `None` on any failure — a cache miss, never an error.
fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("Cache miss '{}': {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Ignoring malformed cache file '{}': {}", path.display(), e);
            None
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))
}
