// ============================================================
// Layer 3 — Vocabulary
// ============================================================
// Maps word tokens to dense integer ids for the embedding layer.
//
// Id layout for a vocabulary of n tokens:
//
//   0        → [PAD]  fills sequences up to the target length
//   1 ..= n  → one id per distinct token, in sorted token order
//   n + 1    → [UNK]  any token not seen while building
//
// The embedding table therefore has n + 2 rows.
//
// Ids follow sorted token order rather than hash-set iteration
// order, so two builds over the same corpus always agree and a
// cached encoding stays valid for the vocabulary it was built
// with. The fingerprint (SHA-256 over the id-ordered tokens)
// lets the cache check that pairing.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};

/// Padding id — "no token here".
pub const PAD_ID: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    token_to_id: BTreeMap<String, u32>,
}

/// Result of scanning a corpus: the vocabulary plus the longest
/// sentence in tokens, which becomes the padding target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusVocab {
    pub vocab:       Vocabulary,
    pub max_seq_len: usize,
}

impl Vocabulary {
    /// Build from already-tokenised sentences.
    ///
    /// Every sentence counts towards `max_seq_len`, including ones
    /// that contribute no new tokens.
    pub fn build<I, S>(tokenised: I) -> CorpusVocab
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[String]>,
    {
        let mut unique      = BTreeSet::new();
        let mut max_seq_len = 0usize;

        for sentence in tokenised {
            let tokens = sentence.as_ref();
            max_seq_len = max_seq_len.max(tokens.len());
            for tok in tokens {
                if !unique.contains(tok.as_str()) {
                    unique.insert(tok.clone());
                }
            }
        }

        // BTreeSet iterates in sorted order → ids are stable run to run
        let token_to_id = unique
            .into_iter()
            .zip(1u32..)
            .collect();

        CorpusVocab { vocab: Self { token_to_id }, max_seq_len }
    }

    /// Rebuild from a stored token → id map.
    ///
    /// Rejects maps whose ids are not exactly `1..=n`, since the
    /// embedding table and the unknown id both depend on that.
    pub fn from_map(token_to_id: BTreeMap<String, u32>) -> Result<Self> {
        let n = token_to_id.len() as u32;
        let mut seen = vec![false; token_to_id.len() + 1];
        for (tok, &id) in &token_to_id {
            if id == PAD_ID || id > n {
                bail!("token '{tok}' has id {id}, expected 1..={n}");
            }
            if seen[id as usize] {
                bail!("id {id} is assigned to more than one token");
            }
            seen[id as usize] = true;
        }
        Ok(Self { token_to_id })
    }

    pub fn as_map(&self) -> &BTreeMap<String, u32> {
        &self.token_to_id
    }

    /// Number of real tokens (excludes [PAD] and [UNK]).
    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }

    /// Id reserved for out-of-vocabulary tokens.
    pub fn unk_id(&self) -> u32 {
        self.token_to_id.len() as u32 + 1
    }

    /// Rows needed in an embedding table indexed by these ids.
    pub fn table_rows(&self) -> usize {
        self.token_to_id.len() + 2
    }

    pub fn id(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Id for `token`, falling back to the unknown id.
    pub fn id_or_unk(&self, token: &str) -> u32 {
        self.id(token).unwrap_or_else(|| self.unk_id())
    }

    /// Iterate (id, token) pairs in ascending id order.
    pub fn by_id(&self) -> impl Iterator<Item = (u32, &str)> {
        let mut pairs: Vec<(u32, &str)> = self
            .token_to_id
            .iter()
            .map(|(t, &id)| (id, t.as_str()))
            .collect();
        pairs.sort_unstable_by_key(|&(id, _)| id);
        pairs.into_iter()
    }

    /// Encode tokens to exactly `pad_to` ids: truncate long input,
    /// right-pad short input with [PAD].
    pub fn encode(&self, tokens: &[String], pad_to: usize) -> Vec<u32> {
        let mut ids: Vec<u32> = tokens
            .iter()
            .take(pad_to)
            .map(|t| self.id_or_unk(t))
            .collect();
        ids.resize(pad_to, PAD_ID);
        ids
    }

    /// Hex SHA-256 over the tokens in id order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (id, tok) in self.by_id() {
            hasher.update(id.to_le_bytes());
            hasher.update(tok.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn corpus() -> Vec<Vec<String>> {
        vec![toks("the film is good"), toks("a bad film"), toks("")]
    }

    #[test]
    fn test_max_seq_len_is_longest_sentence() {
        let built = Vocabulary::build(corpus());
        assert_eq!(built.max_seq_len, 4);
    }

    #[test]
    fn test_ids_are_dense_and_sorted() {
        let built = Vocabulary::build(corpus());
        let v     = built.vocab;
        assert_eq!(v.len(), 6);
        // a < bad < film < good < is < the
        assert_eq!(v.id("a"), Some(1));
        assert_eq!(v.id("the"), Some(6));
        assert_eq!(v.unk_id(), 7);
        assert_eq!(v.table_rows(), 8);
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = Vocabulary::build(corpus());
        let b = Vocabulary::build(corpus().into_iter().rev());
        assert_eq!(a, b);
        assert_eq!(a.vocab.fingerprint(), b.vocab.fingerprint());
    }

    #[test]
    fn test_encode_pads_with_zero() {
        let v   = Vocabulary::build(corpus()).vocab;
        let ids = v.encode(&toks("a film"), 5);
        assert_eq!(ids.len(), 5);
        assert_eq!(&ids[2..], &[PAD_ID, PAD_ID, PAD_ID]);
    }

    #[test]
    fn test_encode_truncates_to_prefix() {
        let v    = Vocabulary::build(corpus()).vocab;
        let full = v.encode(&toks("the film is good"), 4);
        let cut  = v.encode(&toks("the film is good"), 2);
        assert_eq!(cut, full[..2].to_vec());
    }

    #[test]
    fn test_encode_is_idempotent() {
        let v = Vocabulary::build(corpus()).vocab;
        let s = toks("a good film");
        assert_eq!(v.encode(&s, 6), v.encode(&s, 6));
    }

    #[test]
    fn test_unknown_token_maps_to_unk_not_pad() {
        let v   = Vocabulary::build(corpus()).vocab;
        let ids = v.encode(&toks("a superb film"), 3);
        assert_eq!(ids[1], v.unk_id());
        assert_ne!(ids[1], PAD_ID);
    }

    #[test]
    fn test_from_map_rejects_gaps() {
        let mut m = BTreeMap::new();
        m.insert("x".to_string(), 1);
        m.insert("y".to_string(), 3);
        assert!(Vocabulary::from_map(m).is_err());
    }

    #[test]
    fn test_from_map_accepts_built_vocab() {
        let v = Vocabulary::build(corpus()).vocab;
        let restored = Vocabulary::from_map(v.as_map().clone()).unwrap();
        assert_eq!(restored, v);
    }

    #[test]
    fn test_fingerprint_changes_with_ids() {
        let a = Vocabulary::build(vec![toks("x y")]).vocab;
        let b = Vocabulary::build(vec![toks("x z")]).vocab;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
