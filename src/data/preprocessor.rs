// ============================================================
// Layer 4 — Word Tokenizer
// ============================================================
// Splits a sentence into word-level tokens, Penn-Treebank style:
//
//   1. Split on whitespace
//   2. Peel opening brackets / quotes off the front of each word
//   3. Peel closing punctuation off the back ("..." stays whole)
//   4. Split English clitics into their own token
//        "doesn't" → "does" "n't"
//        "it's"    → "it"   "'s"
//
// Case is preserved. SST-2 text is already mostly tokenised
// ("it 's a charming journey"), so for that corpus this mostly
// reduces to a whitespace split, and a bare "'s" or "n't" is
// left alone.

use crate::domain::traits::Tokenize;

const OPENING:  &[char] = &['(', '[', '{', '<', '"', '`'];
const CLOSING:  &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '>', '"'];
const CLITICS:  &[&str] = &["n't", "'s", "'re", "'ve", "'ll", "'d", "'m"];

#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenize for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for word in text.split_whitespace() {
            split_word(word, &mut out);
        }
        out
    }
}

fn split_word(word: &str, out: &mut Vec<String>) {
    // ── Leading punctuation ──────────────────────────────────────────────────
    let mut core = word;
    while let Some(c) = core.chars().next() {
        if !OPENING.contains(&c) {
            break;
        }
        out.push(c.to_string());
        core = &core[c.len_utf8()..];
    }

    // ── Trailing punctuation (collected back-to-front) ────────────────────────
    let mut trailing: Vec<String> = Vec::new();
    loop {
        if core.ends_with("...") && core.len() > 3 {
            trailing.push("...".to_string());
            core = &core[..core.len() - 3];
            continue;
        }
        match core.chars().last() {
            Some(c) if CLOSING.contains(&c) && core.len() > c.len_utf8() => {
                trailing.push(c.to_string());
                core = &core[..core.len() - c.len_utf8()];
            }
            _ => break,
        }
    }

    // ── Clitics ──────────────────────────────────────────────────────────────
    if !core.is_empty() {
        match clitic_split(core) {
            Some((stem, clitic)) => {
                out.push(stem.to_string());
                out.push(clitic.to_string());
            }
            None => out.push(core.to_string()),
        }
    }

    out.extend(trailing.into_iter().rev());
}

fn clitic_split(core: &str) -> Option<(&str, &str)> {
    CLITICS.iter().find_map(|clitic| {
        let at = core.len().checked_sub(clitic.len())?;
        if at > 0 && core.is_char_boundary(at) && core[at..].eq_ignore_ascii_case(clitic) {
            Some((&core[..at], &core[at..]))
        } else {
            None
        }
    })
}
