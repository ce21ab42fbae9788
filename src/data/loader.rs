// ============================================================
// Layer 4 — TSV Sentence Loader
// ============================================================
// Loads an SST-2 style split: a tab-separated file whose first
// row names the columns. Only the `sentence` and `label`
// columns are used; any other columns are ignored, and they may
// appear in any order.
//
//   sentence<TAB>label
//   hide new secretions from the parental units<TAB>0
//   contains no wit , only labored gags<TAB>0
//
// Blank lines are skipped. A row with too few fields or a label
// that is not a class index is an error naming the file and the
// line, so a broken download fails loudly instead of training on
// garbage.

use anyhow::{anyhow, bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::sentence::LabelledSentence;
use crate::domain::traits::SentenceSource;

pub struct TsvLoader {
    path:        PathBuf,
    num_classes: usize,
}

impl TsvLoader {
    pub fn new(path: impl Into<PathBuf>, num_classes: usize) -> Self {
        Self { path: path.into(), num_classes }
    }
}

impl SentenceSource for TsvLoader {
    fn load_all(&self) -> Result<Vec<LabelledSentence>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read '{}'", self.path.display()))?;
        let rows = parse_tsv(&text, self.num_classes)
            .with_context(|| format!("Malformed TSV '{}'", self.path.display()))?;
        tracing::info!("Loaded {} sentences from '{}'", rows.len(), self.path.display());
        Ok(rows)
    }
}

/// Parse TSV text with a header row into labelled sentences.
pub fn parse_tsv(text: &str, num_classes: usize) -> Result<Vec<LabelledSentence>> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| anyhow!("file is empty"))?;
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let sentence_col = column_index(&columns, "sentence")?;
    let label_col    = column_index(&columns, "label")?;
    let needed       = sentence_col.max(label_col) + 1;

    let mut rows = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < needed {
            bail!("line {line_no}: expected at least {needed} fields, found {}", fields.len());
        }

        let label: usize = fields[label_col]
            .trim()
            .parse()
            .with_context(|| format!("line {line_no}: label '{}' is not an integer", fields[label_col]))?;
        if label >= num_classes {
            bail!("line {line_no}: label {label} out of range for {num_classes} classes");
        }

        rows.push(LabelledSentence::new(fields[sentence_col].trim(), label));
    }
    Ok(rows)
}

fn column_index(columns: &[&str], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| *c == name)
        .ok_or_else(|| anyhow!("header has no '{name}' column (found: {})", columns.join(", ")))
}

/// Convenience for the common `<dir>/train.tsv` + `<dir>/dev.tsv` layout.
pub fn split_paths(data_dir: &Path) -> (PathBuf, PathBuf) {
    (data_dir.join("train.tsv"), data_dir.join("dev.tsv"))
}
