// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between files on disk and tensor batches.
//
// Sentiment:
//
//   train.tsv / dev.tsv
//       │
//       ▼
//   TsvLoader        → labelled sentences
//       │
//       ▼
//   WordTokenizer    → word tokens
//       │
//       ▼
//   Vocabulary       → fixed-length id sequences (domain layer)
//       │
//       ▼
//   SentimentDataset → Burn Dataset
//       │
//       ▼
//   SentimentBatcher → token ids + padding mask tensors
//
//   glove.6B.50d.txt → embeddings.rs → initial embedding table
//
// Chirp:   chirp.rs synthesises the signal, splitter.rs cuts it
//          in time order, ChirpDataset pairs consecutive windows.
//
// MNIST:   Burn's MnistDataset + MnistBatcher.

/// Reads SST-2 style TSV splits
pub mod loader;

/// Treebank-style word tokenizer
pub mod preprocessor;

/// GloVe vectors and the initial embedding table
pub mod embeddings;

/// Linear chirp synthesis and windowing
pub mod chirp;

/// Burn Dataset implementations
pub mod dataset;

/// Burn Batcher implementations
pub mod batcher;

/// Order-preserving fractional split
pub mod splitter;
