// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the exercises, with no Burn
// types and no file I/O:
//
//   sentence.rs — a labelled sentence read from a TSV split
//   vocab.rs    — token → id mapping, padding and unknown ids,
//                 fixed-length sequence encoding
//   best.rs     — the "strictly better validation accuracy"
//                 checkpoint rule
//   traits.rs   — abstractions the data layer implements
//
// Everything here is unit-testable without a GPU.

pub mod sentence;

pub mod vocab;

pub mod best;

pub mod traits;
