// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per exercise. Each one wires the data, ml and
// infra layers together for a single run and hands a report
// back to the CLI:
//
//   sentiment_use_case.rs — SST-2 → vocabulary → BiLSTM →
//                           best checkpoint → confusion matrix
//   chirp_use_case.rs     — synthetic chirp → GRU forecaster
//   mnist_use_case.rs     — MNIST → MLP → confusion matrix
//
// Rules for this layer:
//   - No model code here (that's Layer 5)
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

/// BiLSTM sentiment workflow
pub mod sentiment_use_case;

/// GRU chirp forecasting workflow
pub mod chirp_use_case;

/// MNIST classifier workflow
pub mod mnist_use_case;
