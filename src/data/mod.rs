// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the processed CSV files on disk and the
// tensor batches the model consumes:
//
//   processed CSV
//       │
//       ▼
//   CsvExampleSource  → reads rows, parses the integer-list cells
//       │
//       ▼
//   ToxicDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ToxicBatcher      → stacks examples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds shuffled batches to the training loop

/// Parses and renders the "(1, 2, 3)" integer-list cells
pub mod sequence;

/// Loads the processed CSV files with the `csv` crate
pub mod csv_source;

/// Implements Burn's Dataset trait for encoded comments
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
