// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the benchmark
// works with: pre-tokenised comments, language selections, and
// the abstractions the other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits

// One pre-tokenised comment with its label / identifier
pub mod example;

// Which validation languages an evaluation covers
pub mod language;

// Core abstractions (traits) that other layers implement
pub mod traits;
