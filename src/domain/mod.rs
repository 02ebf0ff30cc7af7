// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, the source trait and the error enum.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Raw digit samples and the train/test split
pub mod digit;

// The error taxonomy of the engine
pub mod error;

// The dataset source abstraction
pub mod traits;
