// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to one business
// layer.
//
//   metrics.rs — Training metrics logging
//                Writes epoch-level loss and accuracy to a
//                CSV file for later analysis and plotting.
//
// Reference: Rust Book §7 (Modules)

/// Training metrics CSV logger
pub mod metrics;
