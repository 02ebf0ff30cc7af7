// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal
// (training, or classifying an uploaded image).
//
// Rules for this layer:
//   - No tensor or model code here (that's Layer 5)
//   - No printing or HTTP here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow and its configuration
pub mod train_use_case;

// Image upload → digit workflow
pub mod predict_use_case;
