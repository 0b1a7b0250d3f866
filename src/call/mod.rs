//! Call graph node model.
//!
//! This module handles:
//! - The `Call` value type and its identity key
//! - Input/output function classification
//! - Function vs. file granularity

#[allow(clippy::module_inception)]
pub mod call;
pub mod io_functions;

// Re-export main types
pub use call::{Call, CallKey, Granularity};
pub use io_functions::{is_input_function, is_output_function, INPUT_FUNCTIONS, OUTPUT_FUNCTIONS};
