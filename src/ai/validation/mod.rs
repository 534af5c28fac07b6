//! AI Response Validation
//!
//! Turns near-JSON model output into strict JSON. Field-level validation is
//! left to the caller.

mod sanitizer;

pub use sanitizer::{normalize, sanitize, sanitize_into, strip_fences};
