//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, EntityId, kinds, and Error.

mod errors;
mod kinds;
mod values;
