//! Common test utilities for wrfcf.
//!
//! Synthetic WRF datasets and floating-point assertions shared by the
//! integration tests.

pub mod assertions;
pub mod test_data;
