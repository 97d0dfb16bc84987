//! HashLease Protocol Buffers
//!
//! Generated protobuf code for the HashLease gRPC API.
//!
//! This crate contains:
//! - `SweepService` for triggering expiry sweep passes
//! - `RentalService` for reading rental accrual state

#![allow(clippy::derive_partial_eq_without_eq)]

/// HashLease v1 API definitions.
///
/// All generated types and services are included here.
pub mod v1 {
    tonic::include_proto!("hashlease.v1");
}

// Re-export v1 as the default API version for convenience
pub use v1::*;
