//! `HashLease` Server
//!
//! Stores rentals, users, devices, and notifications in `SQLite`, runs the
//! periodic expiry sweep, and serves the gRPC API consumed by the operator
//! CLI and the scheduler trigger.

pub mod server;
pub mod storage;
pub mod sweep;
