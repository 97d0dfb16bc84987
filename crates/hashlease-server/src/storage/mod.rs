//! `SQLite` storage for the `HashLease` server.
//!
//! Provides persistence for users, devices, rentals, and notifications.

mod db;
mod models;
mod queries;
mod queries_notifications;


pub use db::{DatabaseError, RentalDatabase};
pub use models::*;
