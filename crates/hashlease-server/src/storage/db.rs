//! Database connection and initialization.

pub use hashlease_core::db::DatabaseError;

hashlease_core::define_database!(RentalDatabase, "Rental database migrations complete");
