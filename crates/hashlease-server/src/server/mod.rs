//! gRPC services for the `HashLease` server.

mod interceptor;
mod rental_svc;
mod sweep_svc;

pub use interceptor::{secret_interceptor, SweepSecret};
pub use rental_svc::RentalServiceImpl;
pub use sweep_svc::SweepServiceImpl;
