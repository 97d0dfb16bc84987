//! `RentalService` gRPC implementation.
//!
//! Read-side projection of the accrual formula. The handler recomputes the
//! accrual from stored state on every call, so it is safe to poll for a
//! live countdown.

use tonic::{Request, Response, Status};
use tracing::instrument;

use hashlease_core::accrual::accrued;
use hashlease_core::db::unix_timestamp;
use hashlease_proto::v1::rental_service_server::RentalService;
use hashlease_proto::v1::{GetRentalStatusRequest, GetRentalStatusResponse};

use crate::storage::{DatabaseError, RentalDatabase};

/// gRPC service for reading rental accrual state.
pub struct RentalServiceImpl {
    db: RentalDatabase,
}

impl RentalServiceImpl {
    /// Create a new `RentalServiceImpl`.
    pub const fn new(db: RentalDatabase) -> Self {
        Self { db }
    }
}

fn map_db_error(e: DatabaseError) -> Status {
    match e {
        DatabaseError::NotFound(msg) => Status::not_found(msg),
        other => Status::internal(other.to_string()),
    }
}

#[tonic::async_trait]
impl RentalService for RentalServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "GetRentalStatus"))]
    async fn get_rental_status(
        &self,
        request: Request<GetRentalStatusRequest>,
    ) -> Result<Response<GetRentalStatusResponse>, Status> {
        let req = request.into_inner();

        if req.rental_id.is_empty() {
            return Err(Status::invalid_argument("rental_id is required"));
        }

        let rental = self
            .db
            .get_rental(&req.rental_id)
            .await
            .map_err(map_db_error)?;
        let device = self
            .db
            .get_device(&rental.device_id)
            .await
            .map_err(map_db_error)?;

        let now = unix_timestamp();
        let total_promised = device.reward_terms().total_promised();
        let accrual = accrued(now, rental.started_at, rental.expires_at, total_promised);

        Ok(Response::new(GetRentalStatusResponse {
            rental_id: rental.id,
            device_name: device.name,
            progress_percent: accrual.progress_percent(),
            accrued_reward: accrual.amount,
            total_promised,
            seconds_remaining: rental.expires_at.map_or(0, |expires| (expires - now).max(0)),
            expires_at: rental.expires_at,
        }))
    }
}
