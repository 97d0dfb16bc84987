//! `SweepService` gRPC implementation.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{instrument, warn};

use hashlease_core::db::unix_timestamp;
use hashlease_proto::v1::sweep_service_server::SweepService;
use hashlease_proto::v1::{RunSweepRequest, RunSweepResponse};

use crate::sweep::SweepJob;

/// gRPC trigger for the expiry sweep.
pub struct SweepServiceImpl {
    job: Arc<SweepJob>,
}

impl SweepServiceImpl {
    /// Create a new `SweepServiceImpl`.
    pub const fn new(job: Arc<SweepJob>) -> Self {
        Self { job }
    }
}

#[tonic::async_trait]
impl SweepService for SweepServiceImpl {
    #[instrument(skip(self, _request), fields(rpc = "RunSweep"))]
    async fn run_sweep(
        &self,
        _request: Request<RunSweepRequest>,
    ) -> Result<Response<RunSweepResponse>, Status> {
        let now = unix_timestamp();

        match self.job.run(now).await {
            Ok(summary) => Ok(Response::new(RunSweepResponse {
                success: summary.success,
                expiring_notified: summary.expiring_notified,
                expired_removed: summary.expired_removed,
                timestamp: summary.timestamp,
            })),
            Err(e) => {
                warn!(error = %e, "Sweep pass failed");
                Err(Status::internal(e.to_string()))
            }
        }
    }
}
