//! `hashlease sweep` - trigger one expiry sweep pass.

use anyhow::Result;

use hashlease_proto::v1::sweep_service_client::SweepServiceClient;
use hashlease_proto::v1::RunSweepRequest;

use crate::client;

/// Execute the `sweep` subcommand: run one pass and print the summary as
/// JSON on stdout, one object per invocation (cron-friendly).
#[allow(clippy::print_stdout)]
pub async fn run(addr: &str, secret: &str) -> Result<()> {
    let channel = client::connect(addr).await?;
    let mut grpc = SweepServiceClient::new(channel);

    let resp = grpc
        .run_sweep(client::authed(RunSweepRequest {}, secret)?)
        .await?
        .into_inner();

    let summary = serde_json::json!({
        "success": resp.success,
        "expiringNotified": resp.expiring_notified,
        "expiredRemoved": resp.expired_removed,
        "timestamp": resp.timestamp.to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
