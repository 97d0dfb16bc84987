//! `hashlease status` - read a rental's accrual projection.

use anyhow::Result;

use hashlease_proto::v1::rental_service_client::RentalServiceClient;
use hashlease_proto::v1::GetRentalStatusRequest;

use crate::client;

/// Execute the `status` subcommand.
#[allow(clippy::print_stdout)]
pub async fn run(addr: &str, secret: &str, rental_id: &str) -> Result<()> {
    let channel = client::connect(addr).await?;
    let mut grpc = RentalServiceClient::new(channel);

    let status = grpc
        .get_rental_status(client::authed(
            GetRentalStatusRequest {
                rental_id: rental_id.to_string(),
            },
            secret,
        )?)
        .await?
        .into_inner();

    println!("Rental {}", status.rental_id);
    println!("  Device:    {}", status.device_name);
    println!("  Progress:  {:.1}%", status.progress_percent);
    println!(
        "  Accrued:   {:.2} of {:.2}",
        status.accrued_reward, status.total_promised
    );
    match status.expires_at {
        Some(expires) => {
            println!("  Remaining: {}", format_duration(status.seconds_remaining));
            println!("  Expires:   {expires} (unix seconds)");
        }
        None => println!("  Expires:   never"),
    }

    Ok(())
}

/// Render a second count as a compact "2d 3h 4m 5s" string.
fn format_duration(total_secs: i64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
