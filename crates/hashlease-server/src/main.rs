//! `HashLease` Server
//!
//! gRPC service that stores rentals and runs the expiry sweep, both on a
//! timer and on demand via the authenticated `SweepService` trigger.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tonic::transport::Server;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hashlease_proto::v1::rental_service_server::RentalServiceServer;
use hashlease_proto::v1::sweep_service_server::SweepServiceServer;

use hashlease_core::db::unix_timestamp;
use hashlease_server::server::{
    secret_interceptor, RentalServiceImpl, SweepSecret, SweepServiceImpl,
};
use hashlease_server::storage::RentalDatabase;
use hashlease_server::sweep::SweepJob;

#[derive(Parser, Debug)]
#[command(name = "hashlease-server")]
#[command(version, about = "HashLease server - rental store and expiry sweep")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:50061")]
    addr: SocketAddr,

    /// Path to SQLite database file.
    #[arg(long, env = "HASHLEASE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Shared secret the trigger and CLI must present as a bearer token.
    #[arg(
        long,
        env = "HASHLEASE_SWEEP_SECRET",
        default_value = "dev-secret-change-me"
    )]
    sweep_secret: String,

    /// Seconds between scheduled sweep passes.
    #[arg(long, default_value_t = 3600)]
    sweep_interval_secs: u64,

    /// Days ahead of expiry at which the warning notification is sent.
    #[arg(long, default_value_t = 7)]
    warning_lead_days: i64,

    /// Maximum concurrent per-rental sweep units.
    #[arg(long, default_value_t = 5)]
    max_concurrency: usize,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "hashlease_server=info".into()),
    );
    if args.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting hashlease-server"
    );

    let db = match &args.db_path {
        Some(path) => {
            info!(path = %path.display(), "Opening rental database");
            RentalDatabase::open(path).await?
        }
        None => {
            let default_path = default_db_path()?;
            info!(path = %default_path.display(), "Opening rental database (default path)");
            RentalDatabase::open(&default_path).await?
        }
    };

    let job = Arc::new(SweepJob::new(
        db.clone(),
        args.warning_lead_days,
        args.max_concurrency,
    ));
    let secret = Arc::new(SweepSecret::new(&args.sweep_secret));

    let sweep_svc = SweepServiceImpl::new(Arc::clone(&job));
    let rental_svc = RentalServiceImpl::new(db.clone());
    let secret_check = secret_interceptor(secret);

    // Spawn the scheduled sweep (skip the first immediate tick). A failed
    // pass is retried on the next tick; the trigger RPC remains available
    // in between.
    let scheduled_job = Arc::clone(&job);
    let interval_secs = args.sweep_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.tick().await;
        loop {
            interval.tick().await;
            match scheduled_job.run(unix_timestamp()).await {
                Ok(summary) => info!(
                    expiring_notified = summary.expiring_notified,
                    expired_removed = summary.expired_removed,
                    "Scheduled sweep completed"
                ),
                Err(e) => warn!(error = %e, "Scheduled sweep failed"),
            }
        }
    });

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<SweepServiceServer<SweepServiceImpl>>()
        .await;
    health_reporter
        .set_serving::<RentalServiceServer<RentalServiceImpl>>()
        .await;

    let grpc_router = Server::builder()
        .add_service(health_service)
        .add_service(SweepServiceServer::with_interceptor(
            sweep_svc,
            secret_check.clone(),
        ))
        .add_service(RentalServiceServer::with_interceptor(
            rental_svc,
            secret_check,
        ));

    info!(addr = %args.addr, "gRPC server ready");

    tokio::select! {
        result = grpc_router.serve(args.addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Default database path: ~/.hashlease/rentals.db
fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".hashlease").join("rentals.db"))
}
