//! gRPC connection helpers.

use std::time::Duration;

use anyhow::{Context, Result};
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::Request;

/// Connect to the server at the given address.
pub async fn connect(addr: &str) -> Result<Channel> {
    let endpoint = Endpoint::from_shared(addr.to_string())
        .with_context(|| format!("Invalid server address: {addr}"))?
        .connect_timeout(Duration::from_secs(5));

    endpoint
        .connect()
        .await
        .with_context(|| format!("Cannot connect to {addr}"))
}

/// Wrap a message in a request carrying the bearer secret.
pub fn authed<T>(message: T, secret: &str) -> Result<Request<T>> {
    let mut request = Request::new(message);
    let value = MetadataValue::try_from(format!("Bearer {secret}"))
        .context("Secret contains characters not valid in a header")?;
    request.metadata_mut().insert("authorization", value);
    Ok(request)
}
