//! Shared-secret validation interceptor for gRPC requests.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tonic::{Request, Status};

/// Pre-hashed shared secret for the trigger surface.
///
/// Only the SHA-256 digest of the configured secret is kept in memory;
/// presented tokens are digested and compared digest-to-digest.
#[derive(Clone)]
pub struct SweepSecret {
    digest: [u8; 32],
}

impl SweepSecret {
    /// Hash the configured secret.
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    /// Whether a presented token matches the configured secret.
    fn matches(&self, token: &str) -> bool {
        let presented: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        presented == self.digest
    }
}

/// Extract and validate the shared secret from the authorization metadata
/// header. Requests without a matching `Bearer` credential are rejected
/// before any work happens.
pub fn secret_interceptor(
    secret: Arc<SweepSecret>,
) -> impl Fn(Request<()>) -> Result<Request<()>, Status> + Clone {
    move |req: Request<()>| {
        let token = req
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| Status::unauthenticated("Missing authorization header"))?;

        if !secret.matches(token) {
            return Err(Status::unauthenticated("Invalid secret"));
        }

        Ok(req)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tonic::metadata::MetadataValue;

    fn test_secret() -> Arc<SweepSecret> {
        Arc::new(SweepSecret::new("test-secret"))
    }

    fn request_with_token(token: &str) -> Request<()> {
        let mut req = Request::new(());
        req.metadata_mut().insert(
            "authorization",
            MetadataValue::try_from(format!("Bearer {token}")).unwrap(),
        );
        req
    }

    #[test]
    fn valid_secret_passes() {
        let interceptor = secret_interceptor(test_secret());
        assert!(interceptor(request_with_token("test-secret")).is_ok());
    }

    #[test]
    fn missing_header_fails() {
        let interceptor = secret_interceptor(test_secret());
        let err = interceptor(Request::new(())).unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn wrong_secret_fails() {
        let interceptor = secret_interceptor(test_secret());
        let err = interceptor(request_with_token("not-the-secret")).unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn non_bearer_scheme_fails() {
        let interceptor = secret_interceptor(test_secret());
        let mut req = Request::new(());
        req.metadata_mut().insert(
            "authorization",
            MetadataValue::try_from("Basic test-secret").unwrap(),
        );
        let err = interceptor(req).unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }
}
