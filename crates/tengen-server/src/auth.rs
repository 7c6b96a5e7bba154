//! The identity seam: how the external auth layer hands users to the
//! engine.
//!
//! Tengen does not implement login, password storage, or cookies itself —
//! that all lives in a separate service. What this engine requires is
//! that SOMETHING resolves a connection's opaque credentials into a
//! stable user ID and display name *before* the connection is admitted.
//! The [`IdentityProvider`] trait is that something: the gateway captures
//! the `Cookie` header during the WebSocket upgrade and hands it over,
//! verbatim. A rejection closes the connection without the engine ever
//! seeing it.
//!
//! Once a connection is admitted, its identity is fixed: nothing in any
//! later message payload can change who the server believes is talking.

use std::future::Future;

use tengen_protocol::{Identity, UserId};

/// Errors from identity resolution.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The credentials were missing, malformed, or not recognized.
    #[error("identity rejected: {0}")]
    Rejected(String),
}

/// Resolves connection credentials into an [`Identity`].
///
/// `Send + Sync + 'static` because the provider is shared across all
/// connection handler tasks for the lifetime of the server.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Validates the opaque credential string captured during the
    /// connection upgrade and returns who this connection belongs to.
    ///
    /// # Errors
    /// [`IdentityError::Rejected`] refuses the connection; it is closed
    /// before reaching the engine.
    fn identify(
        &self,
        credentials: &str,
    ) -> impl Future<Output = Result<Identity, IdentityError>> + Send;
}

/// A development provider that trusts a `user=<id>; name=<name>` cookie.
///
/// There is no verification of any kind here — anyone can claim any
/// identity. Useful for local runs and for the integration tests; never
/// deploy it.
pub struct DevIdentity;

impl IdentityProvider for DevIdentity {
    async fn identify(&self, credentials: &str) -> Result<Identity, IdentityError> {
        let mut user_id = None;
        let mut display_name = None;

        for part in credentials.split(';') {
            let part = part.trim();
            if let Some(value) = part.strip_prefix("user=") {
                user_id = value.parse().ok().map(UserId);
            } else if let Some(value) = part.strip_prefix("name=") {
                display_name = Some(value.to_string());
            }
        }

        match (user_id, display_name) {
            (Some(user_id), Some(display_name)) => Ok(Identity {
                user_id,
                display_name,
            }),
            _ => Err(IdentityError::Rejected(
                "credentials must carry user=<id> and name=<name>".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dev_identity_parses_cookie_pair() {
        let identity = DevIdentity
            .identify("user=7; name=alice")
            .await
            .expect("should resolve");

        assert_eq!(identity.user_id, UserId(7));
        assert_eq!(identity.display_name, "alice");
    }

    #[tokio::test]
    async fn test_dev_identity_tolerates_extra_cookies() {
        let identity = DevIdentity
            .identify("theme=dark; user=3; name=bob; lang=de")
            .await
            .expect("should resolve");

        assert_eq!(identity.user_id, UserId(3));
        assert_eq!(identity.display_name, "bob");
    }

    #[tokio::test]
    async fn test_dev_identity_rejects_missing_fields() {
        assert!(DevIdentity.identify("user=3").await.is_err());
        assert!(DevIdentity.identify("name=carol").await.is_err());
        assert!(DevIdentity.identify("").await.is_err());
    }

    #[tokio::test]
    async fn test_dev_identity_rejects_non_numeric_user() {
        assert!(DevIdentity.identify("user=alice; name=alice").await.is_err());
    }
}
