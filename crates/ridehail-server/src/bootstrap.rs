//! Session bootstrap: credential verification and admission.
//!
//! Credential issuance and token formats are external concerns - this module
//! only consumes a [`CredentialVerifier`], resolves the verified id to a
//! principal, and refuses blocked accounts. A connection that fails here is
//! never admitted to the registry; there is no partial join.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use ridehail_core::{IntentError, PrincipalStore};
use ridehail_proto::{Principal, PrincipalId};

/// Why a credential failed verification.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The token is unknown, expired, or malformed.
    #[error("invalid credential")]
    Invalid,
    /// The verifying collaborator could not be reached.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// External credential-verification collaborator.
#[async_trait]
pub trait CredentialVerifier: Clone + Send + Sync + 'static {
    /// Resolve a presented token to the principal it was issued for.
    async fn verify(&self, token: &str) -> Result<PrincipalId, CredentialError>;
}

/// Static token → principal table.
///
/// Backs tests and the seeded dev deployment; a production deployment
/// implements [`CredentialVerifier`] over its identity provider instead.
#[derive(Clone, Default)]
pub struct TokenTable {
    tokens: Arc<RwLock<HashMap<String, PrincipalId>>>,
}

impl TokenTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a principal.
    #[allow(clippy::expect_used)]
    pub fn issue(&self, token: impl Into<String>, principal_id: PrincipalId) {
        self.tokens.write().expect("token table poisoned").insert(token.into(), principal_id);
    }
}

#[async_trait]
impl CredentialVerifier for TokenTable {
    #[allow(clippy::expect_used)]
    async fn verify(&self, token: &str) -> Result<PrincipalId, CredentialError> {
        self.tokens
            .read()
            .expect("token table poisoned")
            .get(token)
            .copied()
            .ok_or(CredentialError::Invalid)
    }
}

/// Authenticates inbound connections before admission.
#[derive(Clone, Debug)]
pub struct SessionBootstrap<V, P> {
    verifier: V,
    principals: P,
}

impl<V, P> SessionBootstrap<V, P>
where
    V: CredentialVerifier,
    P: PrincipalStore,
{
    /// Build a bootstrap over the verifier and principal store.
    pub fn new(verifier: V, principals: P) -> Self {
        Self { verifier, principals }
    }

    /// Verify a token and resolve the authenticated principal.
    ///
    /// Unknown tokens, unknown principals, and blocked principals all
    /// surface as [`IntentError::Unauthorized`]; the caller must refuse the
    /// connection.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, IntentError> {
        let principal_id = self.verifier.verify(token).await.map_err(|err| {
            tracing::debug!(%err, "credential verification failed");
            IntentError::Unauthorized(err.to_string())
        })?;

        let principal = self
            .principals
            .find(principal_id)
            .await?
            .ok_or_else(|| IntentError::Unauthorized("unknown principal".to_string()))?;

        if principal.is_blocked {
            tracing::warn!(principal = %principal.id, "blocked principal refused admission");
            return Err(IntentError::Unauthorized("account blocked".to_string()));
        }

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use ridehail_core::MemoryPrincipals;
    use ridehail_proto::Role;

    use super::*;

    fn principal(id: u64, blocked: bool) -> Principal {
        Principal {
            id: PrincipalId(id),
            name: "Riley".to_string(),
            email: "riley@example.com".to_string(),
            phone: String::new(),
            role: Role::Rider,
            is_online: false,
            is_approved: false,
            is_blocked: blocked,
            vehicle: None,
        }
    }

    async fn bootstrap_with(
        principals: Vec<Principal>,
    ) -> (SessionBootstrap<TokenTable, MemoryPrincipals>, TokenTable) {
        let store = MemoryPrincipals::new();
        for p in principals {
            store.insert(p).await.unwrap();
        }
        let tokens = TokenTable::new();
        (SessionBootstrap::new(tokens.clone(), store), tokens)
    }

    #[tokio::test]
    async fn valid_token_resolves_principal() {
        let (bootstrap, tokens) = bootstrap_with(vec![principal(1, false)]).await;
        tokens.issue("tok-1", PrincipalId(1));

        let resolved = bootstrap.authenticate("tok-1").await.unwrap();
        assert_eq!(resolved.id, PrincipalId(1));
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let (bootstrap, _tokens) = bootstrap_with(vec![principal(1, false)]).await;

        let err = bootstrap.authenticate("nope").await.unwrap_err();
        assert!(matches!(err, IntentError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn token_for_missing_principal_is_unauthorized() {
        let (bootstrap, tokens) = bootstrap_with(vec![]).await;
        tokens.issue("orphan", PrincipalId(9));

        let err = bootstrap.authenticate("orphan").await.unwrap_err();
        assert!(matches!(err, IntentError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn blocked_principal_is_refused() {
        let (bootstrap, tokens) = bootstrap_with(vec![principal(2, true)]).await;
        tokens.issue("tok-2", PrincipalId(2));

        let err = bootstrap.authenticate("tok-2").await.unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
    }
}
